//! 📥 Extract: bytes in, `Table` out.
//!
//! 🎬 EXT. BUCKET, DAWN. An object named `raw/input.csv` waits on the dock.
//! We pull it aboard whole (no streaming, no chunking, the whole thing fits in RAM
//! or the run dies trying), decode it as UTF-8, and hand it to the `csv` crate.
//!
//! 🧠 Knowledge graph:
//! - `decode`: UTF-8 or bust (`EtlError::Decoding`). A leading BOM is dropped.
//! - `parse_csv`: first record = header, the rest = rows.
//!   - blank header names → `Unnamed: <index>`, duplicates → `name.1`, `name.2`, ...
//!   - blank lines are skipped
//!   - too many fields → `EtlError::Parse` with the line number
//!   - too few fields → padded with nulls
//!   - `NULL_MARKERS` become `Cell::Null`
//!   - types are inferred per column: Bool, then Int, then Float, then Text
//! - `extract`: `get_object` + `decode` + `parse_csv`, nothing more.
//!
//! 🦆 The duck tried to sneak a semicolon-delimited file aboard. The parser said no.

use tracing::debug;

use crate::backends::ObjectStore;
use crate::error::EtlError;
use crate::table::{Cell, Column, Table};

/// 🕳️ Field values that mean "nothing here". Matched exactly, case included.
pub const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// 🚀 Fetch one object and turn it into a table.
pub async fn extract<S>(store: &S, bucket: &str, key: &str) -> Result<Table, EtlError>
where
    S: ObjectStore + ?Sized,
{
    let the_bytes = store.get_object(bucket, key).await?;
    debug!(
        "📥 pulled {} bytes out of s3://{}/{}",
        the_bytes.len(),
        bucket,
        key
    );
    let the_text = decode(the_bytes)?;
    parse_csv(&the_text)
}

/// 🔤 UTF-8 decode. Invalid sequences are fatal; a BOM is quietly thrown overboard.
pub fn decode(bytes: Vec<u8>) -> Result<String, EtlError> {
    let mut text = String::from_utf8(bytes)?;
    if text.starts_with(BYTE_ORDER_MARK) {
        text.drain(..BYTE_ORDER_MARK.len_utf8());
    }
    Ok(text)
}

/// 📜 Parse CSV text with a header row into a typed `Table`.
pub fn parse_csv(text: &str) -> Result<Table, EtlError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EtlError::Parse(e.to_string()))?
        .clone();
    if headers.is_empty() {
        return Err(EtlError::Parse(
            "no columns to parse from the source object".to_string(),
        ));
    }

    let names = column_names(&headers);
    let width = names.len();
    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];

    for (record_number, result) in reader.records().enumerate() {
        let record = result.map_err(|e| EtlError::Parse(e.to_string()))?;

        // -- 🧹 a lone empty field is what a blank line looks like from in here
        if record.len() == 1 && record.get(0) == Some("") {
            continue;
        }

        if record.len() > width {
            // -- 📍 header is line 1, so the n-th record is at least line n + 2
            let line = record
                .position()
                .map_or(record_number as u64 + 2, |p| p.line());
            return Err(EtlError::Parse(format!(
                "expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }

        for (index, column) in raw_columns.iter_mut().enumerate() {
            column.push(record.get(index).and_then(present_value));
        }
    }

    let columns = names
        .into_iter()
        .zip(raw_columns)
        .map(|(name, values)| Column::new(name, infer_cells(values)))
        .collect();
    Table::new(columns)
}

fn present_value(field: &str) -> Option<String> {
    if NULL_MARKERS.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}

fn column_names(headers: &csv::StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (index, raw) in headers.iter().enumerate() {
        let base = if raw.is_empty() {
            format!("Unnamed: {index}")
        } else {
            raw.to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 1;
        while names.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}

// 🔎 One type per column, decided by looking at every non-null value.
fn infer_cells(values: Vec<Option<String>>) -> Vec<Cell> {
    let present = || values.iter().flatten();

    if present().next().is_none() {
        return values.iter().map(|_| Cell::Null).collect();
    }

    if present().all(|v| parse_bool(v).is_some()) {
        return convert(values, |v| parse_bool(&v).map(Cell::Bool));
    }
    if present().all(|v| v.parse::<i64>().is_ok()) {
        return convert(values, |v| v.parse::<i64>().ok().map(Cell::Int));
    }
    if present().all(|v| v.parse::<f64>().is_ok()) {
        return convert(values, |v| {
            v.parse::<f64>()
                .ok()
                .filter(|f| !f.is_nan())
                .map(Cell::Float)
        });
    }
    convert(values, |v| Some(Cell::Text(v)))
}

fn convert(values: Vec<Option<String>>, to_cell: impl Fn(String) -> Option<Cell>) -> Vec<Cell> {
    values
        .into_iter()
        .map(|v| v.and_then(&to_cell).unwrap_or(Cell::Null))
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryObjectStore;

    fn parse(text: &str) -> Table {
        parse_csv(text).expect("💀 this CSV was hand-crafted with love and should parse")
    }

    fn cells(table: &Table, name: &str) -> Vec<Cell> {
        table
            .column(name)
            .map(|c| c.cells.clone())
            .unwrap_or_else(|| panic!("💀 column '{name}' went overboard"))
    }

    #[test]
    fn the_one_where_the_classic_scenario_parses() {
        let the_table = parse("id,name\n1,alice\n,bob\n3,carol");

        assert_eq!(the_table.column_names(), vec!["id", "name"]);
        assert_eq!(the_table.row_count(), 3);
        assert_eq!(
            cells(&the_table, "id"),
            vec![Cell::Int(1), Cell::Null, Cell::Int(3)]
        );
        assert_eq!(
            cells(&the_table, "name"),
            vec![
                Cell::Text("alice".to_string()),
                Cell::Text("bob".to_string()),
                Cell::Text("carol".to_string())
            ]
        );
    }

    #[test]
    fn the_one_where_every_column_gets_its_own_type() {
        let the_table = parse(
            "flag,count,ratio,label,mixed\n\
             true,1,1.5,x,1\n\
             False,2,2,y,two\n",
        );

        assert_eq!(
            cells(&the_table, "flag"),
            vec![Cell::Bool(true), Cell::Bool(false)]
        );
        assert_eq!(cells(&the_table, "count"), vec![Cell::Int(1), Cell::Int(2)]);
        assert_eq!(
            cells(&the_table, "ratio"),
            vec![Cell::Float(1.5), Cell::Float(2.0)]
        );
        assert_eq!(
            cells(&the_table, "mixed"),
            vec![Cell::Text("1".to_string()), Cell::Text("two".to_string())]
        );
    }

    #[test]
    fn the_one_where_null_markers_are_all_treated_as_nothing() {
        let the_table = parse("id,note\nNA,a\nnull,b\nN/A,c\n7,NaN\n");

        assert_eq!(
            cells(&the_table, "id"),
            vec![Cell::Null, Cell::Null, Cell::Null, Cell::Int(7)]
        );
        assert_eq!(cells(&the_table, "note")[3], Cell::Null);
    }

    #[test]
    fn the_one_where_an_all_null_column_stays_null() {
        let the_table = parse("a,b\n1,\n2,\n");

        assert_eq!(cells(&the_table, "b"), vec![Cell::Null, Cell::Null]);
    }

    #[test]
    fn the_one_where_short_rows_get_padded_and_blank_lines_vanish() {
        let the_table = parse("a,b,c\n1,2\n\n4,5,6\n");

        assert_eq!(the_table.row_count(), 2);
        assert_eq!(cells(&the_table, "c"), vec![Cell::Null, Cell::Int(6)]);
    }

    #[test]
    fn the_one_where_a_row_with_too_many_fields_sinks_the_parse() {
        let the_error = parse_csv("id,name\n1,alice\n2,bob,extra\n")
            .expect_err("💀 three fields under a two-column header is a mutiny");

        assert!(matches!(the_error, EtlError::Parse(_)));
        assert!(the_error.to_string().contains("expected 2 fields in line 3, saw 3"));
    }

    #[test]
    fn the_one_where_empty_input_has_no_columns_to_give() {
        let the_error = parse_csv("").expect_err("💀 nothing in, nothing parsed");

        assert!(the_error.to_string().contains("no columns to parse"));
    }

    #[test]
    fn the_one_where_headers_get_names_and_twins_get_numbered() {
        let the_table = parse("a,,a,a\n1,2,3,4\n");

        assert_eq!(
            the_table.column_names(),
            vec!["a", "Unnamed: 1", "a.1", "a.2"]
        );
    }

    #[test]
    fn the_one_where_quoted_commas_stay_inside_their_field() {
        let the_table = parse("id,quote\n1,\"hello, world\"\n2,\"she said \"\"hi\"\"\"\n");

        assert_eq!(
            cells(&the_table, "quote"),
            vec![
                Cell::Text("hello, world".to_string()),
                Cell::Text("she said \"hi\"".to_string())
            ]
        );
    }

    #[test]
    fn the_one_where_decode_drops_the_bom_and_rejects_garbage() {
        let the_text = decode("\u{feff}id\n1\n".as_bytes().to_vec())
            .expect("💀 a BOM is not a crime");
        assert_eq!(the_text, "id\n1\n");

        let the_error = decode(vec![b'i', b'd', b'\n', 0xc3, 0x28])
            .expect_err("💀 0xc3 0x28 is not UTF-8 and never will be");
        assert!(matches!(the_error, EtlError::Decoding(_)));
    }

    #[tokio::test]
    async fn the_one_where_extract_goes_all_the_way_from_bucket_to_table() {
        let the_store = InMemoryObjectStore::new();
        the_store
            .insert("dock", "raw/input.csv", b"id,name\n1,alice\n".to_vec())
            .await;

        let the_table = extract(&the_store, "dock", "raw/input.csv")
            .await
            .expect("💀 the object is right there in the HashMap");

        assert_eq!(the_table.row_count(), 1);
        assert_eq!(the_table.column_names(), vec!["id", "name"]);
    }

    #[tokio::test]
    async fn the_one_where_extract_finds_an_empty_dock() {
        let the_store = InMemoryObjectStore::new();

        let the_error = extract(&the_store, "dock", "raw/input.csv")
            .await
            .expect_err("💀 there is no object, so there can be no table");

        assert!(matches!(the_error, EtlError::ObjectNotFound { .. }));
    }
}
