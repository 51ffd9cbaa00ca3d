//! 📤 Load: `Table` in, CSV bytes out, object overwritten.
//!
//! 🚰 Header first, rows after, `\n` between them and one at the end. Quotes only where a
//! field actually needs them. Then the whole thing goes up in a single `put_object`.
//! No temp key, no rename, no atomicity: if the PUT dies halfway, the destination is
//! whatever the store says it is.
//!
//! 🧠 Knowledge graph:
//! - Cell text comes from `Cell::to_field` (nulls are empty, floats share `format_float`).
//! - `to_csv` is pure so round-trip and idempotence tests don't need a store.

use tracing::debug;

use crate::backends::ObjectStore;
use crate::error::EtlError;
use crate::table::Table;

/// 🚀 Serialize the table and write it to `bucket`/`key`. Returns the bytes written.
pub async fn load<S>(store: &S, bucket: &str, key: &str, table: &Table) -> Result<usize, EtlError>
where
    S: ObjectStore + ?Sized,
{
    let the_payload = to_csv(table)?;
    let the_size = the_payload.len();
    debug!(
        "📤 shipping {} bytes ({} rows) to s3://{}/{}",
        the_size,
        table.row_count(),
        bucket,
        key
    );
    store.put_object(bucket, key, the_payload).await?;
    Ok(the_size)
}

/// 📜 Render the table as UTF-8 CSV bytes, header included.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, EtlError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(serialization_failed)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_field()))
            .map_err(serialization_failed)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::Serialization(e.to_string()))
}

fn serialization_failed(err: csv::Error) -> EtlError {
    EtlError::Serialization(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::InMemoryObjectStore;
    use crate::extract::parse_csv;
    use crate::table::{Cell, Column};

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("💀 we only ever write UTF-8")
    }

    #[test]
    fn the_one_where_every_cell_type_lands_in_the_csv() {
        let the_table = Table::new(vec![
            Column::new("id", vec![Cell::Int(1), Cell::Int(2)]),
            Column::new("ok", vec![Cell::Bool(true), Cell::Bool(false)]),
            Column::new("ratio", vec![Cell::Float(0.5), Cell::Float(3.0)]),
            Column::new("note", vec![Cell::Null, Cell::Text("hi".to_string())]),
        ])
        .expect("💀 table assembly");

        let the_csv = as_text(to_csv(&the_table).expect("💀 serialization"));

        assert_eq!(the_csv, "id,ok,ratio,note\n1,True,0.5,\n2,False,3.0,hi\n");
    }

    #[test]
    fn the_one_where_fields_get_quoted_only_when_they_must() {
        let the_table = Table::new(vec![
            Column::new("id", vec![Cell::Int(1)]),
            Column::new(
                "quote",
                vec![Cell::Text("she said \"hi, there\"".to_string())],
            ),
        ])
        .expect("💀 table assembly");

        let the_csv = as_text(to_csv(&the_table).expect("💀 serialization"));

        assert_eq!(the_csv, "id,quote\n1,\"she said \"\"hi, there\"\"\"\n");
    }

    #[test]
    fn the_one_where_the_csv_survives_a_round_trip() {
        let the_original = parse_csv("id,name,score\n1,alice,2.5\n2,\"b,ob\",\n3,carol,4\n")
            .expect("💀 the original should parse");

        let the_bytes = to_csv(&the_original).expect("💀 serialization");
        let the_reparsed = parse_csv(&as_text(the_bytes)).expect("💀 our own output should parse");

        assert_eq!(the_reparsed.row_count(), the_original.row_count());
        assert_eq!(the_reparsed.column_names(), the_original.column_names());
        assert_eq!(the_reparsed, the_original);
    }

    #[test]
    fn the_one_where_an_empty_table_still_has_a_header() {
        let the_table = Table::new(vec![
            Column::new("id", vec![]),
            Column::new("row_length", vec![]),
        ])
        .expect("💀 table assembly");

        let the_csv = as_text(to_csv(&the_table).expect("💀 serialization"));

        assert_eq!(the_csv, "id,row_length\n");
    }

    #[tokio::test]
    async fn the_one_where_load_overwrites_the_destination() {
        let the_store = InMemoryObjectStore::new();
        the_store
            .insert("dock", "processed/output.csv", b"stale".to_vec())
            .await;
        let the_table = Table::new(vec![Column::new("id", vec![Cell::Int(1)])])
            .expect("💀 table assembly");

        let the_size = load(&the_store, "dock", "processed/output.csv", &the_table)
            .await
            .expect("💀 in-memory load should not fail");

        assert_eq!(the_size, "id\n1\n".len());
        assert_eq!(
            the_store.object("dock", "processed/output.csv").await,
            Some(b"id\n1\n".to_vec())
        );
    }
}
