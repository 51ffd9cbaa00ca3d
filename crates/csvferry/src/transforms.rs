//! 🔄 Transforms: two small mutations and not a single opinion about the data.
//!
//! 🎬 COLD OPEN: INT. RAM, THE TABLE HAS JUST ARRIVED
//!
//! "What does the business want?" asked the new hire.
//! "Drop rows with an empty first column. Count the characters in each row."
//! "Why?"
//! (Narrator: Nobody knew. Nobody asked. The transforms shipped exactly as written.)
//!
//! ## The two steps, in order 📐
//!
//! ```text
//!   Table ──▶ drop_rows_missing_first_column ──▶ derive_row_length ──▶ Table + row_length
//!             (position 0, not a name)            (rendered row, char count)
//! ```
//!
//! ## Row rendering 📏
//!
//! A row is rendered as a sequence literal: `[` + each `Cell::repr` joined by `, ` + `]`.
//! `[1, 'alice']` is 12 characters, so `row_length` is 12. Characters are Unicode scalar
//! values, not bytes. Same table in, same numbers out, every run.
//!
//! ⚠️ If the table already has a `row_length` column, it gets overwritten in place, and
//! its old value is part of the row that gets measured. 🦆

use tracing::debug;

use crate::table::{Cell, Table};

/// 🏷️ The column the transform derives.
pub const ROW_LENGTH_COLUMN: &str = "row_length";

/// 📋 What the transform did, for the logs and the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub rows_out: usize,
}

/// 🚀 Filter, then derive. Returns the head count before and after.
pub fn apply(table: &mut Table) -> TransformReport {
    let rows_in = table.row_count();
    let rows_dropped = drop_rows_missing_first_column(table);
    derive_row_length(table);

    let the_report = TransformReport {
        rows_in,
        rows_dropped,
        rows_out: table.row_count(),
    };
    debug!("🔄 transform report: {:?}", the_report);
    the_report
}

/// ✂️ Keep only rows whose first column (by position) holds a value. Returns how many went overboard.
pub fn drop_rows_missing_first_column(table: &mut Table) -> usize {
    let Some(first) = table.columns().first() else {
        return 0;
    };
    let keep: Vec<bool> = first.cells.iter().map(|cell| !cell.is_null()).collect();
    let dropped = keep.iter().filter(|kept| !**kept).count();
    table.retain_rows(&keep);
    dropped
}

/// 📏 Measure every row and write the result into `row_length`.
pub fn derive_row_length(table: &mut Table) {
    let lengths: Vec<Cell> = table
        .rows()
        .map(|row| Cell::Int(row_length(&row)))
        .collect();
    table.set_column(ROW_LENGTH_COLUMN, lengths);
}

/// 🖨️ `[1, 'alice', nan, 2.5, True]`
pub fn render_row(row: &[&Cell]) -> String {
    let parts: Vec<String> = row.iter().map(|cell| cell.repr()).collect();
    format!("[{}]", parts.join(", "))
}

/// 📏 Character count of `render_row`.
pub fn row_length(row: &[&Cell]) -> i64 {
    render_row(row).chars().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn the_classic() -> Table {
        Table::new(vec![
            Column::new("id", vec![Cell::Int(1), Cell::Null, Cell::Int(3)]),
            Column::new("name", vec![text("alice"), text("bob"), text("carol")]),
        ])
        .expect("💀 the classic table should always assemble")
    }

    #[test]
    fn the_one_where_the_classic_scenario_loses_bob() {
        let mut the_table = the_classic();

        let the_report = apply(&mut the_table);

        assert_eq!(
            the_report,
            TransformReport {
                rows_in: 3,
                rows_dropped: 1,
                rows_out: 2
            }
        );
        assert_eq!(the_table.column_names(), vec!["id", "name", "row_length"]);
        assert_eq!(
            the_table.column(ROW_LENGTH_COLUMN).map(|c| c.cells.clone()),
            Some(vec![Cell::Int(12), Cell::Int(12)])
        );
        assert_eq!(the_table.row(1)[1], &text("carol"));
    }

    #[test]
    fn the_one_where_only_the_first_column_gets_a_vote() {
        let mut the_table = Table::new(vec![
            Column::new("key", vec![text("a"), text("b")]),
            Column::new("value", vec![Cell::Null, Cell::Null]),
        ])
        .expect("💀 table assembly");

        let the_dropped = drop_rows_missing_first_column(&mut the_table);

        assert_eq!(the_dropped, 0);
        assert_eq!(the_table.row_count(), 2);
    }

    #[test]
    fn the_one_where_the_first_column_is_found_by_position_not_by_name() {
        let mut the_table = Table::new(vec![
            Column::new("zzz", vec![Cell::Null, Cell::Int(2)]),
            Column::new("id", vec![Cell::Int(1), Cell::Null]),
        ])
        .expect("💀 table assembly");

        drop_rows_missing_first_column(&mut the_table);

        assert_eq!(the_table.row(0), vec![&Cell::Int(2), &Cell::Null]);
    }

    #[test]
    fn the_one_where_every_cell_type_shows_up_in_the_rendering() {
        let the_row = [
            &Cell::Int(7),
            &text("o'brien"),
            &Cell::Null,
            &Cell::Float(2.5),
            &Cell::Bool(true),
        ];

        assert_eq!(render_row(&the_row), "[7, \"o'brien\", nan, 2.5, True]");
        assert_eq!(row_length(&the_row), 30);
    }

    #[test]
    fn the_one_where_characters_are_counted_not_bytes() {
        let the_row = [&Cell::Int(1), &text("zoë")];

        // -- 🧮 [1, 'zoë'] = 10 chars, 11 bytes. we count chars.
        assert_eq!(row_length(&the_row), 10);
    }

    #[test]
    fn the_one_where_an_existing_row_length_gets_measured_then_replaced() {
        let mut the_table = Table::new(vec![
            Column::new("id", vec![Cell::Int(1)]),
            Column::new(ROW_LENGTH_COLUMN, vec![Cell::Int(999)]),
            Column::new("name", vec![text("a")]),
        ])
        .expect("💀 table assembly");

        derive_row_length(&mut the_table);

        // -- 📏 [1, 999, 'a'] = 13 chars, and the column keeps its seat in the middle
        assert_eq!(the_table.column_names(), vec!["id", ROW_LENGTH_COLUMN, "name"]);
        assert_eq!(the_table.row(0)[1], &Cell::Int(13));
    }

    #[test]
    fn the_one_where_the_same_table_always_measures_the_same() {
        let mut the_first = the_classic();
        let mut the_second = the_classic();

        apply(&mut the_first);
        apply(&mut the_second);

        assert_eq!(the_first, the_second);
    }

    #[test]
    fn the_one_where_an_all_null_first_column_empties_the_table() {
        let mut the_table = Table::new(vec![
            Column::new("id", vec![Cell::Null, Cell::Null]),
            Column::new("name", vec![text("x"), text("y")]),
        ])
        .expect("💀 table assembly");

        let the_report = apply(&mut the_table);

        assert_eq!(the_report.rows_out, 0);
        assert_eq!(the_table.column_names(), vec!["id", "name", "row_length"]);
    }
}
