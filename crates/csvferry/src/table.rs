//! 📊 Table: the in-memory spreadsheet that rides the ferry between extract and load.
//!
//! 🎬 COLD OPEN: INT. RAM, MOMENTS AFTER DOWNLOAD
//!
//! The CSV arrived as bytes. It became text. Now it becomes columns: named, ordered,
//! typed, and all exactly the same length (the table refuses to exist otherwise).
//!
//! 🧠 Knowledge graph:
//! - Column-oriented: `Table` → `Vec<Column>` → `Vec<Cell>`. Row `i` is the `i`-th cell of
//!   every column.
//! - `Cell` carries the inferred type. Inference itself lives in `extract`.
//! - Two renderings per cell:
//!   - `Cell::to_field`: what goes back into the CSV.
//!   - `Cell::repr`: the sequence-literal form used to measure `row_length`.
//! - Mutation (`retain_rows`, `set_column`) is crate-only. The transforms own it.
//!
//! 🦆 The duck sits in column zero. It is never null.

use std::fmt;

use comfy_table::{ContentArrangement, Table as ComfyTable, presets::NOTHING};

use crate::error::EtlError;

// ============================================================
//  🧱 Cell: one value, one type, zero ambiguity
// ============================================================

/// 🧱 A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// 🕳️ Missing. Written back to CSV as an empty field.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// 📤 The text written into the output CSV for this cell.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => format_float(*v),
            Cell::Text(s) => s.clone(),
        }
    }

    /// 📏 The element form inside a rendered row: `nan`, `True`, `42`, `2.5`, `'alice'`.
    pub fn repr(&self) -> String {
        match self {
            Cell::Null => "nan".to_string(),
            Cell::Text(s) => quote_text(s),
            other => other.to_field(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NaN"),
            other => f.write_str(&other.to_field()),
        }
    }
}

/// 🔢 Shortest round-trip float text: `2.5`, `3.0`, `1e+20`, `1.5e-07`, `inf`.
///
/// Rust's `{:?}` already picks the shortest digits, keeps the `.0` on whole numbers and
/// switches to exponent form outside `[1e-4, 1e16)`. We only reshape the exponent into
/// the signed, two-digit `e+XX` form.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let the_debug_form = format!("{value:?}");
    match the_debug_form.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => the_debug_form,
    }
}

// 🗨️ Quote like a sequence literal would: single quotes unless that would need escaping
// and double quotes wouldn't.
fn quote_text(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if is_unprintable(c) => out.push_str(&escape_code_point(c)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

// 🙈 Characters that get a numeric escape instead of showing up as themselves: controls,
// every whitespace except the plain space, invisible format characters and private use.
// Unassigned code points are printed as-is.
fn is_unprintable(c: char) -> bool {
    c.is_control()
        || (c.is_whitespace() && c != ' ')
        || matches!(
            c,
            '\u{ad}'
                | '\u{600}'..='\u{605}'
                | '\u{61c}'
                | '\u{6dd}'
                | '\u{70f}'
                | '\u{890}'..='\u{891}'
                | '\u{8e2}'
                | '\u{180e}'
                | '\u{200b}'..='\u{200f}'
                | '\u{202a}'..='\u{202e}'
                | '\u{2060}'..='\u{2064}'
                | '\u{2066}'..='\u{206f}'
                | '\u{feff}'
                | '\u{fff9}'..='\u{fffb}'
                | '\u{110bd}'
                | '\u{110cd}'
                | '\u{1bca0}'..='\u{1bca3}'
                | '\u{1d173}'..='\u{1d17a}'
                | '\u{e0001}'
                | '\u{e0020}'..='\u{e007f}'
                | '\u{e000}'..='\u{f8ff}'
                | '\u{f0000}'..='\u{ffffd}'
                | '\u{100000}'..='\u{10fffd}'
        )
}

// 🔢 `\xhh` below 0x100, `\uhhhh` in the BMP, `\Uhhhhhhhh` above it.
fn escape_code_point(c: char) -> String {
    let code = c as u32;
    if code < 0x100 {
        format!("\\x{code:02x}")
    } else if code < 0x10000 {
        format!("\\u{code:04x}")
    } else {
        format!("\\U{code:08x}")
    }
}

// ============================================================
//  📊 Column + Table
// ============================================================

/// 🏷️ A named column of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// 📊 Ordered named columns, all the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// 🚀 Assemble a table. 💀 Ragged columns are rejected, because a table with
    /// three rows in one column and two in another is a crime scene, not a table.
    pub fn new(columns: Vec<Column>) -> Result<Self, EtlError> {
        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(ragged) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(EtlError::Parse(format!(
                    "column '{}' has {} cells but column '{}' has {}",
                    ragged.name,
                    ragged.cells.len(),
                    first.name,
                    expected
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// 🚣 The cells of row `index`, in column order. Empty when out of range.
    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns
            .iter()
            .filter_map(|c| c.cells.get(index))
            .collect()
    }

    /// 🔄 Every row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count()).map(move |i| self.row(i))
    }

    /// ✂️ Keep row `i` iff `keep[i]`. Rows past the end of `keep` are dropped.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut verdicts = keep.iter().copied();
            column
                .cells
                .retain(|_| verdicts.next().unwrap_or(false));
        }
    }

    /// ➕ Replace the column called `name` in place, or append it at the end.
    ///
    /// ⚠️ `cells.len()` must equal `row_count()`. The transforms guarantee it.
    pub(crate) fn set_column(&mut self, name: &str, cells: Vec<Cell>) {
        debug_assert!(self.columns.is_empty() || cells.len() == self.row_count());
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.cells = cells,
            None => self.columns.push(Column::new(name, cells)),
        }
    }

    /// 🍽️ The first `limit` rows as a comfy table, for a quick look in the logs.
    pub fn preview(&self, limit: usize) -> ComfyTable {
        let mut the_comfy = ComfyTable::new();
        the_comfy
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(self.column_names());
        for row in self.rows().take(limit) {
            the_comfy.add_row(row.iter().map(|cell| cell.to_string()));
        }
        the_comfy
    }
}
