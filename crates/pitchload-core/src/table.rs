//! Wide tables: one row per subject, one column per field.
//!
//! Source extracts are held as text. A cell is either present (`Some`) or
//! absent (`None`); absence is decided once, when the cell is read, by
//! [`parse_cell`].

use serde::Serialize;

// ─── Cells ───────────────────────────────────────────────────────────────────

/// Spellings that mark a cell as missing in the source extracts.
const NA_MARKERS: &[&str] = &[
  "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
  "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Turn raw cell text into a cell value, mapping blanks and NA markers to
/// `None`. The text itself is kept verbatim.
pub fn parse_cell(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
    None
  } else {
    Some(raw.to_owned())
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A wide table read from a source extract.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WideTable {
  name:    String,
  columns: Vec<String>,
  rows:    Vec<Vec<Option<String>>>,
}

impl WideTable {
  /// Create an empty table. Header names are trimmed here so every column
  /// lookup sees the same names.
  pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
    let columns = columns.iter().map(|c| c.trim().to_owned()).collect();
    Self { name: name.into(), columns, rows: Vec::new() }
  }

  /// Append a row. Short rows are padded with absent cells and long rows are
  /// cut to the header width.
  pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
    cells.resize(self.columns.len(), None);
    self.rows.push(cells);
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Position of the first column called `column`.
  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  pub fn has_column(&self, column: &str) -> bool {
    self.column_index(column).is_some()
  }

  pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
    self.rows.iter().map(move |cells| Row { table: self, cells })
  }

  /// Rewrite every cell of the column at `index` in place.
  pub fn map_column<F>(&mut self, index: usize, mut f: F)
  where
    F: FnMut(String) -> Option<String>,
  {
    for row in &mut self.rows {
      if let Some(cell) = row.get_mut(index) {
        *cell = cell.take().and_then(&mut f);
      }
    }
  }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
  table: &'a WideTable,
  cells: &'a [Option<String>],
}

impl<'a> Row<'a> {
  /// Cell value by column name; `None` when the column is absent or the
  /// cell is missing.
  pub fn get(&self, column: &str) -> Option<&'a str> {
    self.table.column_index(column).and_then(|i| self.cell(i))
  }

  /// Cell value by column position.
  pub fn cell(&self, index: usize) -> Option<&'a str> {
    self.cells.get(index).and_then(Option::as_deref)
  }
}
