//! Identifier normalisation.

use crate::{schema::IDENTIFIER_COLUMNS, table::WideTable};

/// Trim leading and trailing whitespace from every identifier column present
/// in `table`. Identifiers that trim to nothing become absent. Columns the
/// table does not have are skipped.
pub fn normalize_identifiers(table: &mut WideTable) {
  for column in IDENTIFIER_COLUMNS {
    if let Some(index) = table.column_index(column) {
      table.map_column(index, |value| {
        let trimmed = value.trim();
        match trimmed.len() {
          0 => None,
          n if n == value.len() => Some(value),
          _ => Some(trimmed.to_owned()),
        }
      });
    }
  }
}
