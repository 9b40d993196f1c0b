//! Error types for `pitchload-core`.

use thiserror::Error;

use crate::schema::TableKind;

#[derive(Debug, Error)]
pub enum Error {
  /// A source extract lacks one of its declared identity columns.
  #[error("{table} extract is missing required column {column:?}")]
  MissingColumn {
    table:  TableKind,
    column: &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
