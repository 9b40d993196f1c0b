//! Column schema of the two source extracts.
//!
//! Each extract has a fixed set of metadata columns (identifiers, names,
//! qualifiers, statuses, positions). Every other column is a metric. The
//! identity columns an extract needs for its facts are declared per
//! [`TableKind`] and checked against the real header before any write.

use serde::Serialize;

use crate::{Error, Result, table::WideTable};

pub const EVENT_ID: &str = "event_id";
pub const TEAM_ID: &str = "team_id";
pub const PLAYER_ID: &str = "player_id";
pub const LEAGUE_ID: &str = "league_id";
pub const SEASON_ID: &str = "season_id";
pub const SEASON_NAME: &str = "season_name";
pub const TEAM_NAME: &str = "team_name";
pub const PLAYER_NAME: &str = "player_name";
pub const TEAM_QUALIFIER: &str = "team_qualifier";

/// Columns that never carry a metric.
pub const METADATA_COLUMNS: &[&str] = &[
  EVENT_ID,
  TEAM_ID,
  PLAYER_ID,
  TEAM_NAME,
  PLAYER_NAME,
  TEAM_QUALIFIER,
  "event_status",
  "match_status",
  LEAGUE_ID,
  SEASON_ID,
  SEASON_NAME,
  "starter",
  "position",
];

/// Columns used as join and lookup keys; whitespace is trimmed from these.
pub const IDENTIFIER_COLUMNS: &[&str] =
  &[EVENT_ID, TEAM_ID, LEAGUE_ID, SEASON_ID, PLAYER_ID];

pub fn is_metadata(column: &str) -> bool { METADATA_COLUMNS.contains(&column) }

/// Which extract a table came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TableKind {
  Team,
  Player,
}

impl TableKind {
  /// Identity columns this extract must carry.
  pub fn required_columns(self) -> &'static [&'static str] {
    match self {
      TableKind::Team => &[EVENT_ID, TEAM_ID],
      TableKind::Player => &[EVENT_ID, PLAYER_ID, TEAM_ID],
    }
  }

  /// Check `table` against this extract's declared identity columns.
  ///
  /// A table with no header at all is an empty extract and always passes.
  pub fn validate(self, table: &WideTable) -> Result<()> {
    if table.columns().is_empty() {
      return Ok(());
    }
    match self
      .required_columns()
      .iter()
      .find(|c| !table.has_column(c))
    {
      Some(column) => Err(Error::MissingColumn { table: self, column: *column }),
      None => Ok(()),
    }
  }
}
