//! CSV extracts.

use std::{fs::File, io::Read, path::Path};

use pitchload_core::{
  normalize::normalize_identifiers,
  schema::TableKind,
  table::{WideTable, parse_cell},
};

use crate::{Error, Result};

/// The team-level and player-level extracts of one load.
#[derive(Debug, Clone, Default)]
pub struct Extracts {
  pub team:   WideTable,
  pub player: WideTable,
}

impl Extracts {
  /// Read both extracts from disk.
  pub fn read(team_csv: &Path, player_csv: &Path) -> Result<Self> {
    Ok(Self {
      team:   read_table(TableKind::Team, team_csv)?,
      player: read_table(TableKind::Player, player_csv)?,
    })
  }

  /// Check both headers against their declared identity columns, then trim
  /// identifier columns so keys compare exactly.
  pub fn prepare(&mut self) -> Result<()> {
    TableKind::Team.validate(&self.team)?;
    TableKind::Player.validate(&self.player)?;
    normalize_identifiers(&mut self.team);
    normalize_identifiers(&mut self.player);
    Ok(())
  }
}

pub fn read_table(kind: TableKind, path: &Path) -> Result<WideTable> {
  let csv_err = |source| Error::Csv { path: path.to_path_buf(), source };
  let file = File::open(path).map_err(|e| csv_err(csv::Error::from(e)))?;
  let table = parse_table(kind, file).map_err(csv_err)?;
  tracing::info!(
    table = %kind,
    path = %path.display(),
    rows = table.len(),
    columns = table.columns().len(),
    "extract read"
  );
  Ok(table)
}

/// Parse a CSV stream with a header row into a [`WideTable`].
///
/// An input with no header at all yields an empty table.
pub fn parse_table<R: Read>(kind: TableKind, rdr: R) -> csv::Result<WideTable> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(rdr);

  let columns = reader.headers()?.iter().map(str::to_owned).collect();
  let mut table = WideTable::new(kind.as_ref(), columns);

  for record in reader.records() {
    let record = record?;
    table.push_row(record.iter().map(parse_cell).collect());
  }
  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_header_and_cells() {
    let csv = "event_id,team_id,goals,formation\n 1 ,A,2,\n1,B,NaN,4-4-2\n";
    let t = parse_table(TableKind::Team, csv.as_bytes()).unwrap();

    assert_eq!(t.name(), "team");
    assert_eq!(t.columns(), ["event_id", "team_id", "goals", "formation"]);
    let rows: Vec<_> = t.rows().collect();
    assert_eq!(rows[0].get("event_id"), Some(" 1 "));
    assert_eq!(rows[0].get("formation"), None);
    assert_eq!(rows[1].get("goals"), None);
    assert_eq!(rows[1].get("formation"), Some("4-4-2"));
  }

  #[test]
  fn header_names_are_trimmed() {
    let t = parse_table(TableKind::Team, "event_id, team_id , goals\n1,A,2\n".as_bytes()).unwrap();
    assert_eq!(t.columns(), ["event_id", "team_id", "goals"]);
    assert_eq!(t.rows().next().unwrap().get("team_id"), Some("A"));
  }

  #[test]
  fn empty_input_is_an_empty_table() {
    let t = parse_table(TableKind::Player, "".as_bytes()).unwrap();
    assert!(t.columns().is_empty());
    assert!(t.is_empty());
  }

  #[test]
  fn prepare_trims_identifiers() {
    let mut extracts = Extracts {
      team:   parse_table(TableKind::Team, "event_id,team_id\n 1 , A\n".as_bytes())
        .unwrap(),
      player: WideTable::default(),
    };
    extracts.prepare().unwrap();

    let row = extracts.team.rows().next().unwrap();
    assert_eq!(row.get("event_id"), Some("1"));
    assert_eq!(row.get("team_id"), Some("A"));
  }

  #[test]
  fn prepare_rejects_missing_identity_column() {
    let mut extracts = Extracts {
      team:   parse_table(TableKind::Team, "event_id,goals\n1,2\n".as_bytes()).unwrap(),
      player: WideTable::default(),
    };
    assert!(matches!(extracts.prepare(), Err(Error::Schema(_))));
  }

  #[test]
  fn missing_file_reports_its_path() {
    let err = read_table(TableKind::Team, Path::new("/nonexistent/team.csv")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/team.csv"));
  }
}
