//! [`SqliteStore`], the SQLite implementation of [`StatStore`].

use std::{collections::HashSet, path::Path};

#[cfg(test)]
use rusqlite::OptionalExtension as _;

use pitchload_core::{
  model::{
    League, Match, Metric, NewMetric, Player, PlayerStatFact, Season,
    TableCounts, Team, TeamStatFact,
  },
  store::{OnConflict, StatStore},
};

use crate::{Error, Result, schema::SCHEMA};

// ─── Statements ──────────────────────────────────────────────────────────────

const INSERT_LEAGUE: &str =
  "INSERT INTO leagues (league_id, name, country) VALUES (?1, ?2, ?3)
   ON CONFLICT DO NOTHING";

const INSERT_SEASON: &str =
  "INSERT INTO seasons (season_id, name, league_id) VALUES (?1, ?2, ?3)
   ON CONFLICT DO NOTHING";

const INSERT_TEAM: &str =
  "INSERT INTO teams (team_id, name) VALUES (?1, ?2) ON CONFLICT DO NOTHING";

const INSERT_PLAYER: &str =
  "INSERT INTO players (player_id, name) VALUES (?1, ?2) ON CONFLICT DO NOTHING";

const INSERT_MATCH: &str =
  "INSERT INTO matches (event_id, season_id, home_team_id, away_team_id, status)
   VALUES (?1, ?2, ?3, ?4, ?5)
   ON CONFLICT DO NOTHING";

const INSERT_METRIC: &str =
  "INSERT INTO statistics (slug, display_name) VALUES (?1, ?2)
   ON CONFLICT DO NOTHING";

const INSERT_TEAM_FACT: &str =
  "INSERT INTO team_statistics (event_id, team_id, statistic_id, value)
   VALUES (?1, ?2, ?3, ?4)";

const INSERT_PLAYER_FACT: &str =
  "INSERT INTO player_statistics (event_id, player_id, team_id, statistic_id, value)
   VALUES (?1, ?2, ?3, ?4, ?5)";

const CONFLICT_SKIP: &str = " ON CONFLICT DO NOTHING";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A statistics store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. The
/// connection thread shuts down once the last clone is dropped.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Execute `sql` once per row inside a single transaction and return the
  /// number of rows changed. Any failure rolls the whole call back.
  async fn insert_rows<T, F>(&self, sql: String, rows: Vec<T>, bind: F) -> Result<usize>
  where
    T: Send + 'static,
    F: Fn(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize> + Send + 'static,
  {
    if rows.is_empty() {
      return Ok(0);
    }

    let submitted = rows.len();
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare(&sql)?;
          for row in &rows {
            changed += bind(&mut stmt, row)?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    tracing::debug!(submitted, changed, "batch committed");
    Ok(changed)
  }
}

fn fact_sql(base: &str, on_conflict: OnConflict) -> String {
  match on_conflict {
    OnConflict::Ignore => format!("{base}{CONFLICT_SKIP}"),
    OnConflict::Fail => base.to_owned(),
  }
}

fn to_count(value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::OutOfRange("count"))
}

// ─── StatStore impl ──────────────────────────────────────────────────────────

impl StatStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Master data ───────────────────────────────────────────────────────────

  async fn upsert_leagues(&self, leagues: &[League]) -> Result<usize> {
    self
      .insert_rows(INSERT_LEAGUE.to_owned(), leagues.to_vec(), |stmt, l: &League| {
        stmt.execute(rusqlite::params![l.league_id, l.name, l.country])
      })
      .await
  }

  async fn upsert_seasons(&self, seasons: &[Season]) -> Result<usize> {
    self
      .insert_rows(INSERT_SEASON.to_owned(), seasons.to_vec(), |stmt, s: &Season| {
        stmt.execute(rusqlite::params![s.season_id, s.name, s.league_id])
      })
      .await
  }

  async fn upsert_teams(&self, teams: &[Team]) -> Result<usize> {
    self
      .insert_rows(INSERT_TEAM.to_owned(), teams.to_vec(), |stmt, t: &Team| {
        stmt.execute(rusqlite::params![t.team_id, t.name])
      })
      .await
  }

  async fn upsert_players(&self, players: &[Player]) -> Result<usize> {
    self
      .insert_rows(INSERT_PLAYER.to_owned(), players.to_vec(), |stmt, p: &Player| {
        stmt.execute(rusqlite::params![p.player_id, p.name])
      })
      .await
  }

  async fn upsert_matches(&self, matches: &[Match]) -> Result<usize> {
    self
      .insert_rows(INSERT_MATCH.to_owned(), matches.to_vec(), |stmt, m: &Match| {
        stmt.execute(rusqlite::params![
          m.event_id,
          m.season_id,
          m.home_team_id,
          m.away_team_id,
          m.status,
        ])
      })
      .await
  }

  async fn event_ids(&self) -> Result<HashSet<String>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT event_id FROM matches")?;
        let ids = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  // ── Metric catalog ────────────────────────────────────────────────────────

  async fn upsert_metrics(&self, metrics: &[NewMetric]) -> Result<usize> {
    self
      .insert_rows(INSERT_METRIC.to_owned(), metrics.to_vec(), |stmt, m: &NewMetric| {
        stmt.execute(rusqlite::params![m.slug, m.display_name])
      })
      .await
  }

  async fn list_metrics(&self) -> Result<Vec<Metric>> {
    let metrics = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT statistic_id, slug, display_name FROM statistics ORDER BY statistic_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Metric {
              statistic_id: row.get(0)?,
              slug:         row.get(1)?,
              display_name: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(metrics)
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn insert_team_facts(
    &self,
    facts:       &[TeamStatFact],
    on_conflict: OnConflict,
  ) -> Result<usize> {
    self
      .insert_rows(
        fact_sql(INSERT_TEAM_FACT, on_conflict),
        facts.to_vec(),
        |stmt, f: &TeamStatFact| {
          stmt.execute(rusqlite::params![
            f.event_id,
            f.team_id,
            f.statistic_id,
            f.value,
          ])
        },
      )
      .await
  }

  async fn insert_player_facts(
    &self,
    facts:       &[PlayerStatFact],
    on_conflict: OnConflict,
  ) -> Result<usize> {
    self
      .insert_rows(
        fact_sql(INSERT_PLAYER_FACT, on_conflict),
        facts.to_vec(),
        |stmt, f: &PlayerStatFact| {
          stmt.execute(rusqlite::params![
            f.event_id,
            f.player_id,
            f.team_id,
            f.statistic_id,
            f.value,
          ])
        },
      )
      .await
  }

  async fn clear_facts(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM team_statistics;
           DELETE FROM player_statistics;",
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn counts(&self) -> Result<TableCounts> {
    let raw: [i64; 8] = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM leagues),
             (SELECT COUNT(*) FROM seasons),
             (SELECT COUNT(*) FROM teams),
             (SELECT COUNT(*) FROM players),
             (SELECT COUNT(*) FROM matches),
             (SELECT COUNT(*) FROM statistics),
             (SELECT COUNT(*) FROM team_statistics),
             (SELECT COUNT(*) FROM player_statistics)",
          [],
          |row| {
            Ok([
              row.get(0)?,
              row.get(1)?,
              row.get(2)?,
              row.get(3)?,
              row.get(4)?,
              row.get(5)?,
              row.get(6)?,
              row.get(7)?,
            ])
          },
        )?)
      })
      .await?;

    let [leagues, seasons, teams, players, matches, metrics, team_facts, player_facts] =
      raw;

    Ok(TableCounts {
      leagues:      to_count(leagues)?,
      seasons:      to_count(seasons)?,
      teams:        to_count(teams)?,
      players:      to_count(players)?,
      matches:      to_count(matches)?,
      metrics:      to_count(metrics)?,
      team_facts:   to_count(team_facts)?,
      player_facts: to_count(player_facts)?,
    })
  }
}

// ─── Read-back ───────────────────────────────────────────────────────────────

#[cfg(test)]
impl SqliteStore {
  /// Retrieve a match by event identifier.
  pub async fn get_match(&self, event_id: &str) -> Result<Option<Match>> {
    let event_id = event_id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT event_id, season_id, home_team_id, away_team_id, status
             FROM matches WHERE event_id = ?1",
            rusqlite::params![event_id],
            |row| {
              Ok(Match {
                event_id:     row.get(0)?,
                season_id:    row.get(1)?,
                home_team_id: row.get(2)?,
                away_team_id: row.get(3)?,
                status:       row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(found)
  }

  /// Every stored team fact, ordered by key.
  pub async fn team_facts(&self) -> Result<Vec<TeamStatFact>> {
    let facts = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, team_id, statistic_id, value
           FROM team_statistics
           ORDER BY event_id, team_id, statistic_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(TeamStatFact {
              event_id:     row.get(0)?,
              team_id:      row.get(1)?,
              statistic_id: row.get(2)?,
              value:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(facts)
  }

  /// Every stored player fact, ordered by key.
  pub async fn player_facts(&self) -> Result<Vec<PlayerStatFact>> {
    let facts = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, player_id, team_id, statistic_id, value
           FROM player_statistics
           ORDER BY event_id, player_id, statistic_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(PlayerStatFact {
              event_id:     row.get(0)?,
              player_id:    row.get(1)?,
              team_id:      row.get(2)?,
              statistic_id: row.get(3)?,
              value:        row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(facts)
  }
}
