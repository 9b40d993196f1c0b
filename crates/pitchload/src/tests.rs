//! End-to-end pipeline tests against a file-backed `SqliteStore`.
//!
//! Stored rows are read back through a separate `rusqlite` connection on the
//! same file.

use std::{future::ready, path::PathBuf, time::Duration};

use pitchload_core::{
  model::{Match, PlayerStatFact, TableCounts, TeamStatFact},
  schema::TableKind,
  store::StatStore,
};
use pitchload_store_sqlite::SqliteStore;
use tempfile::TempDir;

use crate::{
  Error, LoadOutcome, Pipeline,
  loader::FactMode,
  pipeline::LoadOptions,
  probe::{ProbeOutcome, ProbePolicy, wait_for_store},
  source::{Extracts, parse_table},
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const TWO_TEAMS: &str = "\
event_id,team_id,team_qualifier,league_id,season_id,goals
1,A,home,L1,S1,2
1,B,away,L1,S1,1
";

const TEAM_CSV: &str = "\
event_id,team_id,team_name,team_qualifier,league_id,season_id,season_name,goals,assists,formation
1,A,Alpha,home,L1,S1,2023/24,2,1,4-3-3
1,B,Beta,away,L1,S1,2023/24,1,,4-4-2
2,A,Alpha,,L1,S1,2023/24,0,0,
";

const PLAYER_CSV: &str = "\
event_id,player_id,player_name,team_id,team_name,position,goals,passes
1,p1,Ann,A,Alpha,FW,2,30
1,p2,Bea,C,Gamma,MF,,12
9,p3,Cat,A,Alpha,DF,1,5
";

fn extracts(team: &str, player: &str) -> Extracts {
  Extracts {
    team:   parse_table(TableKind::Team, team.as_bytes()).unwrap(),
    player: parse_table(TableKind::Player, player.as_bytes()).unwrap(),
  }
}

fn pipeline(fact_mode: FactMode) -> Pipeline {
  Pipeline::new(LoadOptions {
    probe: ProbePolicy { attempts: 3, interval: Duration::ZERO },
    batch_size: 2,
    fact_mode,
    ..LoadOptions::default()
  })
}

/// A store in a temporary directory, removed on drop.
struct Db {
  _dir:  TempDir,
  path:  PathBuf,
  store: SqliteStore,
}

impl Db {
  async fn new() -> Self {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stats.sqlite");
    let store = SqliteStore::open(&path).await.expect("file-backed store");
    Self { _dir: dir, path, store }
  }

  fn query<T, P, F>(&self, sql: &str, params: P, f: F) -> Vec<T>
  where
    P: rusqlite::Params,
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
  {
    let conn = rusqlite::Connection::open(&self.path).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    let rows = stmt
      .query_map(params, f)
      .unwrap()
      .collect::<rusqlite::Result<Vec<T>>>()
      .unwrap();
    rows
  }

  fn get_match(&self, event_id: &str) -> Option<Match> {
    self
      .query(
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
      .pop()
  }

  fn team_facts(&self) -> Vec<TeamStatFact> {
    self.query(
      "SELECT event_id, team_id, statistic_id, value FROM team_statistics
       ORDER BY event_id, team_id, statistic_id",
      rusqlite::params![],
      |row| {
        Ok(TeamStatFact {
          event_id:     row.get(0)?,
          team_id:      row.get(1)?,
          statistic_id: row.get(2)?,
          value:        row.get(3)?,
        })
      },
    )
  }

  fn player_facts(&self) -> Vec<PlayerStatFact> {
    self.query(
      "SELECT event_id, player_id, team_id, statistic_id, value FROM player_statistics
       ORDER BY event_id, player_id, statistic_id",
      rusqlite::params![],
      |row| {
        Ok(PlayerStatFact {
          event_id:     row.get(0)?,
          player_id:    row.get(1)?,
          team_id:      row.get(2)?,
          statistic_id: row.get(3)?,
          value:        row.get(4)?,
        })
      },
    )
  }
}

async fn slug_id(s: &SqliteStore, slug: &str) -> i64 {
  s.list_metrics()
    .await
    .unwrap()
    .into_iter()
    .find(|m| m.slug == slug)
    .map(|m| m.statistic_id)
    .expect("metric registered")
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_team_rows_load_end_to_end() {
  let db = Db::new().await;
  let s = &db.store;
  let report = pipeline(FactMode::Ignore)
    .load(s, extracts(TWO_TEAMS, ""))
    .await
    .unwrap();

  assert_eq!(report.totals, TableCounts {
    leagues:      1,
    seasons:      1,
    teams:        2,
    players:      0,
    matches:      1,
    metrics:      1,
    team_facts:   2,
    player_facts: 0,
  });

  let m = db.get_match("1").expect("match registered");
  assert_eq!(m.home_team_id.as_deref(), Some("A"));
  assert_eq!(m.away_team_id.as_deref(), Some("B"));

  let metrics = s.list_metrics().await.unwrap();
  assert_eq!(metrics.len(), 1);
  assert_eq!(metrics[0].slug, "goals");
  assert_eq!(metrics[0].display_name, "Goals");
}

#[tokio::test]
async fn full_extracts_load() {
  let db = Db::new().await;
  let s = &db.store;
  let report = pipeline(FactMode::Ignore)
    .load(s, extracts(TEAM_CSV, PLAYER_CSV))
    .await
    .unwrap();

  // Team C appears only in the player extract.
  assert_eq!(report.totals.teams, 3);
  assert_eq!(report.totals.players, 3);
  assert_eq!(report.totals.matches, 2);
  assert_eq!(report.catalog.observed, 4);

  assert_eq!(report.team_facts.written, 5);
  assert_eq!(report.team_facts.transform.non_numeric, 2);
  assert_eq!(report.player_facts.written, 3);
  assert_eq!(report.player_facts.transform.unknown_event, 2);

  let goals = slug_id(s, "goals").await;
  let facts = db.team_facts();
  let alpha_goals: Vec<_> = facts
    .iter()
    .filter(|f| f.team_id == "A" && f.statistic_id == goals)
    .map(|f| (f.event_id.as_str(), f.value))
    .collect();
  assert_eq!(alpha_goals, [("1", 2.0), ("2", 0.0)]);

  let player_facts = db.player_facts();
  assert!(player_facts.iter().all(|f| f.event_id == "1"));
  let bea = player_facts
    .iter()
    .find(|f| f.player_id == "p2")
    .expect("p2 passes");
  assert_eq!(bea.team_id.as_deref(), Some("C"));
  assert_eq!(bea.value, 12.0);
}

#[tokio::test]
async fn event_without_qualifiers_gets_null_sides() {
  let db = Db::new().await;
  let s = &db.store;
  pipeline(FactMode::Ignore)
    .load(s, extracts(TEAM_CSV, ""))
    .await
    .unwrap();

  let m = db.get_match("2").expect("match 2 registered");
  assert_eq!(m.home_team_id, None);
  assert_eq!(m.away_team_id, None);
  assert_eq!(m.season_id, "S1");
  assert_eq!(m.status, "closed");
}

#[tokio::test]
async fn event_without_season_uses_sentinel() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id,team_id,team_qualifier,goals\n5,A,home,1\n";
  pipeline(FactMode::Ignore)
    .load(s, extracts(team, ""))
    .await
    .unwrap();

  let m = db.get_match("5").unwrap();
  assert_eq!(m.season_id, "N/A");
  assert_eq!(s.counts().await.unwrap().team_facts, 1);
}

#[tokio::test]
async fn metric_universe_is_the_union_of_both_extracts() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id,team_id,goals,assists\n1,A,1,0\n";
  let player = "event_id,player_id,team_id,goals,passes\n1,p1,A,1,20\n";
  pipeline(FactMode::Ignore)
    .load(s, extracts(team, player))
    .await
    .unwrap();

  let slugs: Vec<_> = s
    .list_metrics()
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.slug)
    .collect();
  assert_eq!(slugs, ["assists", "goals", "passes"]);
}

#[tokio::test]
async fn identifiers_are_trimmed_before_joining() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id,team_id,team_qualifier,goals\n 1 ,A ,home,2\n";
  let player = "event_id,player_id,team_id,goals\n1, p1,A,1\n";
  let report = pipeline(FactMode::Ignore)
    .load(s, extracts(team, player))
    .await
    .unwrap();

  assert_eq!(report.totals.teams, 1);
  assert_eq!(report.player_facts.written, 1);
  let m = db.get_match("1").unwrap();
  assert_eq!(m.home_team_id.as_deref(), Some("A"));
}

#[tokio::test]
async fn padded_header_names_match_like_plain_ones() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id, team_id ,team_qualifier, goals \n1,A,home,2\n";
  let report = pipeline(FactMode::Ignore)
    .load(s, extracts(team, ""))
    .await
    .unwrap();

  assert_eq!(report.team_facts.written, 1);
  assert_eq!(db.get_match("1").unwrap().home_team_id.as_deref(), Some("A"));
  let slugs: Vec<_> = s
    .list_metrics()
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.slug)
    .collect();
  assert_eq!(slugs, ["goals"]);
}

#[tokio::test]
async fn duplicate_rows_keep_the_first_value() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id,team_id,team_qualifier,goals\n1,A,home,2\n1,A,home,5\n";
  let report = pipeline(FactMode::Fail)
    .load(s, extracts(team, ""))
    .await
    .unwrap();

  assert_eq!(report.team_facts.transform.duplicate, 1);
  let facts = db.team_facts();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].value, 2.0);
}

#[tokio::test]
async fn missing_identity_column_aborts_before_writing() {
  let db = Db::new().await;
  let s = &db.store;
  let team = "event_id,league_id,goals\n1,L1,2\n";
  let err = pipeline(FactMode::Ignore)
    .load(s, extracts(team, ""))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Schema(_)));
  assert_eq!(s.counts().await.unwrap(), TableCounts::default());
}

#[tokio::test]
async fn catalog_accumulates_across_loads() {
  let db = Db::new().await;
  let s = &db.store;
  let p = pipeline(FactMode::Ignore);
  p.load(s, extracts(TWO_TEAMS, "")).await.unwrap();

  let later = "event_id,team_id,team_qualifier,passes\n1,A,home,410\n";
  let report = p.load(s, extracts(later, "")).await.unwrap();

  assert_eq!(report.catalog.inserted, 1);
  assert_eq!(report.catalog.catalog_size, 2);
  assert_eq!(report.team_facts.written, 1);
  assert_eq!(report.totals.team_facts, 3);
  assert!(slug_id(s, "goals").await < slug_id(s, "passes").await);
}

#[tokio::test]
async fn report_renders_as_parseable_json() {
  let db = Db::new().await;
  let report = pipeline(FactMode::Ignore)
    .load(&db.store, extracts(TWO_TEAMS, ""))
    .await
    .unwrap();

  let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
  assert_eq!(json["fact_mode"], "ignore");
  assert_eq!(json["totals"]["team_facts"], 2);
  assert_eq!(json["team_facts"]["written"], 2);
  assert_eq!(json["catalog"]["observed"], 1);

  let summary = report.summary();
  assert_eq!(summary.lines().count(), 8);
  assert!(summary.starts_with("leagues:"));
  assert!(summary.contains("team_statistics:   2 (+2 this run)"));
}

// ─── Re-runs ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rerun_in_ignore_mode_is_idempotent() {
  let db = Db::new().await;
  let s = &db.store;
  let p = pipeline(FactMode::Ignore);

  let first = p.load(s, extracts(TEAM_CSV, PLAYER_CSV)).await.unwrap();
  let second = p.load(s, extracts(TEAM_CSV, PLAYER_CSV)).await.unwrap();

  assert_eq!(first.totals, second.totals);
  assert_eq!(second.master.leagues.inserted, 0);
  assert_eq!(second.master.seasons.inserted, 0);
  assert_eq!(second.master.teams.inserted, 0);
  assert_eq!(second.master.players.inserted, 0);
  assert_eq!(second.master.matches.inserted, 0);
  assert_eq!(second.master.matches.derived, 2);
  assert_eq!(second.catalog.inserted, 0);
  assert_eq!(second.team_facts.written, 0);
  assert_eq!(second.player_facts.written, 0);
}

#[tokio::test]
async fn rerun_in_fail_mode_aborts_on_duplicate_facts() {
  let db = Db::new().await;
  let s = &db.store;
  let p = pipeline(FactMode::Fail);

  let first = p.load(s, extracts(TEAM_CSV, PLAYER_CSV)).await.unwrap();
  let err = p
    .load(s, extracts(TEAM_CSV, PLAYER_CSV))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Store(_)));
  assert_eq!(s.counts().await.unwrap(), first.totals);
}

#[tokio::test]
async fn rerun_in_truncate_mode_replaces_facts() {
  let db = Db::new().await;
  let s = &db.store;
  let p = pipeline(FactMode::Truncate);

  let first = p.load(s, extracts(TEAM_CSV, PLAYER_CSV)).await.unwrap();
  let second = p.load(s, extracts(TEAM_CSV, PLAYER_CSV)).await.unwrap();

  assert_eq!(first.totals, second.totals);
  assert_eq!(second.team_facts.written, 5);
  assert_eq!(second.player_facts.written, 3);
}

// ─── Readiness ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_store_stops_before_reading() {
  let mut read_called = false;
  let outcome = pipeline(FactMode::Ignore)
    .run(
      || SqliteStore::open("/nonexistent-dir/pitchload/stats.sqlite"),
      || {
        read_called = true;
        Ok(Extracts::default())
      },
    )
    .await
    .unwrap();

  assert!(matches!(outcome, LoadOutcome::StoreUnavailable { attempts: 3 }));
  assert!(!read_called);
}

#[tokio::test]
async fn run_retries_until_the_store_answers() {
  let db = Db::new().await;
  let s = &db.store;
  let mut calls = 0;
  let outcome = pipeline(FactMode::Ignore)
    .run(
      || {
        calls += 1;
        ready(if calls < 3 { Err("still starting") } else { Ok(s.clone()) })
      },
      || Ok(extracts(TWO_TEAMS, "")),
    )
    .await
    .unwrap();

  let LoadOutcome::Loaded(report) = outcome else {
    panic!("expected a completed load");
  };
  assert_eq!(calls, 3);
  assert_eq!(report.totals.team_facts, 2);
  assert_eq!(s.counts().await.unwrap().matches, 1);
}

#[tokio::test]
async fn zero_attempt_budget_still_tries_once() {
  let mut calls = 0;
  let outcome = wait_for_store(
    ProbePolicy { attempts: 0, interval: Duration::ZERO },
    || {
      calls += 1;
      ready(Err::<SqliteStore, _>("down"))
    },
  )
  .await;

  assert!(matches!(outcome, ProbeOutcome::Unavailable { attempts: 1 }));
  assert_eq!(calls, 1);
}

#[tokio::test]
async fn exhausted_budget_calls_the_connector_once_per_attempt() {
  let mut calls = 0;
  let outcome = wait_for_store(
    ProbePolicy { attempts: 4, interval: Duration::ZERO },
    || {
      calls += 1;
      ready(Err::<SqliteStore, _>("connection refused"))
    },
  )
  .await;

  assert!(matches!(outcome, ProbeOutcome::Unavailable { attempts: 4 }));
  assert_eq!(calls, 4);
}
