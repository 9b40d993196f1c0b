//! The six-stage load.
//!
//! | Stage | Work |
//! |-------|------|
//! | 1 | Wait for the store (bounded retries) |
//! | 2 | Read both extracts, validate headers, trim identifiers |
//! | 3 | Upsert leagues, seasons, teams and players |
//! | 4 | Upsert matches |
//! | 5 | Register the metric catalog and read it back |
//! | 6 | Transform and load team and player facts |
//!
//! Each stage finishes before the next begins. Dimension groups commit
//! independently, in dependency order, so an abort between groups leaves no
//! dangling references.

use std::future::Future;

use chrono::{DateTime, Utc};
use pitchload_core::{
  catalog::{MetricCatalog, metric_columns, metric_universe, new_metrics},
  master::{LeagueProfile, MasterData},
  model::TableCounts,
  store::StatStore,
  transform::{self, TransformStats},
};
use serde::Serialize;

use crate::{
  Error, Result,
  loader::{FactLoader, FactMode},
  probe::{ProbeOutcome, ProbePolicy, wait_for_store},
  source::Extracts,
};

// ─── Stages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Stage {
  #[strum(to_string = "[1/6] waiting for the store")]
  Probe,
  #[strum(to_string = "[2/6] reading extracts")]
  Read,
  #[strum(to_string = "[3/6] upserting leagues, seasons, teams and players")]
  MasterData,
  #[strum(to_string = "[4/6] upserting matches")]
  Matches,
  #[strum(to_string = "[5/6] cataloguing metrics")]
  Catalog,
  #[strum(to_string = "[6/6] loading fact tables")]
  Facts,
}

// ─── Options and reports ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LoadOptions {
  pub probe:      ProbePolicy,
  pub batch_size: usize,
  pub fact_mode:  FactMode,
  pub league:     LeagueProfile,
}

impl Default for LoadOptions {
  fn default() -> Self {
    Self {
      probe:      ProbePolicy::default(),
      batch_size: 1000,
      fact_mode:  FactMode::default(),
      league:     LeagueProfile::default(),
    }
  }
}

/// Rows derived from the extracts versus rows the store actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Upserted {
  pub derived:  usize,
  pub inserted: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MasterDataReport {
  pub leagues: Upserted,
  pub seasons: Upserted,
  pub teams:   Upserted,
  pub players: Upserted,
  pub matches: Upserted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
  /// Distinct metric names across both extracts.
  pub observed:     usize,
  pub inserted:     usize,
  /// Size of the persisted catalog, earlier loads included.
  pub catalog_size: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FactReport {
  pub transform: TransformStats,
  pub written:   usize,
}

/// Summary of one completed load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
  pub started_at:   DateTime<Utc>,
  pub finished_at:  DateTime<Utc>,
  pub fact_mode:    FactMode,
  pub master:       MasterDataReport,
  pub catalog:      CatalogReport,
  pub team_facts:   FactReport,
  pub player_facts: FactReport,
  pub totals:       TableCounts,
}

impl LoadReport {
  /// The report as pretty-printed JSON.
  pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string_pretty(self) }

  /// Human-readable table totals, one line each.
  pub fn summary(&self) -> String {
    let t = &self.totals;
    let lines = [
      format!("leagues:           {}", t.leagues),
      format!("seasons:           {}", t.seasons),
      format!("teams:             {}", t.teams),
      format!("players:           {}", t.players),
      format!("matches:           {}", t.matches),
      format!("metrics:           {}", t.metrics),
      format!(
        "team_statistics:   {} (+{} this run)",
        t.team_facts, self.team_facts.written
      ),
      format!(
        "player_statistics: {} (+{} this run)",
        t.player_facts, self.player_facts.written
      ),
    ];
    lines.iter().map(|l| format!("{l}\n")).collect()
  }
}

#[derive(Debug, Clone)]
pub enum LoadOutcome {
  Loaded(Box<LoadReport>),
  /// The readiness probe gave up; nothing was read or written.
  StoreUnavailable { attempts: u32 },
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
  options: LoadOptions,
}

impl Pipeline {
  pub fn new(options: LoadOptions) -> Self { Self { options } }

  /// Run all six stages.
  ///
  /// `connect` opens the store and is retried by the readiness probe;
  /// `read` produces the extracts once the store is up. An unreachable
  /// store is reported as [`LoadOutcome::StoreUnavailable`], not as an
  /// error. The store handle is dropped before this returns.
  pub async fn run<S, E, F, Fut, R>(&self, connect: F, read: R) -> Result<LoadOutcome>
  where
    S: StatStore,
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<S, E>>,
    R: FnOnce() -> Result<Extracts>,
  {
    tracing::info!(stage = %Stage::Probe, "starting");
    let store = match wait_for_store(self.options.probe, connect).await {
      ProbeOutcome::Ready { store, .. } => store,
      ProbeOutcome::Unavailable { attempts } => {
        tracing::error!(attempts, "store unreachable, nothing loaded");
        return Ok(LoadOutcome::StoreUnavailable { attempts });
      }
    };

    tracing::info!(stage = %Stage::Read, "starting");
    let extracts = read()?;

    let report = self.load(&store, extracts).await?;
    Ok(LoadOutcome::Loaded(Box::new(report)))
  }

  /// Stages 3 to 6 against an already reachable store. Headers are
  /// validated and identifiers trimmed before anything is written.
  pub async fn load<S: StatStore>(&self, store: &S, mut extracts: Extracts) -> Result<LoadReport> {
    let started_at = Utc::now();
    extracts.prepare()?;
    let Extracts { team, player } = &extracts;

    // Stage 3: dimensions other than matches.
    tracing::info!(stage = %Stage::MasterData, "starting");
    let master = MasterData::derive(team, player, &self.options.league);
    let mut master_report = MasterDataReport {
      leagues: upserted(master.leagues.len(), store.upsert_leagues(&master.leagues)).await?,
      seasons: upserted(master.seasons.len(), store.upsert_seasons(&master.seasons)).await?,
      teams:   upserted(master.teams.len(), store.upsert_teams(&master.teams)).await?,
      players: upserted(master.players.len(), store.upsert_players(&master.players)).await?,
      matches: Upserted::default(),
    };
    tracing::info!(
      leagues = master_report.leagues.inserted,
      seasons = master_report.seasons.inserted,
      teams = master_report.teams.inserted,
      players = master_report.players.inserted,
      "master data upserted"
    );

    // Stage 4: matches reference seasons and teams, so they go last.
    tracing::info!(stage = %Stage::Matches, "starting");
    master_report.matches =
      upserted(master.matches.len(), store.upsert_matches(&master.matches)).await?;
    tracing::info!(
      derived = master_report.matches.derived,
      inserted = master_report.matches.inserted,
      "matches upserted"
    );

    // Stage 5: metric catalog.
    tracing::info!(stage = %Stage::Catalog, "starting");
    let team_metrics = metric_columns(team);
    let player_metrics = metric_columns(player);
    let universe = metric_universe([team_metrics.as_slice(), player_metrics.as_slice()]);
    let inserted = store
      .upsert_metrics(&new_metrics(&universe))
      .await
      .map_err(Error::store)?;
    let catalog: MetricCatalog = store
      .list_metrics()
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();
    let catalog_report = CatalogReport {
      observed: universe.len(),
      inserted,
      catalog_size: catalog.len(),
    };
    tracing::info!(
      observed = catalog_report.observed,
      inserted = catalog_report.inserted,
      catalog = catalog_report.catalog_size,
      "metric catalog ready"
    );

    // Stage 6: facts.
    tracing::info!(stage = %Stage::Facts, mode = %self.options.fact_mode, "starting");
    let known_events = store.event_ids().await.map_err(Error::store)?;
    let loader = FactLoader::new(self.options.batch_size, self.options.fact_mode);
    loader.prepare(store).await?;

    let team_set = transform::team_facts(team, &team_metrics, &known_events, &catalog);
    log_transform("team", &team_set.stats);
    let team_written = loader.load_team_facts(store, &team_set.facts).await?;
    tracing::info!(rows = team_written, "team_statistics loaded");

    let player_set =
      transform::player_facts(player, &player_metrics, &known_events, &catalog);
    log_transform("player", &player_set.stats);
    let player_written = loader.load_player_facts(store, &player_set.facts).await?;
    tracing::info!(rows = player_written, "player_statistics loaded");

    let totals = store.counts().await.map_err(Error::store)?;

    Ok(LoadReport {
      started_at,
      finished_at: Utc::now(),
      fact_mode: self.options.fact_mode,
      master: master_report,
      catalog: catalog_report,
      team_facts: FactReport { transform: team_set.stats, written: team_written },
      player_facts: FactReport { transform: player_set.stats, written: player_written },
      totals,
    })
  }
}

async fn upserted<Fut, E>(derived: usize, insert: Fut) -> Result<Upserted>
where
  Fut: Future<Output = Result<usize, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  let inserted = insert.await.map_err(Error::store)?;
  Ok(Upserted { derived, inserted })
}

fn log_transform(table: &str, stats: &TransformStats) {
  tracing::debug!(
    table,
    observed = stats.observed,
    missing = stats.missing,
    non_numeric = stats.non_numeric,
    missing_identity = stats.missing_identity,
    unknown_event = stats.unknown_event,
    unknown_metric = stats.unknown_metric,
    duplicate = stats.duplicate,
    "facts transformed"
  );
  tracing::info!(table, rows = stats.kept, "facts ready");
}
