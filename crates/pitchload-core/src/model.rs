//! Domain entities: dimension rows, the metric catalog, and EAV facts.
//!
//! These are transient, in-process representations. The store owns durable
//! state; nothing here is persisted until a [`StatStore`](crate::store::StatStore)
//! call commits it.

use serde::{Deserialize, Serialize};

// ─── Dimensions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
  pub league_id: String,
  pub name:      String,
  pub country:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
  pub season_id: String,
  pub name:      Option<String>,
  /// Owning league; must already exist or be inserted in the same load.
  pub league_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
  pub team_id: String,
  pub name:    Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
  pub player_id: String,
  pub name:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub event_id:     String,
  pub season_id:    String,
  pub home_team_id: Option<String>,
  pub away_team_id: Option<String>,
  pub status:       String,
}

// ─── Metric catalog ──────────────────────────────────────────────────────────

/// A metric to register; the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMetric {
  pub slug:         String,
  pub display_name: String,
}

/// A registered metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
  pub statistic_id: i64,
  pub slug:         String,
  pub display_name: String,
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// One observed team metric. `(event_id, team_id, statistic_id)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStatFact {
  pub event_id:     String,
  pub team_id:      String,
  pub statistic_id: i64,
  pub value:        f64,
}

/// One observed player metric. `(event_id, player_id, statistic_id)` is
/// unique; `team_id` records the side the player turned out for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatFact {
  pub event_id:     String,
  pub player_id:    String,
  pub team_id:      Option<String>,
  pub statistic_id: i64,
  pub value:        f64,
}

// ─── Totals ──────────────────────────────────────────────────────────────────

/// Row counts of every table in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
  pub leagues:      u64,
  pub seasons:      u64,
  pub teams:        u64,
  pub players:      u64,
  pub matches:      u64,
  pub metrics:      u64,
  pub team_facts:   u64,
  pub player_facts: u64,
}
