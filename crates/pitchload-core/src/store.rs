//! The `StatStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `pitchload-store-sqlite`). The load pipeline depends on this abstraction,
//! not on any concrete backend.

use std::{collections::HashSet, future::Future};

use crate::model::{
  League, Match, Metric, NewMetric, Player, PlayerStatFact, Season, TableCounts,
  Team, TeamStatFact,
};

/// What a fact insert does when its natural key is already stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnConflict {
  /// Skip the row.
  #[default]
  Ignore,
  /// Abort the batch with the store's constraint error.
  Fail,
}

/// Abstraction over the relational store the loader writes to.
///
/// Every dimension upsert is conflict-safe: a row whose primary key already
/// exists is left untouched and not counted. Each call runs in its own
/// transaction, so a failure rolls back that call only.
pub trait StatStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Trivial round trip proving the store accepts queries.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Master data ───────────────────────────────────────────────────────

  /// Insert leagues; returns how many were new.
  fn upsert_leagues<'a>(
    &'a self,
    leagues: &'a [League],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn upsert_seasons<'a>(
    &'a self,
    seasons: &'a [Season],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn upsert_teams<'a>(
    &'a self,
    teams: &'a [Team],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn upsert_players<'a>(
    &'a self,
    players: &'a [Player],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn upsert_matches<'a>(
    &'a self,
    matches: &'a [Match],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Identifiers of every registered match.
  fn event_ids(
    &self,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  // ── Metric catalog ────────────────────────────────────────────────────

  /// Register metrics by slug; returns how many were new.
  fn upsert_metrics<'a>(
    &'a self,
    metrics: &'a [NewMetric],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// The whole persisted catalog, including metrics from earlier loads.
  fn list_metrics(
    &self,
  ) -> impl Future<Output = Result<Vec<Metric>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Insert one batch of team facts in a single transaction; returns how
  /// many rows were written.
  fn insert_team_facts<'a>(
    &'a self,
    facts: &'a [TeamStatFact],
    on_conflict: OnConflict,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn insert_player_facts<'a>(
    &'a self,
    facts: &'a [PlayerStatFact],
    on_conflict: OnConflict,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Delete every team and player fact in one transaction.
  fn clear_facts(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn counts(
    &self,
  ) -> impl Future<Output = Result<TableCounts, Self::Error>> + Send + '_;
}
