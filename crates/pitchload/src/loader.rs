//! Fact loading: batched appends into the two fact tables.

use std::future::Future;

use pitchload_core::{
  model::{PlayerStatFact, TeamStatFact},
  store::{OnConflict, StatStore},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the loader treats facts already in the store.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  clap::ValueEnum,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FactMode {
  /// Skip facts whose natural key is already stored; re-runs are idempotent.
  #[default]
  Ignore,
  /// Plain insert; a duplicate natural key aborts the load.
  Fail,
  /// Delete all facts first, then insert; a re-run replaces earlier facts.
  Truncate,
}

impl FactMode {
  pub fn on_conflict(self) -> OnConflict {
    match self {
      FactMode::Ignore => OnConflict::Ignore,
      FactMode::Fail | FactMode::Truncate => OnConflict::Fail,
    }
  }
}

/// Writes transformed facts in fixed-size batches, one transaction each.
#[derive(Debug, Clone, Copy)]
pub struct FactLoader {
  batch_size: usize,
  mode:       FactMode,
}

impl FactLoader {
  pub fn new(batch_size: usize, mode: FactMode) -> Self {
    Self { batch_size: batch_size.max(1), mode }
  }

  /// Run before any batch is written. Clears both fact tables in
  /// [`FactMode::Truncate`]; otherwise does nothing.
  pub async fn prepare<S: StatStore>(&self, store: &S) -> Result<()> {
    if self.mode == FactMode::Truncate {
      store.clear_facts().await.map_err(Error::store)?;
      tracing::info!("fact tables cleared");
    }
    Ok(())
  }

  pub async fn load_team_facts<S: StatStore>(
    &self,
    store: &S,
    facts: &[TeamStatFact],
  ) -> Result<usize> {
    let on_conflict = self.mode.on_conflict();
    self
      .in_batches(facts, |batch| store.insert_team_facts(batch, on_conflict))
      .await
  }

  pub async fn load_player_facts<S: StatStore>(
    &self,
    store: &S,
    facts: &[PlayerStatFact],
  ) -> Result<usize> {
    let on_conflict = self.mode.on_conflict();
    self
      .in_batches(facts, |batch| store.insert_player_facts(batch, on_conflict))
      .await
  }

  async fn in_batches<'a, T, F, Fut, E>(&self, facts: &'a [T], mut insert: F) -> Result<usize>
  where
    F: FnMut(&'a [T]) -> Fut,
    Fut: Future<Output = Result<usize, E>>,
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut written = 0;
    for batch in facts.chunks(self.batch_size) {
      written += insert(batch).await.map_err(Error::store)?;
    }
    Ok(written)
  }
}
