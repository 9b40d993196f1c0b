//! Runtime configuration.
//!
//! Layered lowest first: built-in defaults, an optional TOML file, `PITCHLOAD_*`
//! environment variables, then command-line overrides.

use std::{path::{Path, PathBuf}, time::Duration};

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use pitchload_core::master::LeagueProfile;
use serde::{Deserialize, Serialize};

use crate::{Result, loader::FactMode, pipeline::LoadOptions, probe::ProbePolicy};

pub const ENV_PREFIX: &str = "PITCHLOAD";

/// Loader configuration, deserialised from the layered sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
  #[serde(default = "default_database_path")]
  pub database_path:       PathBuf,
  #[serde(default = "default_team_csv")]
  pub team_csv:            PathBuf,
  #[serde(default = "default_player_csv")]
  pub player_csv:          PathBuf,
  #[serde(default = "default_probe_attempts")]
  pub probe_attempts:      u32,
  #[serde(default = "default_probe_interval_secs")]
  pub probe_interval_secs: u64,
  #[serde(default = "default_batch_size")]
  pub batch_size:          usize,
  #[serde(default)]
  pub fact_mode:           FactMode,
  #[serde(default = "default_league_name")]
  pub league_name:         String,
  #[serde(default = "default_league_country")]
  pub league_country:      Option<String>,
}

fn default_database_path() -> PathBuf { PathBuf::from("soccer_stats.sqlite") }
fn default_team_csv() -> PathBuf { PathBuf::from("/data/team_statistics.csv") }
fn default_player_csv() -> PathBuf { PathBuf::from("/data/player_statistics.csv") }
fn default_probe_attempts() -> u32 { 15 }
fn default_probe_interval_secs() -> u64 { 5 }
fn default_batch_size() -> usize { 1000 }
fn default_league_name() -> String { LeagueProfile::default().name }
fn default_league_country() -> Option<String> { LeagueProfile::default().country }

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub database_path: Option<PathBuf>,
  pub team_csv:      Option<PathBuf>,
  pub player_csv:    Option<PathBuf>,
  pub fact_mode:     Option<FactMode>,
}

impl Overrides {
  fn apply(
    &self,
    builder: ConfigBuilder<DefaultState>,
  ) -> Result<ConfigBuilder<DefaultState>> {
    let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
    Ok(
      builder
        .set_override_option("database_path", path(&self.database_path))?
        .set_override_option("team_csv", path(&self.team_csv))?
        .set_override_option("player_csv", path(&self.player_csv))?
        .set_override_option("fact_mode", self.fact_mode.map(|m| m.to_string()))?,
    )
  }
}

impl LoaderConfig {
  /// Load from `file` (missing is fine), the environment and `overrides`.
  pub fn load(file: &Path, overrides: &Overrides) -> Result<Self> {
    let builder = Config::builder()
      .add_source(File::from(file).required(false))
      .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));
    Self::from_builder(overrides.apply(builder)?)
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
    Ok(builder.build()?.try_deserialize()?)
  }

  pub fn probe_policy(&self) -> ProbePolicy {
    ProbePolicy {
      attempts: self.probe_attempts,
      interval: Duration::from_secs(self.probe_interval_secs),
    }
  }

  pub fn load_options(&self) -> LoadOptions {
    LoadOptions {
      probe:      self.probe_policy(),
      batch_size: self.batch_size,
      fact_mode:  self.fact_mode,
      league:     LeagueProfile {
        name:    self.league_name.clone(),
        country: self.league_country.clone(),
      },
    }
  }
}
