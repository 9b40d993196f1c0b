//! pitchload binary.
//!
//! Loads `team_statistics.csv` and `player_statistics.csv` into the SQLite
//! statistics store. Settings come from `pitchload.toml` (or the path given
//! with `--config`), `PITCHLOAD_*` environment variables and the flags below.
//!
//! Logs and banners go to stderr; stdout carries only the report, so
//! `--json` output can be piped straight into another tool.
//!
//! ```text
//! pitchload --database stats.sqlite --team-csv team.csv --player-csv player.csv
//! ```

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use pitchload::{
  LoadOutcome, Pipeline,
  config::{LoaderConfig, Overrides},
  loader::FactMode,
  source::Extracts,
};
use pitchload_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Load match statistics into the EAV store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "pitchload.toml")]
  config: PathBuf,

  /// SQLite database file.
  #[arg(long)]
  database: Option<PathBuf>,

  /// Team-level statistics extract.
  #[arg(long)]
  team_csv: Option<PathBuf>,

  /// Player-level statistics extract.
  #[arg(long)]
  player_csv: Option<PathBuf>,

  /// How to treat facts that are already loaded.
  #[arg(long, value_enum)]
  fact_mode: Option<FactMode>,

  /// Print the load report as JSON.
  #[arg(long)]
  json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let overrides = Overrides {
    database_path: cli.database,
    team_csv:      cli.team_csv,
    player_csv:    cli.player_csv,
    fact_mode:     cli.fact_mode,
  };
  let cfg = LoaderConfig::load(&cli.config, &overrides)
    .context("failed to load configuration")?;

  banner("pitchload: match statistics load");

  let pipeline = Pipeline::new(cfg.load_options());
  let outcome = pipeline
    .run(
      || SqliteStore::open(cfg.database_path.clone()),
      || Extracts::read(&cfg.team_csv, &cfg.player_csv),
    )
    .await
    .with_context(|| format!("load into {} failed", cfg.database_path.display()))?;

  match outcome {
    LoadOutcome::Loaded(report) => {
      if cli.json {
        println!("{}", report.to_json()?);
      } else {
        print!("{}", report.summary());
      }
      banner("done: statistics loaded");
      Ok(ExitCode::SUCCESS)
    }
    LoadOutcome::StoreUnavailable { attempts } => {
      banner(&format!(
        "failed: store at {} unreachable after {attempts} attempts",
        cfg.database_path.display()
      ));
      Ok(ExitCode::FAILURE)
    }
  }
}

fn banner(message: &str) {
  let rule = "=".repeat(50);
  eprintln!("\n{rule}\n  {message}\n{rule}\n");
}
