//! Load pipeline for team and player match statistics.
//!
//! Reads the two wide CSV extracts, waits for the store to accept queries,
//! then writes master data, the metric catalog and the EAV fact tables in
//! dependency order. The pipeline is generic over any
//! [`pitchload_core::store::StatStore`]; the `pitchload` binary runs it
//! against [`pitchload_store_sqlite::SqliteStore`].

pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod probe;
pub mod source;

pub use error::{Error, Result};
pub use pipeline::{LoadOutcome, LoadReport, Pipeline};

#[cfg(test)]
mod tests;
