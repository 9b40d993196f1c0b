//! Core types and pure transformations for the pitchload statistics loader.
//!
//! This crate is deliberately free of database and CSV dependencies. It owns
//! the domain model, the wide-table representation of the source extracts,
//! and every step of the load that can be expressed without I/O: identifier
//! normalisation, master-data derivation, metric cataloguing and the
//! wide-to-long fact transformation. Storage backends implement
//! [`store::StatStore`].

pub mod catalog;
pub mod error;
pub mod master;
pub mod model;
pub mod normalize;
pub mod schema;
pub mod store;
pub mod table;
pub mod transform;

pub use error::{Error, Result};
