//! sqlite-index library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Settings resolution, logging setup and the indexing run

pub mod cli;
pub mod commands;

pub use cli::Cli;
pub use commands::{apply_overrides, build_indexer, effective_source_uri, run_index, Example};
