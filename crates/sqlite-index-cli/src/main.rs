//! sqlite-index
//!
//! Index records discovered by a source URI into a SQLite database.
//!
//! # Usage
//!
//! ```bash
//! sqlite-index [--source-uri URI] [--dsn DSN] [--timings] [--post-index] <IDENTIFIER>...
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/sqlite-index/config.toml)
//! 3. Environment variables (SQLITE_INDEX_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use sqlite_index_cli::{run_index, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run_index(cli).await
}
