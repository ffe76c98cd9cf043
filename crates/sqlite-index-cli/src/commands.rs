//! Command implementation for sqlite-index.
//!
//! 1. Load settings and apply CLI overrides
//! 2. Initialize logging
//! 3. Open the store and create the `example` table
//! 4. Index every identifier with the configured source

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use sqlite_index_indexer::{hook_fn, loader_fn, Indexer, IndexerConfig};
use sqlite_index_storage::{ExampleTable, Store, Table};
use sqlite_index_types::{Record, Settings};

use crate::cli::Cli;

/// Value written for every record: the time it was indexed.
#[derive(Debug, Clone, Serialize)]
pub struct Example {
    pub time: i64,
}

/// Apply CLI flags on top of loaded settings (highest precedence).
pub fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(source_uri) = &cli.source_uri {
        settings.source_uri = source_uri.clone();
    }
    if let Some(dsn) = &cli.dsn {
        settings.dsn = dsn.clone();
    }
    if let Some(live_hard_die_fast) = cli.live_hard_die_fast {
        settings.live_hard_die_fast = live_hard_die_fast;
    }
    if cli.timings {
        settings.timings = true;
    }
    if let Some(secs) = cli.timings_interval_secs {
        settings.timings_interval_secs = secs;
    }
    if cli.post_index {
        settings.post_index = true;
    }
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
}

/// The source URI with the configured worker count applied.
///
/// A `workers` parameter already present in the URI wins. A URI that does
/// not parse is returned as given so the source reports the error.
pub fn effective_source_uri(settings: &Settings) -> String {
    let raw = &settings.source_uri;
    if settings.workers == 0 {
        return raw.clone();
    }
    let Ok(mut url) = Url::parse(raw) else {
        return raw.clone();
    };
    if url.query_pairs().any(|(key, _)| key == "workers") {
        return raw.clone();
    }
    url.query_pairs_mut()
        .append_pair("workers", &settings.workers.to_string());
    url.into()
}

/// Build the indexer for the `example` table.
pub fn build_indexer(settings: &Settings, store: Arc<Store>) -> Result<Indexer<Example>> {
    let mut config = IndexerConfig::new()
        .with_store(store)
        .with_table(ExampleTable::new())
        .with_loader(loader_fn(|_record: Record| {
            Ok(Some(Example {
                time: Utc::now().timestamp(),
            }))
        }))
        .with_ensure_schema(true)
        .with_timings_interval(settings.timings_interval());

    if settings.post_index {
        config = config.with_post_index(hook_fn(
            |_store: &Store, tables: &[Arc<dyn Table<Example>>], value: &Example| {
                info!(record = ?value, tables = tables.len(), "Post index func");
                Ok(())
            },
        ));
    }

    let indexer = Indexer::new(config)
        .context("Failed to create indexer")?
        .with_timings(settings.timings);
    Ok(indexer)
}

fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run one indexing pass as described by `cli`.
pub async fn run_index(cli: Cli) -> Result<()> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut settings, &cli);
    settings.validate().context("Invalid configuration")?;

    init_logging(&settings.log_level)?;

    let source_uri = effective_source_uri(&settings);
    info!("sqlite-index starting...");
    info!("  DSN: {}", settings.dsn);
    info!("  Source: {}", source_uri);
    info!("  Timings: {}", settings.timings);

    if cli.uris.is_empty() {
        warn!("No identifiers given, nothing to index");
    }

    let store = Store::open(&settings.dsn)
        .with_context(|| format!("Unable to create database ({})", settings.dsn))?;

    if settings.live_hard_die_fast {
        store
            .live_hard_die_fast()
            .context("Unable to live hard and die fast so just dying fast instead")?;
    }

    let store = Arc::new(store);
    let indexer = build_indexer(&settings, store.clone())?;

    indexer
        .run(&source_uri, &cli.uris)
        .await
        .with_context(|| format!("Failed to index paths in {} mode", source_uri))?;

    if settings.timings {
        for (table, elapsed) in indexer.timings() {
            info!(table = %table, elapsed = ?elapsed, "Total time to index {}", table);
        }
    }

    let rows = store
        .row_count(ExampleTable::NAME)
        .context("Failed to count indexed rows")?;
    info!(rows, "Indexing finished");

    drop(indexer);
    if let Ok(store) = Arc::try_unwrap(store) {
        store.close().context("Failed to close database")?;
    }

    Ok(())
}
