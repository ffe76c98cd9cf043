//! The indexer: per-record write path and run entry point.
//!
//! For every record handed over by a [`RecordSource`]:
//! 1. the loader turns it into a value (or skips it)
//! 2. the store lock is taken and every table writes the value, in order,
//!    on the blocking pool
//! 3. per-table durations are added to the timing statistics
//! 4. the lock is released and the post-index hook, if any, runs
//!
//! Any failure aborts the run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info};

use sqlite_index_source::{new_source, RecordCallback, RecordSource, SourceError};
use sqlite_index_storage::{Store, Table};
use sqlite_index_types::{BoxError, Record};

use crate::config::IndexerConfig;
use crate::error::IndexingError;
use crate::loader::{PostIndexHook, RecordLoader};
use crate::observer::IndexObserver;
use crate::timings::{TimingReporter, TimingStats};

struct IndexerInner<R> {
    store: Arc<Store>,
    tables: Vec<Arc<dyn Table<R>>>,
    loader: Arc<dyn RecordLoader<R>>,
    post_index: Option<Arc<dyn PostIndexHook<R>>>,
    observer: Arc<dyn IndexObserver>,
    stats: TimingStats,
}

/// Loads records from a source and writes them to a set of tables.
pub struct Indexer<R> {
    inner: Arc<IndexerInner<R>>,
    timings: bool,
    timings_interval: Duration,
}

impl<R> Indexer<R>
where
    R: Send + Sync + 'static,
{
    /// Build an indexer.
    ///
    /// Fails with [`IndexingError::Config`] if the store or loader is
    /// missing. With `ensure_schema` set, creates any missing tables.
    pub fn new(config: IndexerConfig<R>) -> Result<Self, IndexingError> {
        let store = config
            .store
            .ok_or_else(|| IndexingError::Config("a store is required".to_string()))?;
        let loader = config
            .loader
            .ok_or_else(|| IndexingError::Config("a record loader is required".to_string()))?;

        if config.timings_interval.is_zero() {
            return Err(IndexingError::Config(
                "timings interval must be greater than zero".to_string(),
            ));
        }

        if config.ensure_schema {
            for table in &config.tables {
                table.ensure_schema(&store)?;
            }
        }

        debug!(tables = config.tables.len(), "Indexer created");

        Ok(Self {
            inner: Arc::new(IndexerInner {
                store,
                tables: config.tables,
                loader,
                post_index: config.post_index,
                observer: config.observer,
                stats: TimingStats::new(),
            }),
            timings: false,
            timings_interval: config.timings_interval,
        })
    }

    /// Enable or disable the periodic timing reporter for subsequent runs.
    pub fn set_timings(&mut self, enabled: bool) {
        self.timings = enabled;
    }

    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.timings = enabled;
        self
    }

    pub fn timings_enabled(&self) -> bool {
        self.timings
    }

    /// Snapshot of cumulative per-table write time.
    pub fn timings(&self) -> BTreeMap<String, Duration> {
        self.inner.stats.snapshot()
    }

    /// Shared handle on the live timing statistics.
    pub fn timing_stats(&self) -> TimingStats {
        self.inner.stats.clone()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    /// Names of the configured tables, in write order.
    pub fn table_names(&self) -> Vec<String> {
        self.inner
            .tables
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// The per-record callback, for driving a custom [`RecordSource`].
    pub fn callback(&self) -> Arc<dyn RecordCallback> {
        Arc::new(IndexerCallback {
            inner: self.inner.clone(),
        })
    }

    /// Run one record through the write path.
    pub async fn index_record(&self, record: Record) -> Result<(), IndexingError> {
        self.inner.index_record(record).await
    }

    /// Index every record under `uris`, discovered with `source_uri`.
    ///
    /// Returns the first error encountered. When timings are enabled, the
    /// reporter is stopped before this returns.
    pub async fn run(&self, source_uri: &str, uris: &[String]) -> Result<(), IndexingError> {
        let source = new_source(source_uri, self.callback())?;
        info!(source = %source_uri, count = uris.len(), "Starting indexing run");
        self.run_with_source(source.as_ref(), uris).await
    }

    /// Like [`Indexer::run`], with a caller-built source.
    ///
    /// The source must have been built around [`Indexer::callback`].
    pub async fn run_with_source(
        &self,
        source: &dyn RecordSource,
        uris: &[String],
    ) -> Result<(), IndexingError> {
        let started = Instant::now();
        let reporter = self.timings.then(|| {
            TimingReporter::start(
                self.inner.stats.clone(),
                source.seen_counter(),
                self.inner.observer.clone(),
                self.timings_interval,
            )
        });

        let result = source.enumerate(uris).await;

        if let Some(reporter) = reporter {
            reporter.stop().await;
        }

        match result {
            Ok(()) => {
                info!(
                    seen = source.seen(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Indexing run complete"
                );
                Ok(())
            }
            Err(e) => Err(recover_indexing_error(e)),
        }
    }

    /// Index `paths` with `source_uri`.
    #[deprecated(note = "use `Indexer::run`, which takes the source URI first")]
    pub async fn index_paths(
        &self,
        paths: &[String],
        source_uri: &str,
    ) -> Result<(), IndexingError> {
        self.inner.observer.deprecated("index_paths", "run");
        self.run(source_uri, paths).await
    }
}

impl<R> IndexerInner<R>
where
    R: Send + Sync + 'static,
{
    async fn index_record(self: &Arc<Self>, record: Record) -> Result<(), IndexingError> {
        let uri = record.uri.clone();

        let value = match self.loader.load(record).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(uri = %uri, "Skipping record");
                return Ok(());
            }
            Err(source) => {
                self.observer.load_failed(&uri, &*source);
                return Err(IndexingError::Load { uri, source });
            }
        };

        let value = {
            let _lock = self.store.lock().await;

            let inner = Arc::clone(self);
            let task_uri = uri.clone();
            tokio::task::spawn_blocking(move || {
                inner.write_tables(&task_uri, &value).map(|()| value)
            })
            .await
            .map_err(|source| IndexingError::Task {
                uri: uri.clone(),
                source,
            })??
        };

        if let Some(hook) = &self.post_index {
            if let Err(source) = hook.post_index(&self.store, &self.tables, &value).await {
                self.observer.hook_failed(&uri, &*source);
                return Err(IndexingError::Hook { uri, source });
            }
        }

        Ok(())
    }

    /// Write `value` to every table in order, stopping at the first failure.
    ///
    /// Blocking. The caller holds the store lock.
    fn write_tables(&self, uri: &str, value: &R) -> Result<(), IndexingError> {
        let mut elapsed = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let t = Instant::now();
            if let Err(source) = table.write_record(&self.store, value) {
                self.observer.write_failed(uri, table.name(), &source);
                return Err(IndexingError::Write {
                    uri: uri.to_string(),
                    table: table.name().to_string(),
                    source,
                });
            }
            elapsed.push((table.name(), t.elapsed()));
        }

        self.stats.record_all(elapsed);
        Ok(())
    }
}

struct IndexerCallback<R> {
    inner: Arc<IndexerInner<R>>,
}

#[async_trait]
impl<R> RecordCallback for IndexerCallback<R>
where
    R: Send + Sync + 'static,
{
    async fn on_record(&self, record: Record) -> Result<(), BoxError> {
        self.inner
            .index_record(record)
            .await
            .map_err(|e| Box::new(e) as BoxError)
    }
}

/// Unwrap an [`IndexingError`] raised by our callback from the source's wrapper.
fn recover_indexing_error(err: SourceError) -> IndexingError {
    match err {
        SourceError::Callback { uri, source } => match source.downcast::<IndexingError>() {
            Ok(e) => *e,
            Err(source) => IndexingError::Source(SourceError::Callback { uri, source }),
        },
        other => IndexingError::Source(other),
    }
}
