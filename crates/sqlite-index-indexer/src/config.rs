//! Indexer configuration.

use std::sync::Arc;
use std::time::Duration;

use sqlite_index_storage::{Store, Table};

use crate::loader::{PostIndexHook, RecordLoader};
use crate::observer::{IndexObserver, LoggingObserver};

/// Default interval between timing reports.
pub const DEFAULT_TIMINGS_INTERVAL: Duration = Duration::from_secs(60);

/// Everything an [`Indexer`](crate::Indexer) needs, assembled once.
///
/// Tables are written in insertion order. A config with no tables is valid
/// and writes nothing.
pub struct IndexerConfig<R> {
    /// Store shared by every table (required)
    pub store: Option<Arc<Store>>,
    /// Tables written for every loaded record
    pub tables: Vec<Arc<dyn Table<R>>>,
    /// Loader turning records into values (required)
    pub loader: Option<Arc<dyn RecordLoader<R>>>,
    /// Optional hook run after each record's writes
    pub post_index: Option<Arc<dyn PostIndexHook<R>>>,
    /// Sink for failures and timing lines
    pub observer: Arc<dyn IndexObserver>,
    /// Create missing table schemas during construction
    pub ensure_schema: bool,
    /// Interval between timing reports
    pub timings_interval: Duration,
}

impl<R> Default for IndexerConfig<R> {
    fn default() -> Self {
        Self {
            store: None,
            tables: Vec::new(),
            loader: None,
            post_index: None,
            observer: Arc::new(LoggingObserver),
            ensure_schema: false,
            timings_interval: DEFAULT_TIMINGS_INTERVAL,
        }
    }
}

impl<R> IndexerConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store.
    pub fn with_store(mut self, store: Arc<Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Append a table.
    pub fn with_table(mut self, table: impl Table<R> + 'static) -> Self {
        self.tables.push(Arc::new(table));
        self
    }

    /// Append an already shared table.
    pub fn with_shared_table(mut self, table: Arc<dyn Table<R>>) -> Self {
        self.tables.push(table);
        self
    }

    /// Set the loader.
    pub fn with_loader(mut self, loader: impl RecordLoader<R> + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Set the post-index hook.
    pub fn with_post_index(mut self, hook: impl PostIndexHook<R> + 'static) -> Self {
        self.post_index = Some(Arc::new(hook));
        self
    }

    /// Replace the default [`LoggingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn IndexObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Create missing table schemas in [`Indexer::new`](crate::Indexer::new).
    pub fn with_ensure_schema(mut self, ensure_schema: bool) -> Self {
        self.ensure_schema = ensure_schema;
        self
    }

    /// Set the interval between timing reports.
    pub fn with_timings_interval(mut self, interval: Duration) -> Self {
        self.timings_interval = interval;
        self
    }
}
