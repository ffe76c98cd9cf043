//! End-to-end test infrastructure for sqlite-index.
//!
//! Provides a shared TestHarness (temp data directory plus a file-backed
//! store) and the loaders, tables, hooks and observers used to exercise the
//! full discover-load-write pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;

use sqlite_index_indexer::{loader_fn, IndexObserver, PostIndexHook, RecordLoader};
use sqlite_index_storage::{ExampleTable, StorageError, Store, Table};
use sqlite_index_types::{BoxError, Record};

/// Value written by the test loaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub time: i64,
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Store backed by `db_path`
    pub store: Arc<Store>,
    /// Database file
    pub db_path: PathBuf,
    /// Directory records are written to
    pub data_dir: PathBuf,
}

impl TestHarness {
    /// Create a harness with an empty data directory and a file-backed store.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("index.db");
        let data_dir = temp_dir.path().join("records");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        let store =
            Arc::new(Store::open(&db_path.to_string_lossy()).expect("Failed to open test store"));

        Self {
            _temp_dir: temp_dir,
            store,
            db_path,
            data_dir,
        }
    }

    /// Write `(name, body)` records into the data directory.
    pub fn write_records(&self, records: &[(&str, &str)]) -> Vec<PathBuf> {
        records
            .iter()
            .map(|(name, body)| {
                let path = self.data_dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("Failed to create record dir");
                }
                std::fs::write(&path, body).expect("Failed to write record");
                path
            })
            .collect()
    }

    /// Write `count` records named `r0000.json`, `r0001.json`, ...
    pub fn write_numbered(&self, count: usize) -> Vec<PathBuf> {
        let owned: Vec<(String, String)> = (0..count)
            .map(|i| (format!("r{:04}.json", i), format!("record {}", i)))
            .collect();
        let borrowed: Vec<(&str, &str)> = owned
            .iter()
            .map(|(n, b)| (n.as_str(), b.as_str()))
            .collect();
        self.write_records(&borrowed)
    }

    /// Write a file list naming `paths`, one per line.
    pub fn write_file_list(&self, paths: &[PathBuf]) -> String {
        let list = self._temp_dir.path().join("files.txt");
        let body: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        std::fs::write(&list, body.join("\n")).expect("Failed to write file list");
        list.to_string_lossy().into_owned()
    }

    /// The data directory as an identifier for `directory://`.
    pub fn data_root(&self) -> String {
        self.data_dir.to_string_lossy().into_owned()
    }

    /// JSON bodies stored in `table`, sorted.
    pub fn bodies(&self, table: &str) -> Vec<String> {
        let conn = self.store.conn();
        let sql = format!("SELECT body FROM \"{}\" ORDER BY body", table);
        let mut stmt = conn.prepare(&sql).expect("Failed to prepare query");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .expect("Failed to query bodies");
        let bodies: Vec<String> = rows.map(|r| r.expect("Failed to read row")).collect();
        bodies
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Loader returning `{ "time": <unix seconds> }` for every record.
pub fn time_loader() -> impl RecordLoader<Example> {
    loader_fn(|_record: Record| {
        let time = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
        Ok(Some(Example { time }))
    })
}

/// Loader driven by record bodies.
///
/// `skip` skips the record, `fail` fails it, anything else yields
/// `{ "time": <body length> }`.
pub fn body_loader() -> impl RecordLoader<Example> {
    loader_fn(|mut record: Record| {
        let body = record.read_to_string()?;
        match body.trim() {
            "skip" => Ok(None),
            "fail" => Err(format!("refusing to load {}", record.uri).into()),
            _ => Ok(Some(Example {
                time: body.len() as i64,
            })),
        }
    })
}

/// Table that rejects every write.
pub struct FailingTable {
    name: String,
}

impl FailingTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<R> Table<R> for FailingTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> String {
        String::new()
    }

    fn ensure_schema(&self, _store: &Store) -> Result<(), StorageError> {
        Ok(())
    }

    fn write_record(&self, _store: &Store, _record: &R) -> Result<(), StorageError> {
        Err(StorageError::Table(format!("{} rejects all writes", self.name)))
    }
}

/// `ExampleTable` that sleeps before every write.
pub struct SlowTable {
    inner: ExampleTable,
    delay: Duration,
}

impl SlowTable {
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: ExampleTable::with_name(name),
            delay,
        }
    }
}

impl Table<Example> for SlowTable {
    fn name(&self) -> &str {
        self.inner.table_name()
    }

    fn schema(&self) -> String {
        self.inner.schema_sql()
    }

    fn write_record(&self, store: &Store, record: &Example) -> Result<(), StorageError> {
        std::thread::sleep(self.delay);
        Table::<Example>::write_record(&self.inner, store, record)
    }
}

/// Hook counting its invocations and whether the store was locked at the time.
#[derive(Default)]
pub struct CountingHook {
    calls: AtomicUsize,
    locked_calls: AtomicUsize,
}

impl CountingHook {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn locked_calls(&self) -> usize {
        self.locked_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostIndexHook<Example> for Arc<CountingHook> {
    async fn post_index(
        &self,
        store: &Store,
        _tables: &[Arc<dyn Table<Example>>],
        _value: &Example,
    ) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if store.is_locked() {
            self.locked_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Observer keeping every event as a line of text.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("observer lock poisoned").clone()
    }

    /// Number of events starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("observer lock poisoned").push(event);
    }
}

impl IndexObserver for RecordingObserver {
    fn load_failed(&self, uri: &str, _error: &dyn std::error::Error) {
        self.push(format!("load_failed {}", uri));
    }

    fn write_failed(&self, uri: &str, table: &str, _error: &dyn std::error::Error) {
        self.push(format!("write_failed {} {}", uri, table));
    }

    fn hook_failed(&self, uri: &str, _error: &dyn std::error::Error) {
        self.push(format!("hook_failed {}", uri));
    }

    fn table_timing(&self, table: &str, seen: u64, _elapsed: Duration) {
        self.push(format!("table_timing {} {}", table, seen));
    }

    fn total_timing(&self, seen: u64, _elapsed: Duration) {
        self.push(format!("total_timing {}", seen));
    }

    fn deprecated(&self, old: &str, new: &str) {
        self.push(format!("deprecated {} {}", old, new));
    }
}
