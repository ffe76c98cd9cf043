//! Record source contract and the walking implementation behind every scheme.

use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use sqlite_index_types::{BoxError, Record, RecordExtras};

use crate::error::SourceError;
use crate::uri::{Scheme, SourceUri};

/// Per-record callback invoked by a [`RecordSource`].
///
/// May be invoked concurrently from several workers.
#[async_trait]
pub trait RecordCallback: Send + Sync {
    /// Handle one discovered record.
    async fn on_record(&self, record: Record) -> Result<(), BoxError>;
}

/// Discovers records for a set of identifiers and feeds them to a callback.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Discover and process every record under `uris`.
    ///
    /// Returns the first failure (lowest discovery index) once all in-flight
    /// records have finished.
    async fn enumerate(&self, uris: &[String]) -> Result<(), SourceError>;

    /// Shared handle on the "records seen" counter.
    fn seen_counter(&self) -> SeenCounter;

    /// Number of records handed to the callback so far.
    fn seen(&self) -> u64 {
        self.seen_counter().get()
    }
}

/// Shared, monotonically increasing count of records seen.
#[derive(Debug, Clone, Default)]
pub struct SeenCounter(Arc<AtomicU64>);

impl SeenCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Increment and return the new value.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Valid source URI schemes, e.g. for help text.
pub fn schemes() -> Vec<String> {
    Scheme::ALL.iter().map(|s| s.to_string()).collect()
}

/// Build the source for `uri`, bound to `callback`.
pub fn new_source(
    uri: &str,
    callback: Arc<dyn RecordCallback>,
) -> Result<Box<dyn RecordSource>, SourceError> {
    let uri = SourceUri::parse(uri)?;
    Ok(Box::new(WalkingSource::new(uri, callback)))
}

/// Filesystem-backed source used by every supported scheme.
pub struct WalkingSource {
    uri: SourceUri,
    workers: usize,
    callback: Arc<dyn RecordCallback>,
    seen: SeenCounter,
}

impl WalkingSource {
    /// Create a source for a parsed URI.
    pub fn new(uri: SourceUri, callback: Arc<dyn RecordCallback>) -> Self {
        let workers = uri.effective_workers();
        Self {
            uri,
            workers,
            callback,
            seen: SeenCounter::new(),
        }
    }

    /// Maximum number of records processed at once.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Paths discovered under one identifier, in discovery order.
    pub fn discover(&self, root: &str) -> Result<Vec<PathBuf>, SourceError> {
        discover(self.uri.scheme, root)
    }

    /// Spawn the callback for one record. Resolves to its discovery index and outcome.
    fn dispatch(
        &self,
        root: &str,
        path: PathBuf,
        index: u64,
    ) -> impl Future<Output = (u64, Result<(), SourceError>)> {
        let callback = self.callback.clone();
        let seen = self.seen.clone();
        let extras = RecordExtras::new(self.uri.raw.clone(), root, index);

        let handle = tokio::spawn(async move {
            let uri = path.to_string_lossy().into_owned();
            let file = File::open(&path).map_err(|e| SourceError::io(uri.clone(), e))?;
            let record = Record::new(uri.clone(), BufReader::new(file)).with_extras(extras);

            seen.increment();
            callback
                .on_record(record)
                .await
                .map_err(|source| SourceError::Callback { uri, source })
        });

        async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(SourceError::Worker(e.to_string())),
            };
            (index, result)
        }
    }
}

#[async_trait]
impl RecordSource for WalkingSource {
    async fn enumerate(&self, uris: &[String]) -> Result<(), SourceError> {
        let mut in_flight = FuturesUnordered::new();
        let mut failure: Option<(u64, SourceError)> = None;
        let mut index: u64 = 0;

        'roots: for root in uris {
            let scheme = self.uri.scheme;
            let owned_root = root.clone();
            let discovered = tokio::task::spawn_blocking(move || discover(scheme, &owned_root))
                .await
                .unwrap_or_else(|e| Err(SourceError::Worker(e.to_string())));

            let paths = match discovered {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(root = %root, error = %e, "Failed to discover records");
                    failure = Some((index, e));
                    break;
                }
            };
            debug!(root = %root, count = paths.len(), "Discovered records");

            for path in paths {
                while in_flight.len() >= self.workers {
                    match in_flight.next().await {
                        Some((i, Err(e))) => {
                            failure = Some((i, e));
                            break 'roots;
                        }
                        Some((_, Ok(()))) => {}
                        None => break,
                    }
                }
                in_flight.push(self.dispatch(root, path, index));
                index += 1;
            }
        }

        // Let in-flight records finish; keep the earliest failure.
        while let Some((i, result)) = in_flight.next().await {
            if let Err(e) = result {
                if failure.as_ref().map_or(true, |(j, _)| i < *j) {
                    failure = Some((i, e));
                }
            }
        }

        match failure {
            Some((i, e)) => {
                debug!(index = i, error = %e, "Enumeration failed");
                Err(e)
            }
            None => {
                info!(source = %self.uri.raw, seen = self.seen.get(), "Enumeration complete");
                Ok(())
            }
        }
    }

    fn seen_counter(&self) -> SeenCounter {
        self.seen.clone()
    }
}

fn discover(scheme: Scheme, root: &str) -> Result<Vec<PathBuf>, SourceError> {
    match scheme {
        Scheme::Directory => walk(Path::new(root)),
        Scheme::Repo => walk(&Path::new(root).join("data")),
        Scheme::File => Ok(vec![PathBuf::from(root)]),
        Scheme::FileList => read_file_list(root),
    }
}

fn walk(root: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn read_file_list(list: &str) -> Result<Vec<PathBuf>, SourceError> {
    let contents = std::fs::read_to_string(list).map_err(|e| SourceError::io(list, e))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CollectingCallback {
        uris: Mutex<Vec<String>>,
        contents: Mutex<Vec<String>>,
        fail_on: Vec<&'static str>,
        delay: Option<Duration>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl CollectingCallback {
        fn failing(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                ..Default::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        fn uris(&self) -> Vec<String> {
            self.uris.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordCallback for CollectingCallback {
        async fn on_record(&self, mut record: Record) -> Result<(), BoxError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.iter().any(|name| record.uri.ends_with(name)) {
                return Err(format!("refusing {}", record.uri).into());
            }

            let body = record.read_to_string()?;
            self.uris.lock().unwrap().push(record.uri.clone());
            self.contents.lock().unwrap().push(body);
            Ok(())
        }
    }

    fn write_tree(dir: &Path, names: &[&str]) {
        for name in names {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("content of {}", name)).unwrap();
        }
    }

    fn root_of(temp: &TempDir) -> String {
        temp.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_schemes_list() {
        assert_eq!(
            schemes(),
            vec!["directory://", "repo://", "file://", "filelist://"]
        );
    }

    #[test]
    fn test_new_source_unknown_scheme() {
        let callback = Arc::new(CollectingCallback::default());
        let result = new_source("s3://bucket", callback);
        assert!(matches!(result, Err(SourceError::UnknownScheme(_))));
    }

    #[test]
    fn test_directory_discovery_is_sorted_and_recursive() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["b.txt", "a.txt", "nested/c.txt"]);

        let source = WalkingSource::new(
            SourceUri::parse("directory://").unwrap(),
            Arc::new(CollectingCallback::default()),
        );
        let paths = source.discover(&root_of(&temp)).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.txt", "b.txt", "nested/c.txt"]);
    }

    #[tokio::test]
    async fn test_directory_enumerate() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["one.json", "two.json", "sub/three.json"]);

        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("directory://", callback.clone()).unwrap();
        source.enumerate(&[root_of(&temp)]).await.unwrap();

        assert_eq!(source.seen(), 3);
        assert_eq!(callback.uris().len(), 3);
        assert!(callback
            .contents
            .lock()
            .unwrap()
            .iter()
            .any(|c| c == "content of one.json"));
    }

    #[tokio::test]
    async fn test_repo_walks_data_dir() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["README.md", "data/1/1.geojson", "data/2/2.geojson"]);

        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("repo://", callback.clone()).unwrap();
        source.enumerate(&[root_of(&temp)]).await.unwrap();

        let uris = callback.uris();
        assert_eq!(uris.len(), 2);
        assert!(uris.iter().all(|u| u.ends_with(".geojson")));
    }

    #[tokio::test]
    async fn test_file_and_filelist() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["a.txt", "b.txt"]);

        let a = temp.path().join("a.txt").to_string_lossy().into_owned();
        let b = temp.path().join("b.txt").to_string_lossy().into_owned();

        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("file://", callback.clone()).unwrap();
        source.enumerate(&[a.clone()]).await.unwrap();
        assert_eq!(callback.uris(), vec![a.clone()]);

        let list = temp.path().join("list.txt");
        std::fs::write(&list, format!("{}\n\n  {}  \n", a, b)).unwrap();

        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("filelist://?workers=1", callback.clone()).unwrap();
        source
            .enumerate(&[list.to_string_lossy().into_owned()])
            .await
            .unwrap();
        assert_eq!(callback.uris(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("directory://", callback).unwrap();
        let result = source
            .enumerate(&["/definitely/not/a/real/dir".to_string()])
            .await;
        assert!(matches!(result, Err(SourceError::Walk(_))));
    }

    #[tokio::test]
    async fn test_missing_file_fails_with_io() {
        let callback = Arc::new(CollectingCallback::default());
        let source = new_source("file://", callback).unwrap();
        let result = source.enumerate(&["/definitely/not/here.txt".to_string()]).await;
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_earliest_failure_wins() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["a", "b", "c", "d", "e", "f"]);

        let callback = Arc::new(CollectingCallback::failing(vec!["/c", "/e"]));
        let source = new_source("directory://?workers=4", callback).unwrap();
        let result = source.enumerate(&[root_of(&temp)]).await;

        match result {
            Err(SourceError::Callback { uri, .. }) => assert!(uri.ends_with("/c"), "got {}", uri),
            other => panic!("expected callback failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_stops_discovery() {
        let temp = TempDir::new().unwrap();
        write_tree(temp.path(), &["a", "b", "c", "d"]);

        let callback = Arc::new(CollectingCallback::failing(vec!["/b"]));
        let source = new_source("directory://?workers=1", callback.clone()).unwrap();
        assert!(source.enumerate(&[root_of(&temp)]).await.is_err());

        // Only `a` succeeded; nothing after `b` was dispatched
        assert_eq!(callback.uris().len(), 1);
        assert_eq!(source.seen(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_workers_bound_concurrency() {
        let temp = TempDir::new().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("r{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        write_tree(temp.path(), &refs);

        let callback = Arc::new(CollectingCallback::slow(Duration::from_millis(10)));
        let source = new_source("directory://?workers=2", callback.clone()).unwrap();
        source.enumerate(&[root_of(&temp)]).await.unwrap();

        assert_eq!(callback.uris().len(), 12);
        assert!(callback.max_active.load(Ordering::SeqCst) <= 2);
    }

    /// Holds `r00` until every other record has been handled.
    struct FirstWaitsCallback {
        others: usize,
        finished: AtomicUsize,
        release: tokio::sync::Notify,
        order: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RecordCallback for FirstWaitsCallback {
        async fn on_record(&self, record: Record) -> Result<(), BoxError> {
            if record.uri.ends_with("r00") {
                self.release.notified().await;
            } else if self.finished.fetch_add(1, Ordering::SeqCst) + 1 == self.others {
                self.release.notify_one();
            }
            self.order.lock().unwrap().push(record.uri);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_record_does_not_stall_other_workers() {
        let temp = TempDir::new().unwrap();
        let names: Vec<String> = (0..6).map(|i| format!("r{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        write_tree(temp.path(), &refs);

        let callback = Arc::new(FirstWaitsCallback {
            others: 5,
            finished: AtomicUsize::new(0),
            release: tokio::sync::Notify::new(),
            order: Mutex::new(Vec::new()),
        });
        let source = new_source("directory://?workers=2", callback.clone()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), source.enumerate(&[root_of(&temp)]))
            .await
            .expect("enumeration stalled behind the first record")
            .unwrap();

        let order = callback.order.lock().unwrap().clone();
        assert_eq!(order.len(), 6);
        assert!(order[5].ends_with("r00"));
    }

    #[test]
    fn test_seen_counter() {
        let counter = SeenCounter::new();
        let shared = counter.clone();
        assert_eq!(counter.increment(), 1);
        assert_eq!(shared.increment(), 2);
        assert_eq!(counter.get(), 2);
    }
}
