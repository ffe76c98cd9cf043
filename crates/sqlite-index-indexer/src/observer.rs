//! Injected sink for user-visible indexing output.

use std::error::Error;
use std::time::Duration;

use tracing::{error, info, warn};

/// Receives failures, timing lines and deprecation notices from an indexer.
///
/// Every method has a no-op default so implementations only override what
/// they care about.
pub trait IndexObserver: Send + Sync {
    /// The loader failed for `uri`.
    fn load_failed(&self, _uri: &str, _error: &dyn Error) {}

    /// `table` rejected the record at `uri`.
    fn write_failed(&self, _uri: &str, _table: &str, _error: &dyn Error) {}

    /// The post-index hook failed for `uri`.
    fn hook_failed(&self, _uri: &str, _error: &dyn Error) {}

    /// Cumulative write time for one table after `seen` records.
    fn table_timing(&self, _table: &str, _seen: u64, _elapsed: Duration) {}

    /// Wall-clock time since the run started after `seen` records.
    fn total_timing(&self, _seen: u64, _elapsed: Duration) {}

    /// A deprecated entry point was called.
    fn deprecated(&self, _old: &str, _new: &str) {}
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl IndexObserver for LoggingObserver {
    fn load_failed(&self, uri: &str, error: &dyn Error) {
        error!(uri = %uri, error = %error, "Failed to load record");
    }

    fn write_failed(&self, uri: &str, table: &str, error: &dyn Error) {
        error!(uri = %uri, table = %table, error = %error, "Failed to index record");
    }

    fn hook_failed(&self, uri: &str, error: &dyn Error) {
        error!(uri = %uri, error = %error, "Post-index hook failed");
    }

    fn table_timing(&self, table: &str, seen: u64, elapsed: Duration) {
        info!(table = %table, seen, elapsed = ?elapsed, "Time to index table");
    }

    fn total_timing(&self, seen: u64, elapsed: Duration) {
        info!(seen, elapsed = ?elapsed, "Time to index all");
    }

    fn deprecated(&self, old: &str, new: &str) {
        warn!(old = %old, new = %new, "Deprecated method called");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl IndexObserver for NoOpObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_timing_lines_log_each_value_once() {
        let output = capture(|| {
            LoggingObserver.table_timing("geojson", 42, Duration::from_millis(1500));
            LoggingObserver.total_timing(42, Duration::from_millis(1500));
        });

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "{}", output);
        assert_eq!(lines[0].matches("geojson").count(), 1, "{}", lines[0]);
        for line in lines {
            assert_eq!(line.matches("42").count(), 1, "{}", line);
            assert_eq!(line.matches("1.5s").count(), 1, "{}", line);
        }
    }

    #[test]
    fn test_noop_observer_logs_nothing() {
        let output = capture(|| {
            NoOpObserver.table_timing("geojson", 1, Duration::from_secs(1));
            NoOpObserver.deprecated("index_paths", "run");
        });
        assert!(output.is_empty());
    }
}
