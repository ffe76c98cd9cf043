//! Per-table timing statistics and the background reporter.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sqlite_index_source::SeenCounter;

use crate::observer::IndexObserver;

/// Cumulative write time per table name.
///
/// Cheap to clone; clones share the same map. Values only ever grow.
#[derive(Debug, Clone, Default)]
pub struct TimingStats {
    inner: Arc<RwLock<BTreeMap<String, Duration>>>,
}

impl TimingStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` to `table`.
    pub fn record(&self, table: &str, elapsed: Duration) {
        self.record_all([(table, elapsed)]);
    }

    /// Add several table durations under one write lock.
    pub fn record_all<'a>(&self, timings: impl IntoIterator<Item = (&'a str, Duration)>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for (table, elapsed) in timings {
            *map.entry(table.to_string()).or_default() += elapsed;
        }
    }

    /// Cumulative time for `table` (zero if never written).
    pub fn get(&self, table: &str) -> Duration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .copied()
            .unwrap_or_default()
    }

    /// Copy of the current statistics.
    pub fn snapshot(&self) -> BTreeMap<String, Duration> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum across all tables.
    pub fn total(&self) -> Duration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

/// Emit one timing report: a line per table plus an aggregate line.
pub fn report(stats: &TimingStats, seen: u64, elapsed: Duration, observer: &dyn IndexObserver) {
    for (table, duration) in stats.snapshot() {
        observer.table_timing(&table, seen, duration);
    }
    observer.total_timing(seen, elapsed);
}

/// Background task reporting timings on a fixed interval.
///
/// Runs until [`TimingReporter::stop`] is awaited; once `stop` returns no
/// further report is emitted. Dropping the reporter without stopping it
/// cancels the task but does not wait for it.
pub struct TimingReporter {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TimingReporter {
    /// Spawn the reporter. The first report fires one `interval` from now.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn start(
        stats: TimingStats,
        seen: SeenCounter,
        observer: Arc<dyn IndexObserver>,
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(started + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        report(&stats, seen.get(), started.elapsed(), observer.as_ref());
                    }
                }
            }
            debug!("Timing reporter stopped");
        });

        debug!(interval = ?interval, "Timing reporter started");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop the reporter and wait for it to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Timing reporter exited abnormally");
            }
        }
    }
}

impl Drop for TimingReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
