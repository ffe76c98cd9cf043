//! Pluggable loader and post-index hook.
//!
//! Both are async traits so that embedders can do I/O while loading. The
//! [`loader_fn`] and [`hook_fn`] adapters cover the common case of a plain
//! synchronous closure.

use std::sync::Arc;

use async_trait::async_trait;

use sqlite_index_storage::{Store, Table};
use sqlite_index_types::{BoxError, Record};

/// Turns a discovered record into the value written to every table.
#[async_trait]
pub trait RecordLoader<R>: Send + Sync {
    /// Load one record.
    ///
    /// `Ok(None)` skips the record: nothing is written and the post-index
    /// hook is not called.
    async fn load(&self, record: Record) -> Result<Option<R>, BoxError>;
}

/// Observes a value after its table writes have committed.
///
/// A failure aborts the run but does not undo the writes.
#[async_trait]
pub trait PostIndexHook<R>: Send + Sync {
    /// Called with the store, every configured table, and the written value.
    async fn post_index(
        &self,
        store: &Store,
        tables: &[Arc<dyn Table<R>>],
        value: &R,
    ) -> Result<(), BoxError>;
}

/// [`RecordLoader`] backed by a closure. See [`loader_fn`].
pub struct FnLoader<F> {
    f: F,
}

/// Adapt a closure into a [`RecordLoader`].
pub fn loader_fn<R, F>(f: F) -> FnLoader<F>
where
    F: Fn(Record) -> Result<Option<R>, BoxError> + Send + Sync,
{
    FnLoader { f }
}

#[async_trait]
impl<R, F> RecordLoader<R> for FnLoader<F>
where
    R: Send + 'static,
    F: Fn(Record) -> Result<Option<R>, BoxError> + Send + Sync,
{
    async fn load(&self, record: Record) -> Result<Option<R>, BoxError> {
        (self.f)(record)
    }
}

/// [`PostIndexHook`] backed by a closure. See [`hook_fn`].
pub struct FnHook<F> {
    f: F,
}

/// Adapt a closure into a [`PostIndexHook`].
pub fn hook_fn<R, F>(f: F) -> FnHook<F>
where
    F: Fn(&Store, &[Arc<dyn Table<R>>], &R) -> Result<(), BoxError> + Send + Sync,
{
    FnHook { f }
}

#[async_trait]
impl<R, F> PostIndexHook<R> for FnHook<F>
where
    R: Send + Sync + 'static,
    F: Fn(&Store, &[Arc<dyn Table<R>>], &R) -> Result<(), BoxError> + Send + Sync,
{
    async fn post_index(
        &self,
        store: &Store,
        tables: &[Arc<dyn Table<R>>],
        value: &R,
    ) -> Result<(), BoxError> {
        (self.f)(store, tables, value)
    }
}
