//! Shared handle over an expectation queue.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::error::{MockError, Result, abort};
use crate::global;
use crate::payload::{FromPayload, MockRecord, Payload};
use crate::queue::ExpectationQueue;
use crate::script::Script;

/// Cloneable handle used by test doubles.
///
/// Either owns a private queue (one per test, safe under the parallel test
/// runner) or points at the process-wide queue in [`global`].
///
/// When the last handle to a private queue is dropped, the queue must be
/// empty: leftover expectations fail the test, unless the thread is already
/// unwinding from another failure.
#[derive(Debug, Clone)]
pub struct MockQueue {
    source: Source,
}

#[derive(Debug, Clone)]
enum Source {
    Owned(Arc<OwnedQueue>),
    Global,
}

/// Private queue, verified on drop.
#[derive(Debug)]
struct OwnedQueue(Mutex<ExpectationQueue>);

impl Drop for OwnedQueue {
    fn drop(&mut self) {
        match self.0.get_mut().drain() {
            Ok(()) => debug!("private expectation queue dropped"),
            Err(err) if std::thread::panicking() => {
                warn!(error = %err, "private expectation queue dropped during unwind");
            }
            Err(err) => abort(&err),
        }
    }
}

impl MockQueue {
    /// Creates a handle over a new private queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(QueueConfig::new())
    }

    /// Creates a handle over a new private queue with a configuration.
    #[must_use]
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            source: Source::Owned(Arc::new(OwnedQueue(Mutex::new(
                ExpectationQueue::with_config(config),
            )))),
        }
    }

    /// Creates a handle over the process-wide queue.
    ///
    /// Scripting it should happen inside a [`global::Session`].
    #[must_use]
    pub const fn global() -> Self {
        Self {
            source: Source::Global,
        }
    }

    /// Returns true if this handle points at the process-wide queue.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self.source, Source::Global)
    }

    fn with<R>(&self, name: &str, f: impl FnOnce(&mut ExpectationQueue) -> Result<R>) -> Result<R> {
        match &self.source {
            Source::Owned(queue) => {
                let Some(mut queue) = queue.0.try_lock() else {
                    return Err(MockError::ConcurrentAccess {
                        name: name.to_string(),
                    });
                };
                f(&mut queue)
            }
            Source::Global => global::with_queue(name, f),
        }
    }

    /// See [`ExpectationQueue::push`].
    ///
    /// # Errors
    /// [`MockError::CapacityExceeded`] or [`MockError::ConcurrentAccess`].
    pub fn push(&self, name: &str, payload: impl Into<Payload>) -> Result<()> {
        self.with(name, |q| q.push(name, payload))
    }

    /// See [`ExpectationQueue::push_record`].
    ///
    /// # Errors
    /// Record encoding, capacity or concurrent access errors.
    pub fn push_record<T: MockRecord>(&self, name: &str, value: &T) -> Result<()> {
        self.with(name, |q| q.push_record(name, value))
    }

    /// See [`ExpectationQueue::pop`].
    ///
    /// # Errors
    /// Any call divergence for `name`.
    pub fn pop<T: FromPayload>(&self, name: &str) -> Result<T> {
        self.with(name, |q| q.pop(name))
    }

    /// See [`ExpectationQueue::pop_record`].
    ///
    /// # Errors
    /// Any call divergence for `name`.
    pub fn pop_record<T: MockRecord>(&self, name: &str) -> Result<T> {
        self.with(name, |q| q.pop_record(name))
    }

    /// See [`ExpectationQueue::pop_optional_record`].
    ///
    /// # Errors
    /// Any call divergence for `name`.
    pub fn pop_optional_record<T: MockRecord>(&self, name: &str) -> Result<Option<T>> {
        self.with(name, |q| q.pop_optional_record(name))
    }

    /// See [`ExpectationQueue::pop_assert`].
    ///
    /// # Errors
    /// Any call divergence for `name`.
    pub fn pop_assert(&self, name: &str, actual: impl Into<Payload>) -> Result<()> {
        self.with(name, |q| q.pop_assert(name, actual))
    }

    /// See [`ExpectationQueue::pop_assert_record`].
    ///
    /// # Errors
    /// Any call divergence for `name`.
    pub fn pop_assert_record<T: MockRecord>(&self, name: &str, actual: &T) -> Result<()> {
        self.with(name, |q| q.pop_assert_record(name, actual))
    }

    /// Name of the entry at the head of the queue, if any.
    ///
    /// # Errors
    /// [`MockError::ConcurrentAccess`].
    pub fn front_name(&self) -> Result<Option<String>> {
        self.with("front_name", |q| Ok(q.front_name().map(str::to_string)))
    }

    /// Appends every entry of a script.
    ///
    /// # Errors
    /// Capacity or concurrent access errors.
    pub fn extend(&self, script: Script) -> Result<()> {
        self.with("script", |q| q.extend(script))
    }

    /// Loads a TOML script from disk and appends it.
    ///
    /// # Errors
    /// I/O, parse, capacity or concurrent access errors.
    pub fn load_script(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.extend(Script::load(path)?)
    }

    /// Discards pending entries; returns how many were dropped.
    ///
    /// # Errors
    /// [`MockError::ConcurrentAccess`].
    pub fn reset(&self) -> Result<usize> {
        self.with("reset", |q| Ok(q.reset()))
    }

    /// Teardown check.
    ///
    /// # Errors
    /// [`MockError::LeftoverExpectations`] or [`MockError::ConcurrentAccess`].
    pub fn drain(&self) -> Result<()> {
        self.with("drain", ExpectationQueue::drain)
    }

    /// Number of pending entries.
    ///
    /// # Errors
    /// [`MockError::ConcurrentAccess`].
    pub fn len(&self) -> Result<usize> {
        self.with("len", |q| Ok(q.len()))
    }

    /// Returns true if nothing is pending.
    ///
    /// # Errors
    /// [`MockError::ConcurrentAccess`].
    pub fn is_empty(&self) -> Result<bool> {
        self.with("is_empty", |q| Ok(q.is_empty()))
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}
