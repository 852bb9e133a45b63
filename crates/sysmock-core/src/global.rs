//! Process-wide expectation queue.
//!
//! Substitutes with fixed signatures cannot be handed a queue, so they reach
//! for this singleton instead. Tests that script it must hold a [`Session`]:
//! the session serializes them, starts from an empty queue and checks at the
//! end that every scripted call happened.
//!
//! ```rust
//! use sysmock_core::global;
//!
//! let session = global::session();
//! global::push("close(fd)", 3i32)?;
//! global::pop_assert("close(fd)", 3i32)?;
//! session.finish()?;
//! # Ok::<(), sysmock_core::MockError>(())
//! ```
//!
//! Third-party code that calls a substituted entry point while the queue is
//! locked cannot desynchronize it: the nested access fails with
//! [`MockError::ConcurrentAccess`].

use parking_lot::{Mutex, MutexGuard, const_mutex};
use tracing::{debug, warn};

use crate::config::QueueConfig;
use crate::error::{MockError, Result, abort};
use crate::payload::{FromPayload, MockRecord, Payload};
use crate::queue::ExpectationQueue;

static QUEUE: Mutex<ExpectationQueue> = const_mutex(ExpectationQueue::new());

static SESSION: Mutex<()> = const_mutex(());

/// Runs `f` on the global queue.
///
/// # Errors
/// [`MockError::ConcurrentAccess`] if the queue is already locked.
pub fn with_queue<R>(name: &str, f: impl FnOnce(&mut ExpectationQueue) -> Result<R>) -> Result<R> {
    let Some(mut queue) = QUEUE.try_lock() else {
        return Err(MockError::ConcurrentAccess {
            name: name.to_string(),
        });
    };
    f(&mut queue)
}

/// Appends an expectation to the global queue.
///
/// # Errors
/// See [`ExpectationQueue::push`].
pub fn push(name: &str, payload: impl Into<Payload>) -> Result<()> {
    with_queue(name, |q| q.push(name, payload))
}

/// Appends a struct-by-value expectation to the global queue.
///
/// # Errors
/// See [`ExpectationQueue::push_record`].
pub fn push_record<T: MockRecord>(name: &str, value: &T) -> Result<()> {
    with_queue(name, |q| q.push_record(name, value))
}

/// Pops the head of the global queue into `T`.
///
/// # Errors
/// See [`ExpectationQueue::pop`].
pub fn pop<T: FromPayload>(name: &str) -> Result<T> {
    with_queue(name, |q| q.pop(name))
}

/// Pops the head of the global queue and compares it with `actual`.
///
/// # Errors
/// See [`ExpectationQueue::pop_assert`].
pub fn pop_assert(name: &str, actual: impl Into<Payload>) -> Result<()> {
    with_queue(name, |q| q.pop_assert(name, actual))
}

/// Discards all pending entries; returns how many were dropped.
///
/// # Errors
/// [`MockError::ConcurrentAccess`] if the queue is locked.
pub fn reset() -> Result<usize> {
    with_queue("reset", |q| Ok(q.reset()))
}

/// Checks that every scripted entry was consumed.
///
/// # Errors
/// [`MockError::LeftoverExpectations`] or [`MockError::ConcurrentAccess`].
pub fn drain() -> Result<()> {
    with_queue("drain", ExpectationQueue::drain)
}

/// Number of pending entries.
///
/// # Errors
/// [`MockError::ConcurrentAccess`] if the queue is locked.
pub fn len() -> Result<usize> {
    with_queue("len", |q| Ok(q.len()))
}

/// Replaces the global queue configuration.
///
/// # Errors
/// Returns an error if the configuration is invalid or the queue is locked.
pub fn configure(config: QueueConfig) -> Result<()> {
    config.validate()?;
    with_queue("configure", |q| {
        q.set_config(config);
        Ok(())
    })
}

/// Starts a session with the default configuration.
///
/// Blocks until any other session has ended.
#[must_use]
pub fn session() -> Session {
    session_with(QueueConfig::new())
}

/// Starts a session with a custom configuration.
///
/// An invalid configuration is a fatal test setup error.
#[must_use]
pub fn session_with(config: QueueConfig) -> Session {
    let lock = SESSION.lock();
    let begin = config.validate().and_then(|()| {
        with_queue("session", |q| {
            q.reset();
            q.set_config(config);
            Ok(())
        })
    });
    if let Err(err) = begin {
        drop(lock);
        abort(&err);
    }
    debug!("expectation session started");
    Session {
        _lock: lock,
        finished: false,
    }
}

/// Exclusive use of the global queue for the duration of one test.
///
/// Dropping the session without [`finish`](Session::finish) still verifies
/// the queue and fails the test if expectations are left, unless the thread
/// is already unwinding from another failure.
#[must_use = "dropping the session ends it immediately"]
pub struct Session {
    _lock: MutexGuard<'static, ()>,
    finished: bool,
}

impl Session {
    /// Ends the session, reporting leftover expectations as an error.
    ///
    /// # Errors
    /// [`MockError::LeftoverExpectations`] if scripted calls never happened.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        drain()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match drain() {
            Ok(()) => debug!("expectation session ended"),
            Err(err) if std::thread::panicking() => {
                warn!(error = %err, "expectation session ended during unwind");
            }
            Err(err) => abort(&err),
        }
    }
}
