//! The ordered expectation queue.
//!
//! Tests push one entry per parameter plus one for the return value of every
//! call they expect, then hand control to the code under test. Substitutes pop
//! the entries back in the same order: parameters through [`pop_assert`],
//! output parameters and return values through [`pop`].
//!
//! [`pop_assert`]: ExpectationQueue::pop_assert
//! [`pop`]: ExpectationQueue::pop

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::QueueConfig;
use crate::diff;
use crate::error::{MockError, Result};
use crate::payload::{FromPayload, MockRecord, Payload};
use crate::script::Script;

/// One named expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Parameter or return value label, e.g. `mount(source)`.
    pub name: String,
    /// Owned copy of the expected value.
    pub payload: Payload,
}

/// FIFO queue of expectations.
#[derive(Debug)]
pub struct ExpectationQueue {
    entries: VecDeque<Entry>,
    config: QueueConfig,
    pushed: u64,
    popped: u64,
}

impl ExpectationQueue {
    /// Creates an empty queue with the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_config(QueueConfig::new())
    }

    /// Creates an empty queue with the given configuration.
    #[must_use]
    pub const fn with_config(config: QueueConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            config,
            pushed: 0,
            popped: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Replaces the configuration. Pending entries are kept.
    pub fn set_config(&mut self, config: QueueConfig) {
        self.config = config;
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries pushed since creation or the last reset.
    #[must_use]
    pub const fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Total entries popped since creation or the last reset.
    #[must_use]
    pub const fn popped(&self) -> u64 {
        self.popped
    }

    /// Names of the pending entries, head first.
    #[must_use]
    pub fn pending_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Name of the head entry, without removing it.
    #[must_use]
    pub fn front_name(&self) -> Option<&str> {
        self.entries.front().map(|e| e.name.as_str())
    }

    /// Appends an expectation at the tail.
    ///
    /// # Errors
    /// Returns [`MockError::CapacityExceeded`] if the queue is full.
    pub fn push(&mut self, name: impl Into<String>, payload: impl Into<Payload>) -> Result<()> {
        let name = name.into();
        if self.entries.len() >= self.config.capacity() {
            return Err(MockError::CapacityExceeded {
                name,
                capacity: self.config.capacity(),
            });
        }

        let payload = payload.into();
        trace!(entry = %name, value = %payload, "push");
        self.entries.push_back(Entry { name, payload });
        self.pushed += 1;
        Ok(())
    }

    /// Appends a struct-by-value expectation.
    ///
    /// # Errors
    /// Returns an error if the record cannot be encoded or the queue is full.
    pub fn push_record<T: MockRecord>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        let payload = Payload::record(value)?;
        self.push(name, payload)
    }

    /// Appends every entry of a script, in order.
    ///
    /// # Errors
    /// Returns [`MockError::CapacityExceeded`] if the script does not fit.
    pub fn extend(&mut self, script: Script) -> Result<()> {
        debug!(entries = script.len(), "loading expectation script");
        for entry in script.into_entries() {
            self.push(entry.name, entry.payload)?;
        }
        Ok(())
    }

    /// Removes the head entry and returns its raw payload.
    ///
    /// # Errors
    /// - [`MockError::UnexpectedCall`] if the queue is empty
    /// - [`MockError::OutOfOrder`] if strict naming is on and the head entry
    ///   has another name
    pub fn pop_payload(&mut self, name: &str) -> Result<Payload> {
        let Some(head) = self.entries.front() else {
            return Err(MockError::unexpected_call(name));
        };
        if self.config.strict_names() && head.name != name {
            return Err(MockError::OutOfOrder {
                queued: head.name.clone(),
                requested: name.to_string(),
            });
        }

        let Some(entry) = self.entries.pop_front() else {
            return Err(MockError::unexpected_call(name));
        };
        self.popped += 1;
        trace!(entry = %name, value = %entry.payload, "pop");
        Ok(entry.payload)
    }

    /// Removes the head entry and converts it into `T`.
    ///
    /// Used for return values and output parameters, where there is no
    /// actual value to compare against.
    ///
    /// # Errors
    /// Everything [`pop_payload`](Self::pop_payload) returns, plus
    /// [`MockError::SizeMismatch`] when the queued kind does not fit `T`.
    pub fn pop<T: FromPayload>(&mut self, name: &str) -> Result<T> {
        let payload = self.pop_payload(name)?;
        let queued = payload.shape();
        T::from_payload(payload).ok_or_else(|| MockError::SizeMismatch {
            name: name.to_string(),
            queued,
            requested: T::requested_shape(),
        })
    }

    /// Removes the head entry and decodes it as record `T`.
    ///
    /// # Errors
    /// [`MockError::SizeMismatch`] if the head is not a `T` record.
    pub fn pop_record<T: MockRecord>(&mut self, name: &str) -> Result<T> {
        self.pop_optional_record(name)?
            .ok_or_else(|| MockError::SizeMismatch {
                name: name.to_string(),
                queued: "absent (0 bytes)".to_string(),
                requested: format!("record {}", T::TYPE_NAME),
            })
    }

    /// Removes the head entry as either a `T` record or a null pointer.
    ///
    /// # Errors
    /// [`MockError::SizeMismatch`] if the head is neither.
    pub fn pop_optional_record<T: MockRecord>(&mut self, name: &str) -> Result<Option<T>> {
        let payload = self.pop_payload(name)?;
        if matches!(payload, Payload::Absent) {
            return Ok(None);
        }

        let queued = payload.shape();
        match payload.into_record::<T>()? {
            Some(value) => Ok(Some(value)),
            None => Err(MockError::SizeMismatch {
                name: name.to_string(),
                queued,
                requested: format!("record {}", T::TYPE_NAME),
            }),
        }
    }

    /// Removes the head entry and checks it against the actual argument.
    ///
    /// # Errors
    /// Everything [`pop_payload`](Self::pop_payload) returns, plus
    /// [`MockError::SizeMismatch`] for a different kind or size and
    /// [`MockError::ArgumentMismatch`] for different content.
    pub fn pop_assert(&mut self, name: &str, actual: impl Into<Payload>) -> Result<()> {
        let actual = actual.into();
        let expected = self.pop_payload(name)?;

        if !expected.same_shape(&actual) {
            return Err(MockError::SizeMismatch {
                name: name.to_string(),
                queued: expected.shape(),
                requested: actual.shape(),
            });
        }
        if !expected.matches(&actual) {
            return Err(MockError::ArgumentMismatch {
                name: name.to_string(),
                diff: diff::describe(&expected, &actual, self.config.hexdump_width()),
            });
        }
        Ok(())
    }

    /// Checks a struct-by-value argument.
    ///
    /// # Errors
    /// See [`pop_assert`](Self::pop_assert).
    pub fn pop_assert_record<T: MockRecord>(&mut self, name: &str, actual: &T) -> Result<()> {
        let actual = Payload::record(actual)?;
        self.pop_assert(name, actual)
    }

    /// Discards all pending entries and the counters.
    ///
    /// Returns the number of entries discarded.
    pub fn reset(&mut self) -> usize {
        let discarded = self.entries.len();
        if discarded > 0 {
            warn!(
                discarded,
                pending = ?self.pending_names(),
                "reset discarded pending expectations"
            );
        }
        self.entries.clear();
        self.pushed = 0;
        self.popped = 0;
        discarded
    }

    /// Teardown check: the queue must be empty.
    ///
    /// The queue is emptied either way.
    ///
    /// # Errors
    /// [`MockError::LeftoverExpectations`] naming every pending entry.
    pub fn drain(&mut self) -> Result<()> {
        debug!(pushed = self.pushed, popped = self.popped, "drain");
        if self.entries.is_empty() {
            return Ok(());
        }

        let names: Vec<String> = self.entries.drain(..).map(|e| e.name).collect();
        Err(MockError::LeftoverExpectations {
            count: names.len(),
            names,
        })
    }
}

impl Default for ExpectationQueue {
    fn default() -> Self {
        Self::new()
    }
}
