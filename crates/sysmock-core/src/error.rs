//! Error types for sysmock-core.
//!
//! Every divergence between the scripted expectations and the calls that
//! actually happen is a [`MockError`]. None of them are recoverable: a test
//! double that hits one hands it to [`abort`], which fails the running test.

/// Result type alias for expectation queue operations.
pub type Result<T> = std::result::Result<T, MockError>;

/// Errors raised by the expectation queue.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// The code under test made a call nobody scripted (pop on empty queue).
    #[error("unexpected call: no expectation queued for {name}")]
    UnexpectedCall {
        /// Entry name the caller asked for.
        name: String,
    },

    /// The head of the queue belongs to a different parameter or call.
    #[error("out of order call: queue head is {queued}, but {requested} was requested")]
    OutOfOrder {
        /// Name of the entry at the head of the queue.
        queued: String,
        /// Name the caller asked for.
        requested: String,
    },

    /// The actual argument differs from the queued one.
    #[error("argument mismatch for {name}:\n{diff}")]
    ArgumentMismatch {
        /// Entry name.
        name: String,
        /// Rendered expected/actual comparison.
        diff: String,
    },

    /// The queued payload has a different kind or size than requested.
    #[error("size mismatch for {name}: queued {queued}, requested {requested}")]
    SizeMismatch {
        /// Entry name.
        name: String,
        /// Kind and size of the queued payload.
        queued: String,
        /// Kind and size the caller expected.
        requested: String,
    },

    /// Push past the configured queue capacity.
    #[error("expectation queue full: cannot push {name} (capacity {capacity})")]
    CapacityExceeded {
        /// Entry name that did not fit.
        name: String,
        /// Configured capacity.
        capacity: usize,
    },

    /// The queue still held expectations at teardown.
    #[error("{count} expected call(s) never happened: {}", .names.join(", "))]
    LeftoverExpectations {
        /// Number of pending entries.
        count: usize,
        /// Names of the pending entries, head first.
        names: Vec<String>,
    },

    /// The queue was already locked when an entry was requested.
    ///
    /// Happens when a substitute reenters the queue (for example through
    /// third-party code calling a mocked entry point) or when two threads
    /// share one queue.
    #[error("concurrent access: expectation queue busy while handling {name}")]
    ConcurrentAccess {
        /// Entry name being pushed or popped.
        name: String,
    },

    /// A record payload could not be encoded or decoded.
    #[error("record error for {type_name}: {reason}")]
    Record {
        /// Record type name.
        type_name: String,
        /// Underlying serde error.
        reason: String,
    },

    /// Invalid queue configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid expectation script.
    #[error("script error: {0}")]
    Script(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MockError {
    /// Creates an unexpected call error.
    #[must_use]
    pub fn unexpected_call(name: impl Into<String>) -> Self {
        Self::UnexpectedCall { name: name.into() }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a script error.
    #[must_use]
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    /// Creates a record encoding error.
    #[must_use]
    pub fn record(type_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Record {
            type_name: type_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the entry name this error is about, if any.
    #[must_use]
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::UnexpectedCall { name }
            | Self::ArgumentMismatch { name, .. }
            | Self::SizeMismatch { name, .. }
            | Self::CapacityExceeded { name, .. }
            | Self::ConcurrentAccess { name } => Some(name),
            Self::OutOfOrder { requested, .. } => Some(requested),
            Self::LeftoverExpectations { names, .. } => names.first().map(String::as_str),
            Self::Record { .. } | Self::Config(_) | Self::Script(_) | Self::Io(_) => None,
        }
    }

    /// Returns true if the error describes a call that diverged from the
    /// script (as opposed to a setup problem).
    #[must_use]
    pub const fn is_call_divergence(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedCall { .. }
                | Self::OutOfOrder { .. }
                | Self::ArgumentMismatch { .. }
                | Self::SizeMismatch { .. }
                | Self::LeftoverExpectations { .. }
        )
    }
}

/// Fails the current test with the diagnostic for `err`.
///
/// Test doubles call this from entry points whose signatures cannot carry a
/// `Result`.
#[track_caller]
#[allow(clippy::panic)]
pub fn abort(err: &MockError) -> ! {
    tracing::error!(error = %err, "mock expectation failed");
    panic!("{err}");
}
