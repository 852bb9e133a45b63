// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # sysmock-core
//!
//! Ordered call-expectation queue for testing code that talks to the kernel.
//!
//! A test scripts the calls it expects, one named entry per parameter plus
//! one for the return value, then runs the code under test against a test
//! double. The double pops the entries back in order: parameters are checked
//! against the actual arguments, return values and output parameters are
//! handed back to the caller. Any divergence fails the test on the spot.
//!
//! - [`ExpectationQueue`]: the FIFO itself
//! - [`MockQueue`]: cloneable handle for test doubles (private or global)
//! - [`global`]: the process-wide queue and its [`Session`](global::Session)
//! - [`Payload`]: typed values with C sizes
//! - [`Script`]: expectations loaded from TOML
//!
//! ## Example
//!
//! ```rust
//! use sysmock_core::{ExpectationQueue, MockError};
//!
//! let mut queue = ExpectationQueue::new();
//! queue.push("x", "abc")?;
//! queue.push("res", 5i32)?;
//!
//! queue.pop_assert("x", "abc")?;
//! let res: i32 = queue.pop("res")?;
//! assert_eq!(res, 5);
//!
//! assert!(matches!(
//!     queue.pop::<i32>("extra"),
//!     Err(MockError::UnexpectedCall { .. })
//! ));
//! # Ok::<(), MockError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod diff;
pub mod error;
pub mod global;
pub mod handle;
pub mod payload;
pub mod queue;
pub mod script;

pub use config::{QueueConfig, QueueConfigBuilder};
pub use error::{MockError, Result, abort};
pub use handle::MockQueue;
pub use payload::{FromPayload, MockRecord, Payload};
pub use queue::{Entry, ExpectationQueue};
pub use script::{Script, ScriptEntry};
