// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # sysmock-sys
//!
//! The seam between code that manages mounts, sockets, network interfaces
//! and kernel modules, and the host it runs on.
//!
//! Code under test takes a [`SystemOps`] implementation instead of calling
//! libc directly:
//!
//! - [`LinuxSystem`] forwards to the real calls (Linux only)
//! - [`MockSystem`] replays a script from an expectation queue and fails the
//!   test on the first call that diverges from it
//!
//! ## Example
//!
//! ```rust
//! use std::io;
//! use sysmock_sys::{MockSystem, SystemOps, cvt};
//!
//! fn mount_proc(sys: &impl SystemOps) -> io::Result<()> {
//!     cvt(sys.mount(c"proc", c"/proc", c"proc", 0, None))?;
//!     Ok(())
//! }
//!
//! let sys = MockSystem::new();
//! sys.push_mount("proc", "/proc", "proc", 0, None, 0);
//!
//! mount_proc(&sys).unwrap();
//! sys.verify();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
mod linux;
mod mock;
mod ops;
pub mod types;

#[cfg(target_os = "linux")]
pub use linux::LinuxSystem;
pub use mock::MockSystem;
pub use ops::{RawStatus, SystemOps, cvt};
pub use types::{IFNAMSIZ, IFREQ_SIZE, IfReq, MntStream, MountEntry, StatVfs};
