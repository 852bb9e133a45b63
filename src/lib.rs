//! sysmock: ordered call-expectation mocking for system entry points.
//!
//! Tests script the mount, socket, ioctl, module and mount-table calls they
//! expect, in order, and hand a [`MockSystem`](sys::MockSystem) to the code
//! under test. Production builds pass [`LinuxSystem`](sys::LinuxSystem)
//! through the same [`SystemOps`](sys::SystemOps) seam.
//!
//! # Quick Start
//!
//! ```rust
//! use sysmock::prelude::*;
//!
//! fn reopen(sys: &impl SystemOps, fd: i32) -> std::io::Result<i32> {
//!     cvt(sys.close(fd))?;
//!     cvt(sys.open(c"/dev/null", 0))
//! }
//!
//! let sys = MockSystem::new();
//! sys.push_close(3, 0);
//! sys.push_open("/dev/null", 0, 3);
//!
//! assert_eq!(reopen(&sys, 3).unwrap(), 3);
//! sys.verify();
//! ```

pub use sysmock_core as core;
pub use sysmock_sys as sys;

/// Prelude module for common imports.
pub mod prelude {
    pub use sysmock_core::{
        ExpectationQueue, MockError, MockQueue, Payload, QueueConfig, Script, global,
    };
    #[cfg(target_os = "linux")]
    pub use sysmock_sys::LinuxSystem;
    pub use sysmock_sys::{IfReq, MntStream, MockSystem, MountEntry, StatVfs, SystemOps, cvt};
}
