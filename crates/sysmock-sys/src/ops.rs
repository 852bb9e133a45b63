//! The system operations seam.

use std::ffi::{CStr, c_int, c_ulong};
use std::io;
use std::net::SocketAddrV4;

use crate::types::{MntStream, MountEntry, StatVfs};

/// Kernel and libc entry points used by code under test.
///
/// Methods keep the raw calling convention: a negative status means failure
/// and the error detail is left in `errno` by the implementation. Use [`cvt`]
/// to turn a status into an [`io::Result`].
///
/// Production code takes `&impl SystemOps` (or `&dyn SystemOps`) and runs
/// against [`LinuxSystem`](crate::LinuxSystem); tests hand it a
/// [`MockSystem`](crate::MockSystem) instead.
pub trait SystemOps {
    /// `mount(2)`. `data` is the filesystem-specific option block, if any.
    fn mount(
        &self,
        source: &CStr,
        target: &CStr,
        fstype: &CStr,
        flags: c_ulong,
        data: Option<&[u8]>,
    ) -> c_int;

    /// `socket(2)`.
    fn socket(&self, domain: c_int, ty: c_int, protocol: c_int) -> c_int;

    /// `ioctl(2)` with a pointer argument, e.g. an [`IfReq`](crate::IfReq).
    ///
    /// `data` is both input and output.
    fn ioctl(&self, fd: c_int, request: c_ulong, data: &mut [u8]) -> c_int;

    /// `sendto(2)` towards an IPv4 destination.
    fn sendto(&self, fd: c_int, buf: &[u8], flags: c_int, dest: &SocketAddrV4) -> isize;

    /// `open(2)` without `O_CREAT`.
    fn open(&self, path: &CStr, flags: c_int) -> c_int;

    /// `close(2)`.
    fn close(&self, fd: c_int) -> c_int;

    /// `finit_module(2)`.
    fn finit_module(&self, fd: c_int, params: &CStr, flags: c_int) -> c_int;

    /// `setmntent(3)`. `None` is the null stream.
    fn setmntent(&self, filename: &CStr, mode: &CStr) -> Option<MntStream>;

    /// `getmntent(3)`. `None` at end of table or on error.
    fn getmntent(&self, stream: MntStream) -> Option<MountEntry>;

    /// `endmntent(3)`.
    fn endmntent(&self, stream: MntStream) -> c_int;

    /// `statvfs(3)`. `buf` is output only.
    fn statvfs(&self, path: &CStr, buf: &mut StatVfs) -> c_int;
}

/// Signed status returned by a raw entry point (`int`, `long`, `ssize_t`).
pub trait RawStatus: Copy {
    /// Returns true if the status reports a failure.
    fn is_failure(self) -> bool;
}

macro_rules! impl_raw_status {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RawStatus for $ty {
                fn is_failure(self) -> bool {
                    self < 0
                }
            }
        )*
    };
}

impl_raw_status!(i32, i64, isize);

/// Converts a raw status into an [`io::Result`].
///
/// # Errors
/// The last OS error if `res` is negative.
pub fn cvt<T: RawStatus>(res: T) -> io::Result<T> {
    if res.is_failure() {
        Err(io::Error::last_os_error())
    } else {
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvt_passes_non_negative() {
        assert_eq!(cvt(0).unwrap(), 0);
        assert_eq!(cvt(7).unwrap(), 7);
    }

    #[test]
    fn test_cvt_negative_is_error() {
        assert!(cvt(-1).is_err());
    }

    #[test]
    fn test_cvt_accepts_ssize_t() {
        assert_eq!(cvt(12isize).unwrap(), 12);
        assert!(cvt(-1isize).is_err());
        assert_eq!(cvt(5i64).unwrap(), 5);
    }
}
