//! Test double for [`SystemOps`].
//!
//! Every entry point is scripted as one queue entry per parameter, named
//! `<fn>(<param>)`, followed by the return value, named `<fn>() -> res`.
//! The `push_*` helpers queue a whole call; the trait methods pop it back,
//! asserting each parameter in declaration order. Nothing touches the host.
//!
//! Buffers the kernel writes back (the `ioctl` argument) can be scripted with
//! an extra `<fn>(<param>) -> out` entry right after the parameter.

use std::ffi::{CStr, c_int, c_ulong};
use std::net::SocketAddrV4;

use sysmock_core::{FromPayload, MockError, MockQueue, MockRecord, Payload, abort};
use tracing::trace;

use crate::ops::SystemOps;
use crate::types::{IfReq, MntStream, MountEntry, StatVfs};

const IOCTL_OUT: &str = "ioctl(data) -> out";

/// Scripted [`SystemOps`] implementation.
///
/// Any divergence from the script aborts the running test with the queue's
/// diagnostic.
///
/// ```rust
/// use sysmock_sys::{MockSystem, SystemOps};
///
/// let sys = MockSystem::new();
/// sys.push_close(4, 0);
///
/// assert_eq!(sys.close(4), 0);
/// sys.verify();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSystem {
    queue: MockQueue,
}

impl MockSystem {
    /// Creates a mock over a private queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_queue(MockQueue::new())
    }

    /// Creates a mock over an existing queue handle.
    #[must_use]
    pub const fn with_queue(queue: MockQueue) -> Self {
        Self { queue }
    }

    /// Creates a mock over the process-wide queue.
    #[must_use]
    pub const fn global() -> Self {
        Self::with_queue(MockQueue::global())
    }

    /// Underlying queue, for scripting entries by hand.
    #[must_use]
    pub const fn queue(&self) -> &MockQueue {
        &self.queue
    }

    /// Asserts that every scripted call happened.
    ///
    /// # Panics
    /// If expectations are left over.
    pub fn verify(&self) {
        if let Err(e) = self.queue.drain() {
            abort(&e);
        }
    }

    fn push(&self, name: &str, payload: impl Into<Payload>) {
        if let Err(e) = self.queue.push(name, payload) {
            abort(&e);
        }
    }

    fn push_record<T: MockRecord>(&self, name: &str, value: &T) {
        if let Err(e) = self.queue.push_record(name, value) {
            abort(&e);
        }
    }

    fn check(&self, name: &str, actual: impl Into<Payload>) {
        if let Err(e) = self.queue.pop_assert(name, actual) {
            abort(&e);
        }
    }

    fn check_record<T: MockRecord>(&self, name: &str, actual: &T) {
        if let Err(e) = self.queue.pop_assert_record(name, actual) {
            abort(&e);
        }
    }

    fn expect<T: FromPayload>(&self, name: &str) -> T {
        self.queue.pop(name).unwrap_or_else(|e| abort(&e))
    }

    fn front_is(&self, name: &str) -> bool {
        let front = self.queue.front_name().unwrap_or_else(|e| abort(&e));
        front.as_deref() == Some(name)
    }

    /// Scripts one [`SystemOps::mount`] call.
    pub fn push_mount(
        &self,
        source: &str,
        target: &str,
        fstype: &str,
        flags: c_ulong,
        data: Option<&[u8]>,
        res: c_int,
    ) {
        self.push("mount(source)", source);
        self.push("mount(target)", target);
        self.push("mount(fstype)", fstype);
        self.push("mount(flags)", u64::from(flags));
        self.push("mount(data)", data);
        self.push("mount() -> res", res);
    }

    /// Scripts one [`SystemOps::socket`] call.
    pub fn push_socket(&self, domain: c_int, ty: c_int, protocol: c_int, res: c_int) {
        self.push("socket(domain)", domain);
        self.push("socket(type)", ty);
        self.push("socket(protocol)", protocol);
        self.push("socket() -> res", res);
    }

    /// Scripts one [`SystemOps::ioctl`] call.
    pub fn push_ioctl(&self, fd: c_int, request: c_ulong, data: &[u8], res: c_int) {
        self.push("ioctl(fd)", fd);
        self.push("ioctl(request)", u64::from(request));
        self.push("ioctl(data)", data);
        self.push("ioctl() -> res", res);
    }

    /// Scripts a successful interface `ioctl` carrying `ifreq`.
    pub fn push_ioctl_ifreq_ok(&self, fd: c_int, request: c_ulong, ifreq: &IfReq) {
        self.push_ioctl(fd, request, ifreq.as_bytes(), 0);
    }

    /// Scripts one [`SystemOps::ioctl`] call that writes `out` back into the
    /// caller's buffer.
    pub fn push_ioctl_out(
        &self,
        fd: c_int,
        request: c_ulong,
        data: &[u8],
        out: &[u8],
        res: c_int,
    ) {
        self.push("ioctl(fd)", fd);
        self.push("ioctl(request)", u64::from(request));
        self.push("ioctl(data)", data);
        self.push(IOCTL_OUT, out);
        self.push("ioctl() -> res", res);
    }

    /// Scripts a successful interface `ioctl` that answers `ifreq` with
    /// `reply`, e.g. `SIOCGIFINDEX` filling in the index.
    pub fn push_ioctl_ifreq_reply(
        &self,
        fd: c_int,
        request: c_ulong,
        ifreq: &IfReq,
        reply: &IfReq,
    ) {
        self.push_ioctl_out(fd, request, ifreq.as_bytes(), reply.as_bytes(), 0);
    }

    /// Scripts one [`SystemOps::sendto`] call.
    pub fn push_sendto(
        &self,
        fd: c_int,
        buf: &[u8],
        flags: c_int,
        dest: &SocketAddrV4,
        res: isize,
    ) {
        self.push("sendto(fd)", fd);
        self.push("sendto(buf)", buf);
        self.push("sendto(len)", buf.len());
        self.push("sendto(flags)", flags);
        self.push_record("sendto(dest)", dest);
        self.push("sendto() -> res", res);
    }

    /// Scripts one [`SystemOps::open`] call.
    pub fn push_open(&self, path: &str, flags: c_int, res: c_int) {
        self.push("open(path)", path);
        self.push("open(flags)", flags);
        self.push("open() -> res", res);
    }

    /// Scripts one [`SystemOps::close`] call.
    pub fn push_close(&self, fd: c_int, res: c_int) {
        self.push("close(fd)", fd);
        self.push("close() -> res", res);
    }

    /// Scripts one [`SystemOps::finit_module`] call.
    pub fn push_finit_module(&self, fd: c_int, params: &str, flags: c_int, res: c_int) {
        self.push("finit_module(fd)", fd);
        self.push("finit_module(params)", params);
        self.push("finit_module(flags)", flags);
        self.push("finit_module() -> res", res);
    }

    /// Scripts one [`SystemOps::setmntent`] call.
    pub fn push_setmntent(&self, filename: &str, mode: &str, res: Option<MntStream>) {
        self.push("setmntent(filename)", filename);
        self.push("setmntent(type)", mode);
        self.push("setmntent() -> res", res.map_or(0, MntStream::as_raw));
    }

    /// Scripts one [`SystemOps::getmntent`] call; `None` ends the table.
    pub fn push_getmntent(&self, stream: MntStream, res: Option<&MountEntry>) {
        self.push("getmntent(stream)", stream.as_raw());
        match res {
            Some(entry) => self.push_record("getmntent() -> res", entry),
            None => self.push("getmntent() -> res", Payload::Absent),
        }
    }

    /// Scripts one [`SystemOps::endmntent`] call.
    pub fn push_endmntent(&self, stream: MntStream, res: c_int) {
        self.push("endmntent(stream)", stream.as_raw());
        self.push("endmntent() -> res", res);
    }

    /// Scripts one [`SystemOps::statvfs`] call; `buf` is what the caller
    /// receives.
    pub fn push_statvfs(&self, path: &str, buf: &StatVfs, res: c_int) {
        self.push("statvfs(path)", path);
        self.push_record("statvfs(buf)", buf);
        self.push("statvfs() -> res", res);
    }
}

impl SystemOps for MockSystem {
    fn mount(
        &self,
        source: &CStr,
        target: &CStr,
        fstype: &CStr,
        flags: c_ulong,
        data: Option<&[u8]>,
    ) -> c_int {
        trace!(?source, ?target, "mount");
        self.check("mount(source)", source);
        self.check("mount(target)", target);
        self.check("mount(fstype)", fstype);
        self.check("mount(flags)", u64::from(flags));
        self.check("mount(data)", data);
        self.expect("mount() -> res")
    }

    fn socket(&self, domain: c_int, ty: c_int, protocol: c_int) -> c_int {
        trace!(domain, ty, protocol, "socket");
        self.check("socket(domain)", domain);
        self.check("socket(type)", ty);
        self.check("socket(protocol)", protocol);
        self.expect("socket() -> res")
    }

    fn ioctl(&self, fd: c_int, request: c_ulong, data: &mut [u8]) -> c_int {
        trace!(fd, request, "ioctl");
        self.check("ioctl(fd)", fd);
        self.check("ioctl(request)", u64::from(request));
        self.check("ioctl(data)", &*data);
        if self.front_is(IOCTL_OUT) {
            let out: Vec<u8> = self.expect(IOCTL_OUT);
            if out.len() != data.len() {
                abort(&MockError::SizeMismatch {
                    name: IOCTL_OUT.to_string(),
                    queued: format!("bytes ({} bytes)", out.len()),
                    requested: format!("bytes ({} bytes)", data.len()),
                });
            }
            data.copy_from_slice(&out);
        }
        self.expect("ioctl() -> res")
    }

    fn sendto(&self, fd: c_int, buf: &[u8], flags: c_int, dest: &SocketAddrV4) -> isize {
        trace!(fd, len = buf.len(), %dest, "sendto");
        self.check("sendto(fd)", fd);
        self.check("sendto(buf)", buf);
        self.check("sendto(len)", buf.len());
        self.check("sendto(flags)", flags);
        self.check_record("sendto(dest)", dest);
        self.expect("sendto() -> res")
    }

    fn open(&self, path: &CStr, flags: c_int) -> c_int {
        trace!(?path, flags, "open");
        self.check("open(path)", path);
        self.check("open(flags)", flags);
        self.expect("open() -> res")
    }

    fn close(&self, fd: c_int) -> c_int {
        trace!(fd, "close");
        self.check("close(fd)", fd);
        self.expect("close() -> res")
    }

    fn finit_module(&self, fd: c_int, params: &CStr, flags: c_int) -> c_int {
        trace!(fd, ?params, flags, "finit_module");
        self.check("finit_module(fd)", fd);
        self.check("finit_module(params)", params);
        self.check("finit_module(flags)", flags);
        self.expect("finit_module() -> res")
    }

    fn setmntent(&self, filename: &CStr, mode: &CStr) -> Option<MntStream> {
        trace!(?filename, "setmntent");
        self.check("setmntent(filename)", filename);
        self.check("setmntent(type)", mode);
        MntStream::from_raw(self.expect("setmntent() -> res"))
    }

    fn getmntent(&self, stream: MntStream) -> Option<MountEntry> {
        trace!(stream = stream.as_raw(), "getmntent");
        self.check("getmntent(stream)", stream.as_raw());
        self.queue
            .pop_optional_record("getmntent() -> res")
            .unwrap_or_else(|e| abort(&e))
    }

    fn endmntent(&self, stream: MntStream) -> c_int {
        trace!(stream = stream.as_raw(), "endmntent");
        self.check("endmntent(stream)", stream.as_raw());
        self.expect("endmntent() -> res")
    }

    fn statvfs(&self, path: &CStr, buf: &mut StatVfs) -> c_int {
        trace!(?path, "statvfs");
        self.check("statvfs(path)", path);
        *buf = self
            .queue
            .pop_record("statvfs(buf)")
            .unwrap_or_else(|e| abort(&e));
        self.expect("statvfs() -> res")
    }
}
