//! Production [`SystemOps`] backed by libc.

use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_ulong};
use std::net::SocketAddrV4;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicU64, Ordering};

use nix::errno::Errno;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::ops::SystemOps;
use crate::types::{MntStream, MountEntry, StatVfs};

/// Open `FILE *` from `setmntent`.
struct StreamPtr(NonNull<libc::FILE>);

// SAFETY: a stream is only dereferenced by libc while the registry lock is
// held, so it is never used from two threads at once.
unsafe impl Send for StreamPtr {}

/// Forwards every entry point to the host C library.
///
/// Mount table streams are kept in a registry and handed out as
/// [`MntStream`] handles; streams still open on drop are closed.
pub struct LinuxSystem {
    streams: Mutex<HashMap<u64, StreamPtr>>,
    next_stream: AtomicU64,
}

impl LinuxSystem {
    /// Creates a new instance with an empty stream registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            next_stream: AtomicU64::new(1),
        }
    }

    /// Number of mount table streams currently open.
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.streams.lock().len()
    }
}

impl Default for LinuxSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LinuxSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxSystem")
            .field("open_streams", &self.open_streams())
            .finish()
    }
}

/// Logs a failed call, leaving `errno` as the call set it.
fn traced<T: Copy + PartialOrd + Default>(call: &'static str, res: T) -> T {
    if res < T::default() {
        let errno = Errno::last();
        debug!(call, %errno, "system call failed");
        errno.set();
    }
    res
}

/// Copies a possibly-null C string out of libc storage.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string.
unsafe fn owned(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn sockaddr_in(dest: &SocketAddrV4) -> libc::sockaddr_in {
    libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: dest.port().to_be(),
        sin_addr: libc::in_addr {
            s_addr: u32::from_ne_bytes(dest.ip().octets()),
        },
        sin_zero: [0; 8],
    }
}

impl SystemOps for LinuxSystem {
    fn mount(
        &self,
        source: &CStr,
        target: &CStr,
        fstype: &CStr,
        flags: c_ulong,
        data: Option<&[u8]>,
    ) -> c_int {
        let data = data.map_or(ptr::null(), |d| d.as_ptr().cast());
        // SAFETY: all strings are NUL-terminated and outlive the call; data
        // is null or a live buffer.
        let res = unsafe {
            libc::mount(source.as_ptr(), target.as_ptr(), fstype.as_ptr(), flags, data)
        };
        traced("mount", res)
    }

    fn socket(&self, domain: c_int, ty: c_int, protocol: c_int) -> c_int {
        // SAFETY: plain integer arguments.
        let res = unsafe { libc::socket(domain, ty, protocol) };
        traced("socket", res)
    }

    fn ioctl(&self, fd: c_int, request: c_ulong, data: &mut [u8]) -> c_int {
        // SAFETY: data is a live, writable buffer. The caller picks a request
        // whose argument fits in it (e.g. a 40-byte ifreq).
        let res = unsafe { libc::ioctl(fd, request as _, data.as_mut_ptr()) };
        traced("ioctl", res)
    }

    fn sendto(&self, fd: c_int, buf: &[u8], flags: c_int, dest: &SocketAddrV4) -> isize {
        let addr = sockaddr_in(dest);
        // SAFETY: buf and addr are live for the call and the address length
        // matches the sockaddr_in passed.
        let res = unsafe {
            libc::sendto(
                fd,
                buf.as_ptr().cast(),
                buf.len(),
                flags,
                (&raw const addr).cast(),
                size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        traced("sendto", res)
    }

    fn open(&self, path: &CStr, flags: c_int) -> c_int {
        // SAFETY: path is NUL-terminated.
        let res = unsafe { libc::open(path.as_ptr(), flags) };
        traced("open", res)
    }

    fn close(&self, fd: c_int) -> c_int {
        // SAFETY: closing an fd has no memory safety requirements.
        let res = unsafe { libc::close(fd) };
        traced("close", res)
    }

    fn finit_module(&self, fd: c_int, params: &CStr, flags: c_int) -> c_int {
        // SAFETY: params is NUL-terminated; the kernel only reads it.
        let res = unsafe { libc::syscall(libc::SYS_finit_module, fd, params.as_ptr(), flags) };
        traced("finit_module", c_int::try_from(res).unwrap_or(-1))
    }

    fn setmntent(&self, filename: &CStr, mode: &CStr) -> Option<MntStream> {
        // SAFETY: both strings are NUL-terminated.
        let raw = unsafe { libc::setmntent(filename.as_ptr(), mode.as_ptr()) };
        let Some(file) = NonNull::new(raw) else {
            traced("setmntent", -1);
            return None;
        };

        let id = self.next_stream.fetch_add(1, Ordering::Relaxed);
        self.streams.lock().insert(id, StreamPtr(file));
        debug!(stream = id, ?filename, "mount table opened");
        MntStream::from_raw(id)
    }

    fn getmntent(&self, stream: MntStream) -> Option<MountEntry> {
        let streams = self.streams.lock();
        let file = streams.get(&stream.as_raw())?;

        // SAFETY: file came from setmntent and has not been closed; the
        // registry lock keeps other threads off it while the static entry
        // returned by getmntent is copied out.
        unsafe {
            let ent = libc::getmntent(file.0.as_ptr());
            if ent.is_null() {
                return None;
            }
            let ent = &*ent;
            Some(MountEntry {
                fsname: owned(ent.mnt_fsname),
                dir: owned(ent.mnt_dir),
                fstype: owned(ent.mnt_type),
                opts: owned(ent.mnt_opts),
                freq: ent.mnt_freq,
                passno: ent.mnt_passno,
            })
        }
    }

    fn endmntent(&self, stream: MntStream) -> c_int {
        let Some(file) = self.streams.lock().remove(&stream.as_raw()) else {
            warn!(stream = stream.as_raw(), "endmntent on unknown stream");
            Errno::EBADF.set();
            return -1;
        };
        // SAFETY: file came from setmntent and is removed from the registry,
        // so it is closed exactly once.
        unsafe { libc::endmntent(file.0.as_ptr()) }
    }

    fn statvfs(&self, path: &CStr, buf: &mut StatVfs) -> c_int {
        // SAFETY: statvfs is plain data; all-zero is a valid value.
        let mut raw: libc::statvfs = unsafe { std::mem::zeroed() };
        // SAFETY: path is NUL-terminated and raw is a live out-pointer.
        let res = unsafe { libc::statvfs(path.as_ptr(), &raw mut raw) };
        if res == 0 {
            *buf = StatVfs {
                bsize: u64::from(raw.f_bsize),
                frsize: u64::from(raw.f_frsize),
                blocks: u64::from(raw.f_blocks),
                bfree: u64::from(raw.f_bfree),
                bavail: u64::from(raw.f_bavail),
                files: u64::from(raw.f_files),
                ffree: u64::from(raw.f_ffree),
                favail: u64::from(raw.f_favail),
                fsid: u64::from(raw.f_fsid),
                flag: u64::from(raw.f_flag),
                namemax: u64::from(raw.f_namemax),
            };
        }
        traced("statvfs", res)
    }
}

impl Drop for LinuxSystem {
    fn drop(&mut self) {
        for (id, file) in self.streams.get_mut().drain() {
            debug!(stream = id, "closing leaked mount table stream");
            // SAFETY: every registered stream is open and owned here.
            unsafe {
                libc::endmntent(file.0.as_ptr());
            }
        }
    }
}
