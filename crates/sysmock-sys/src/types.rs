//! Plain data types crossing the system-call seam.
//!
//! These mirror the kernel and libc structures the entry points exchange,
//! in owned Rust form so they can be scripted and compared.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use sysmock_core::MockRecord;

/// Maximum interface name length including the terminator.
pub const IFNAMSIZ: usize = 16;

/// Size of `struct ifreq` on Linux.
pub const IFREQ_SIZE: usize = 40;

const IFR_DATA: usize = IFNAMSIZ;

/// `struct ifreq`, held as its raw bytes.
///
/// The union after the name is exposed through typed accessors for the
/// members the network helpers use (`ifr_flags`, `ifr_ifindex`, `ifr_mtu`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IfReq {
    bytes: [u8; IFREQ_SIZE],
}

impl IfReq {
    /// Creates a request for the named interface.
    ///
    /// Names longer than `IFNAMSIZ - 1` bytes are truncated.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; IFREQ_SIZE];
        let len = name.len().min(IFNAMSIZ - 1);
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self { bytes }
    }

    /// Wraps raw bytes returned by the kernel.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; IFREQ_SIZE]) -> Self {
        Self { bytes }
    }

    /// Interface name up to the first NUL.
    #[must_use]
    pub fn name(&self) -> String {
        let end = self.bytes[..IFNAMSIZ]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(IFNAMSIZ);
        String::from_utf8_lossy(&self.bytes[..end]).into_owned()
    }

    /// `ifr_flags`.
    #[must_use]
    pub fn flags(&self) -> i16 {
        i16::from_ne_bytes([self.bytes[IFR_DATA], self.bytes[IFR_DATA + 1]])
    }

    /// Sets `ifr_flags`.
    #[must_use]
    pub fn with_flags(mut self, flags: i16) -> Self {
        self.bytes[IFR_DATA..IFR_DATA + 2].copy_from_slice(&flags.to_ne_bytes());
        self
    }

    /// `ifr_ifindex`.
    #[must_use]
    pub fn ifindex(&self) -> i32 {
        self.read_i32()
    }

    /// Sets `ifr_ifindex`.
    #[must_use]
    pub fn with_ifindex(self, index: i32) -> Self {
        self.write_i32(index)
    }

    /// `ifr_mtu`.
    #[must_use]
    pub fn mtu(&self) -> i32 {
        self.read_i32()
    }

    /// Sets `ifr_mtu`.
    #[must_use]
    pub fn with_mtu(self, mtu: i32) -> Self {
        self.write_i32(mtu)
    }

    fn read_i32(&self) -> i32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[IFR_DATA..IFR_DATA + 4]);
        i32::from_ne_bytes(raw)
    }

    fn write_i32(mut self, value: i32) -> Self {
        self.bytes[IFR_DATA..IFR_DATA + 4].copy_from_slice(&value.to_ne_bytes());
        self
    }

    /// Raw bytes, as passed to `ioctl`.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw bytes, for `ioctl` requests that fill the struct.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for IfReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfReq")
            .field("name", &self.name())
            .field("flags", &self.flags())
            .finish_non_exhaustive()
    }
}

/// One line of the mount table (`struct mntent`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    /// Device or server (`mnt_fsname`).
    pub fsname: String,
    /// Mount point (`mnt_dir`).
    pub dir: String,
    /// Filesystem type (`mnt_type`).
    pub fstype: String,
    /// Comma-separated options (`mnt_opts`).
    pub opts: String,
    /// Dump frequency in days.
    #[serde(default)]
    pub freq: i32,
    /// Pass number for parallel fsck.
    #[serde(default)]
    pub passno: i32,
}

impl MountEntry {
    /// Creates an entry with default options (`rw`).
    #[must_use]
    pub fn new(
        fsname: impl Into<String>,
        dir: impl Into<String>,
        fstype: impl Into<String>,
    ) -> Self {
        Self {
            fsname: fsname.into(),
            dir: dir.into(),
            fstype: fstype.into(),
            opts: "rw".to_string(),
            freq: 0,
            passno: 0,
        }
    }

    /// Sets the option string.
    #[must_use]
    pub fn with_opts(mut self, opts: impl Into<String>) -> Self {
        self.opts = opts.into();
        self
    }

    /// Returns true if `opt` is one of the comma-separated options
    /// (`hasmntopt` semantics, `name=value` options match on `name`).
    #[must_use]
    pub fn has_option(&self, opt: &str) -> bool {
        self.opts
            .split(',')
            .any(|o| o == opt || o.split_once('=').is_some_and(|(name, _)| name == opt))
    }
}

impl MockRecord for MountEntry {
    const TYPE_NAME: &'static str = "mntent";
}

/// Filesystem statistics (`struct statvfs`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatVfs {
    /// Filesystem block size.
    pub bsize: u64,
    /// Fragment size.
    pub frsize: u64,
    /// Size of the filesystem in `frsize` units.
    pub blocks: u64,
    /// Free blocks.
    pub bfree: u64,
    /// Free blocks for unprivileged users.
    pub bavail: u64,
    /// Inodes.
    pub files: u64,
    /// Free inodes.
    pub ffree: u64,
    /// Free inodes for unprivileged users.
    pub favail: u64,
    /// Filesystem ID.
    pub fsid: u64,
    /// Mount flags.
    pub flag: u64,
    /// Maximum filename length.
    pub namemax: u64,
}

impl StatVfs {
    /// Total size in bytes.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.blocks.saturating_mul(self.frsize)
    }

    /// Bytes available to unprivileged users.
    #[must_use]
    pub const fn available_bytes(&self) -> u64 {
        self.bavail.saturating_mul(self.frsize)
    }

    /// Bytes in use.
    #[must_use]
    pub const fn used_bytes(&self) -> u64 {
        self.blocks.saturating_sub(self.bfree).saturating_mul(self.frsize)
    }
}

impl MockRecord for StatVfs {
    const TYPE_NAME: &'static str = "statvfs";
}

/// Open mount table stream, standing in for the `FILE *` of `setmntent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MntStream(NonZeroU64);

impl MntStream {
    /// Wraps a raw handle; zero is the null stream.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw handle value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0.get()
    }
}
