//! Code written against `SystemOps`, driven through scripted mocks.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::ffi::{CString, c_ulong};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

use proptest::prelude::*;
use sysmock_core::{MockQueue, QueueConfig, global};
use sysmock_sys::{IfReq, MntStream, MockSystem, MountEntry, StatVfs, SystemOps, cvt};

const AF_INET: i32 = 2;
const SOCK_DGRAM: i32 = 2;
const O_RDONLY: i32 = 0;
const SIOCGIFFLAGS: c_ulong = 0x8913;
const SIOCSIFFLAGS: c_ulong = 0x8914;
const IFF_UP: i16 = 0x1;
const MS_NOSUID: c_ulong = 2;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mount_proc(sys: &impl SystemOps) -> io::Result<()> {
    cvt(sys.mount(c"proc", c"/proc", c"proc", MS_NOSUID, None))?;
    Ok(())
}

/// Brings an interface up with a read-modify-write of its flags.
fn interface_up(sys: &impl SystemOps, name: &str) -> io::Result<()> {
    let fd = cvt(sys.socket(AF_INET, SOCK_DGRAM, 0))?;
    let mut req = IfReq::new(name);
    let res = cvt(sys.ioctl(fd, SIOCGIFFLAGS, req.as_bytes_mut())).and_then(|_| {
        req = req.with_flags(req.flags() | IFF_UP);
        cvt(sys.ioctl(fd, SIOCSIFFLAGS, req.as_bytes_mut()))
    });
    sys.close(fd);
    res.map(drop)
}

fn insmod(sys: &impl SystemOps, path: &str, params: &str) -> io::Result<()> {
    let path = CString::new(path)?;
    let params = CString::new(params)?;
    let fd = cvt(sys.open(&path, O_RDONLY))?;
    let res = cvt(sys.finit_module(fd, &params, 0));
    sys.close(fd);
    res.map(drop)
}

/// Available bytes on the filesystem mounted at `dir`, if it is mounted.
fn available_at(sys: &impl SystemOps, dir: &str) -> io::Result<Option<u64>> {
    let Some(stream) = sys.setmntent(c"/proc/mounts", c"r") else {
        return Err(io::Error::other("cannot read mount table"));
    };
    let mut found = None;
    while let Some(entry) = sys.getmntent(stream) {
        if entry.dir == dir {
            found = Some(entry);
            break;
        }
    }
    sys.endmntent(stream);

    let Some(entry) = found else {
        return Ok(None);
    };
    let dir = CString::new(entry.dir)?;
    let mut st = StatVfs::default();
    cvt(sys.statvfs(&dir, &mut st))?;
    Ok(Some(st.available_bytes()))
}

fn announce(sys: &impl SystemOps, fd: i32, dest: &SocketAddrV4, msg: &[u8]) -> isize {
    sys.sendto(fd, msg, 0, dest)
}

#[test]
fn mount_proc_succeeds() {
    init_tracing();
    let sys = MockSystem::new();
    sys.push_mount("proc", "/proc", "proc", MS_NOSUID, None, 0);

    mount_proc(&sys).unwrap();
    sys.verify();
}

#[test]
fn mount_failure_propagates() {
    let sys = MockSystem::new();
    sys.push_mount("proc", "/proc", "proc", MS_NOSUID, None, -1);

    assert!(mount_proc(&sys).is_err());
    sys.verify();
}

#[test]
#[should_panic(expected = "argument mismatch for mount(flags)")]
fn mount_wrong_flags_aborts() {
    let sys = MockSystem::new();
    sys.push_mount("proc", "/proc", "proc", 0, None, 0);
    let _ = mount_proc(&sys);
}

#[test]
fn interface_up_sets_flag() {
    init_tracing();
    let down = IfReq::new("eth0");
    let up = down.with_flags(IFF_UP);

    let sys = MockSystem::new();
    sys.push_socket(AF_INET, SOCK_DGRAM, 0, 3);
    sys.push_ioctl_ifreq_ok(3, SIOCGIFFLAGS, &down);
    sys.push_ioctl_ifreq_ok(3, SIOCSIFFLAGS, &up);
    sys.push_close(3, 0);

    interface_up(&sys, "eth0").unwrap();
    sys.verify();
}

#[test]
fn interface_up_closes_socket_on_failure() {
    let sys = MockSystem::new();
    sys.push_socket(AF_INET, SOCK_DGRAM, 0, 3);
    sys.push_ioctl(3, SIOCGIFFLAGS, IfReq::new("wlan9").as_bytes(), -1);
    sys.push_close(3, 0);

    assert!(interface_up(&sys, "wlan9").is_err());
    sys.verify();
}

#[test]
#[should_panic(expected = "argument mismatch for ioctl(data)")]
fn interface_up_wrong_name_aborts() {
    let sys = MockSystem::new();
    sys.push_socket(AF_INET, SOCK_DGRAM, 0, 3);
    sys.push_ioctl_ifreq_ok(3, SIOCGIFFLAGS, &IfReq::new("eth1"));

    let _ = interface_up(&sys, "eth0");
}

#[test]
fn insmod_loads_module() {
    let sys = MockSystem::new();
    sys.push_open("/lib/modules/foo.ko", O_RDONLY, 6);
    sys.push_finit_module(6, "debug=1", 0, 0);
    sys.push_close(6, 0);

    insmod(&sys, "/lib/modules/foo.ko", "debug=1").unwrap();
    sys.verify();
}

#[test]
fn insmod_open_failure_stops_early() {
    let sys = MockSystem::new();
    sys.push_open("/missing.ko", O_RDONLY, -1);

    assert!(insmod(&sys, "/missing.ko", "").is_err());
    sys.verify();
}

#[test]
fn available_bytes_from_mount_table() {
    init_tracing();
    let stream = MntStream::from_raw(1).unwrap();
    let boot = MountEntry::new("/dev/sda1", "/boot", "ext4");
    let data = MountEntry::new("/dev/sdb1", "/data", "xfs").with_opts("rw,noatime");
    let st = StatVfs {
        frsize: 4096,
        blocks: 1000,
        bfree: 600,
        bavail: 500,
        ..StatVfs::default()
    };

    let sys = MockSystem::new();
    sys.push_setmntent("/proc/mounts", "r", Some(stream));
    sys.push_getmntent(stream, Some(&boot));
    sys.push_getmntent(stream, Some(&data));
    sys.push_endmntent(stream, 1);
    sys.push_statvfs("/data", &st, 0);

    assert_eq!(available_at(&sys, "/data").unwrap(), Some(500 * 4096));
    sys.verify();
}

#[test]
fn available_bytes_not_mounted() {
    let stream = MntStream::from_raw(9).unwrap();
    let sys = MockSystem::new();
    sys.push_setmntent("/proc/mounts", "r", Some(stream));
    sys.push_getmntent(stream, Some(&MountEntry::new("tmpfs", "/tmp", "tmpfs")));
    sys.push_getmntent(stream, None);
    sys.push_endmntent(stream, 1);

    assert_eq!(available_at(&sys, "/data").unwrap(), None);
    sys.verify();
}

#[test]
fn unreadable_mount_table() {
    let sys = MockSystem::new();
    sys.push_setmntent("/proc/mounts", "r", None);

    assert!(available_at(&sys, "/").is_err());
    sys.verify();
}

#[test]
fn sendto_returns_scripted_length() {
    let dest = SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900);
    let sys = MockSystem::new();
    sys.push_sendto(4, b"NOTIFY", 0, &dest, 6);

    assert_eq!(announce(&sys, 4, &dest, b"NOTIFY"), 6);
    sys.verify();
}

#[test]
#[should_panic(expected = "argument mismatch for sendto(buf)")]
fn sendto_wrong_payload_aborts() {
    let dest = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9);
    let sys = MockSystem::new();
    sys.push_sendto(4, b"hello", 0, &dest, 5);

    announce(&sys, 4, &dest, b"hellp");
}

#[test]
#[should_panic(expected = "unexpected call")]
fn unscripted_call_aborts() {
    let sys = MockSystem::new();
    sys.close(3);
}

#[test]
#[should_panic(expected = "out of order call")]
fn calls_in_wrong_order_abort() {
    let sys = MockSystem::new();
    sys.push_close(3, 0);
    sys.socket(AF_INET, SOCK_DGRAM, 0);
}

#[test]
fn relaxed_names_still_check_values() {
    let queue = MockQueue::with_config(QueueConfig::builder().strict_names(false).build());
    let sys = MockSystem::with_queue(queue.clone());
    queue.push("anything", 3i32).unwrap();
    queue.push("anything else", 0i32).unwrap();

    assert_eq!(sys.close(3), 0);
    sys.verify();
}

#[test]
fn global_mock_inside_session() {
    let session = global::session();
    let sys = MockSystem::global();
    sys.push_close(11, 0);

    assert_eq!(sys.close(11), 0);
    session.finish().unwrap();
}

#[test]
fn sendto_status_converts_with_cvt() {
    let dest = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 514);
    let sys = MockSystem::new();
    sys.push_sendto(4, b"<13>up", 0, &dest, 6);
    sys.push_sendto(4, b"<13>up", 0, &dest, -1);

    assert_eq!(cvt(announce(&sys, 4, &dest, b"<13>up")).unwrap(), 6);
    assert!(cvt(announce(&sys, 4, &dest, b"<13>up")).is_err());
    sys.verify();
}

#[test]
fn interface_index_from_scripted_reply() {
    const SIOCGIFINDEX: c_ulong = 0x8933;
    let query = IfReq::new("eth0");
    let sys = MockSystem::new();
    sys.push_ioctl_ifreq_reply(5, SIOCGIFINDEX, &query, &query.with_ifindex(7));

    let mut req = IfReq::new("eth0");
    cvt(sys.ioctl(5, SIOCGIFINDEX, req.as_bytes_mut())).unwrap();
    assert_eq!(req.ifindex(), 7);
    sys.verify();
}

#[test]
#[should_panic(expected = "6 expected call(s) never happened")]
fn dropping_unverified_mock_fails_test() {
    let sys = MockSystem::new();
    sys.push_mount("proc", "/proc", "proc", MS_NOSUID, None, 0);
    assert_eq!(sys.queue().len().unwrap(), 6);
    drop(sys);
}

proptest! {
    /// S001: a scripted close sequence replays in order.
    #[test]
    fn s001_close_sequence_replays(
        calls in prop::collection::vec((0i32..1024, -1i32..=0), 0..32),
    ) {
        let sys = MockSystem::new();
        for &(fd, res) in &calls {
            sys.push_close(fd, res);
        }
        for &(fd, res) in &calls {
            prop_assert_eq!(sys.close(fd), res, "S001 FALSIFIED: close({}) diverged", fd);
        }
        prop_assert!(sys.queue().is_empty().unwrap());
    }

    /// S002: interface names survive the ifreq round trip.
    #[test]
    fn s002_ifreq_name(name in "[a-z][a-z0-9]{0,14}", flags in any::<i16>()) {
        let req = IfReq::new(&name).with_flags(flags);
        prop_assert_eq!(req.name(), name);
        prop_assert_eq!(req.flags(), flags);
    }
}
