//! Property tests for the expectation queue.
//!
//! Each property attempts to falsify one claim about the queue; a passing
//! run means the claim survived.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use proptest::prelude::*;
use sysmock_core::{ExpectationQueue, MockError, Payload, QueueConfig};

fn payload_strategy() -> impl Strategy<Value = Payload> {
    prop_oneof![
        Just(Payload::Absent),
        any::<i32>().prop_map(Payload::I32),
        any::<u32>().prop_map(Payload::U32),
        any::<i64>().prop_map(Payload::I64),
        any::<u64>().prop_map(Payload::U64),
        "[a-z/]{0,24}".prop_map(Payload::Str),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Payload::Bytes),
    ]
}

fn relaxed() -> ExpectationQueue {
    ExpectationQueue::with_config(QueueConfig::builder().strict_names(false).build())
}

proptest! {
    /// Q001: the i-th pop returns the i-th push.
    #[test]
    fn q001_fifo_law(payloads in prop::collection::vec(payload_strategy(), 0..50)) {
        let mut queue = relaxed();
        for p in &payloads {
            queue.push("entry", p.clone()).unwrap();
        }
        for p in &payloads {
            let popped: Payload = queue.pop("entry").unwrap();
            prop_assert_eq!(&popped, p, "Q001 FALSIFIED: pop order diverged from push order");
        }
        prop_assert!(queue.is_empty());
    }

    /// Q002: popping more than pushed fails with an unexpected call.
    #[test]
    fn q002_overpop_fails(count in 0usize..20, extra in 1usize..5) {
        let mut queue = relaxed();
        for i in 0..count {
            queue.push("entry", i).unwrap();
        }
        for _ in 0..count {
            queue.pop::<usize>("entry").unwrap();
        }
        for _ in 0..extra {
            let err = queue.pop::<usize>("entry").unwrap_err();
            prop_assert!(
                matches!(err, MockError::UnexpectedCall { .. }),
                "Q002 FALSIFIED: overpop returned {:?}",
                err
            );
        }
    }

    /// Q003: pop_assert accepts identical bytes.
    #[test]
    fn q003_equal_bytes_pass(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        let mut queue = ExpectationQueue::new();
        queue.push("buf", bytes.clone()).unwrap();
        prop_assert!(queue.pop_assert("buf", bytes.as_slice()).is_ok());
    }

    /// Q004: pop_assert rejects any single differing byte.
    #[test]
    fn q004_any_differing_byte_fails(
        bytes in prop::collection::vec(any::<u8>(), 1..128),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut actual = bytes.clone();
        let i = index.index(actual.len());
        actual[i] ^= flip;

        let mut queue = ExpectationQueue::new();
        queue.push("buf", bytes).unwrap();
        let err = queue.pop_assert("buf", actual).unwrap_err();
        prop_assert!(
            matches!(err, MockError::ArgumentMismatch { .. }),
            "Q004 FALSIFIED: flipped byte {} accepted",
            i
        );
        let reported = format!("first difference at offset {i}");
        prop_assert!(
            err.to_string().contains(&reported),
            "Q004 FALSIFIED: offset {} not reported",
            i
        );
    }

    /// Q005: strings compare by content, not by allocation.
    #[test]
    fn q005_string_content_equality(text in "[ -~]{0,40}") {
        let mut queue = ExpectationQueue::new();
        queue.push("path", text.as_str()).unwrap();
        let copy = std::ffi::CString::new(text.clone()).unwrap();
        prop_assert!(queue.pop_assert("path", copy.as_c_str()).is_ok());
    }

    /// Q006: the queue never holds more than its capacity.
    #[test]
    fn q006_capacity_bound(capacity in 1usize..16, pushes in 0usize..32) {
        let mut queue = ExpectationQueue::with_config(
            QueueConfig::builder().capacity(capacity).build(),
        );
        for i in 0..pushes {
            let result = queue.push("entry", i);
            if i < capacity {
                prop_assert!(result.is_ok());
            } else {
                let is_capacity_error = matches!(result, Err(MockError::CapacityExceeded { .. }));
                prop_assert!(is_capacity_error);
            }
        }
        prop_assert_eq!(queue.len(), pushes.min(capacity));
    }
}
