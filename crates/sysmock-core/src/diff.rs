//! Expected/actual rendering for argument mismatches.

use std::fmt::Write as _;

use crate::payload::Payload;

/// Renders a comparison of two payloads of the same shape.
///
/// Buffers and strings get a hex dump of both sides with the first differing
/// offset; records list the fields that differ; scalars print both values.
#[must_use]
pub fn describe(expected: &Payload, actual: &Payload, width: usize) -> String {
    match (expected, actual) {
        (
            Payload::Record {
                fields: expected, ..
            },
            Payload::Record { fields: actual, .. },
        ) => describe_fields(expected, actual),
        (Payload::Str(_) | Payload::Bytes(_) | Payload::Absent, _) => {
            match (expected.as_c_bytes(), actual.as_c_bytes()) {
                (Some(e), Some(a)) => {
                    let mut out = String::new();
                    if let (Payload::Str(e), Payload::Str(a)) = (expected, actual) {
                        let _ = writeln!(out, "expected: {e:?}\n  actual: {a:?}");
                    }
                    out.push_str(&describe_bytes(&e, &a, width));
                    out
                }
                _ => describe_values(expected, actual),
            }
        }
        _ => describe_values(expected, actual),
    }
}

fn describe_values(expected: &Payload, actual: &Payload) -> String {
    format!("expected: {expected}\n  actual: {actual}")
}

/// Offset of the first byte that differs, counting a length difference.
#[must_use]
pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<usize> {
    expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
        .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))
}

fn describe_bytes(expected: &[u8], actual: &[u8], width: usize) -> String {
    let mut out = String::new();
    if let Some(offset) = first_difference(expected, actual) {
        let _ = writeln!(out, "first difference at offset {offset}");
    }
    let _ = writeln!(out, "expected ({} bytes):", expected.len());
    out.push_str(&hexdump(expected, width));
    let _ = writeln!(out, "actual ({} bytes):", actual.len());
    out.push_str(&hexdump(actual, width));
    out
}

/// Classic offset / hex / ASCII dump, `width` bytes per line.
#[must_use]
pub fn hexdump(bytes: &[u8], width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(width).enumerate() {
        let _ = write!(out, "  {:04x}:", line * width);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        for _ in chunk.len()..width {
            out.push_str("   ");
        }
        out.push_str("  ");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            }
        }));
        out.push('\n');
    }
    if bytes.is_empty() {
        out.push_str("  <empty>\n");
    }
    out
}

fn describe_fields(expected: &serde_json::Value, actual: &serde_json::Value) -> String {
    use serde_json::Value;

    let (Value::Object(e), Value::Object(a)) = (expected, actual) else {
        return format!("expected: {expected}\n  actual: {actual}");
    };

    let mut out = String::new();
    for (key, e_val) in e {
        match a.get(key) {
            Some(a_val) if a_val == e_val => {}
            Some(a_val) => {
                let _ = writeln!(out, "field `{key}`: expected {e_val}, actual {a_val}");
            }
            None => {
                let _ = writeln!(out, "field `{key}`: expected {e_val}, actual <missing>");
            }
        }
    }
    for (key, a_val) in a {
        if !e.contains_key(key) {
            let _ = writeln!(out, "field `{key}`: unexpected, actual {a_val}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc\0", b"abd\0"), Some(2));
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert_eq!(first_difference(b"ab", b"abc"), Some(2));
    }

    #[test]
    fn test_hexdump_layout() {
        let dump = hexdump(b"abc\0", 8);
        assert_eq!(dump, "  0000: 61 62 63 00              abc.\n");
    }

    #[test]
    fn test_hexdump_wraps_lines() {
        let dump = hexdump(&[0u8; 5], 4);
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.lines().nth(1).unwrap().starts_with("  0004:"));
    }

    #[test]
    fn test_hexdump_empty() {
        assert_eq!(hexdump(&[], 16), "  <empty>\n");
    }

    #[test]
    fn test_describe_strings() {
        let text = describe(&Payload::from("abc"), &Payload::from("abd"), 16);
        assert!(text.contains("expected: \"abc\""));
        assert!(text.contains("actual: \"abd\""));
        assert!(text.contains("first difference at offset 2"));
    }

    #[test]
    fn test_describe_scalars() {
        let text = describe(&Payload::I32(2), &Payload::I32(10), 16);
        assert_eq!(text, "expected: 2\n  actual: 10");
    }

    #[test]
    fn test_describe_record_fields() {
        let expected = Payload::Record {
            type_name: "statvfs".into(),
            fields: json!({"bsize": 4096, "blocks": 10}),
        };
        let actual = Payload::Record {
            type_name: "statvfs".into(),
            fields: json!({"bsize": 4096, "blocks": 12}),
        };
        let text = describe(&expected, &actual, 16);
        assert_eq!(text, "field `blocks`: expected 10, actual 12\n");
    }
}
