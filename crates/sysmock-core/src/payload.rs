//! Typed expectation payloads.
//!
//! A payload is the value recorded for one parameter or return value. Every
//! variant has a size that mirrors the C calling convention it stands in for,
//! so a queued `int` never silently satisfies a request for an `unsigned
//! long`.

use std::ffi::{CStr, CString};
use std::fmt;
use std::net::{SocketAddrV4, SocketAddrV6};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};

/// Value carried by one expectation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Null pointer with zero size.
    Absent,
    /// C `int`.
    I32(i32),
    /// C `unsigned int`.
    U32(u32),
    /// C `long` / `ssize_t`.
    I64(i64),
    /// C `unsigned long` / `size_t`, also opaque handles.
    U64(u64),
    /// NUL-terminated string; the terminator counts towards the size.
    Str(String),
    /// Raw buffer of caller-specified length.
    Bytes(Vec<u8>),
    /// Struct passed by value.
    Record {
        /// C-side type name, e.g. `statvfs`.
        type_name: String,
        /// Field values.
        fields: serde_json::Value,
    },
}

/// A struct that can travel through the queue as a [`Payload::Record`].
pub trait MockRecord: Serialize + DeserializeOwned {
    /// Type name recorded with the payload and checked on pop.
    const TYPE_NAME: &'static str;
}

impl MockRecord for SocketAddrV4 {
    const TYPE_NAME: &'static str = "sockaddr_in";
}

impl MockRecord for SocketAddrV6 {
    const TYPE_NAME: &'static str = "sockaddr_in6";
}

impl Payload {
    /// Encodes a struct by value.
    ///
    /// # Errors
    /// Returns [`MockError::Record`] if the value cannot be serialized.
    pub fn record<T: MockRecord>(value: &T) -> Result<Self> {
        let fields =
            serde_json::to_value(value).map_err(|e| MockError::record(T::TYPE_NAME, e))?;
        Ok(Self::Record {
            type_name: T::TYPE_NAME.to_string(),
            fields,
        })
    }

    /// Decodes a record payload back into `T`.
    ///
    /// Returns `None` when the payload is not a record of type `T`.
    ///
    /// # Errors
    /// Returns [`MockError::Record`] if the fields do not deserialize.
    pub fn into_record<T: MockRecord>(self) -> Result<Option<T>> {
        match self {
            Self::Record { type_name, fields } if type_name == T::TYPE_NAME => {
                serde_json::from_value(fields)
                    .map(Some)
                    .map_err(|e| MockError::record(T::TYPE_NAME, e))
            }
            _ => Ok(None),
        }
    }

    /// Size in bytes of the value in the C calling convention.
    ///
    /// Records have no fixed byte size here and return `None`.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Absent => Some(0),
            Self::I32(_) | Self::U32(_) => Some(4),
            Self::I64(_) | Self::U64(_) => Some(8),
            Self::Str(s) => Some(s.len() + 1),
            Self::Bytes(b) => Some(b.len()),
            Self::Record { .. } => None,
        }
    }

    /// Short kind name used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Record { .. } => "record",
        }
    }

    /// Kind plus size, e.g. `i32 (4 bytes)` or `record statvfs`.
    #[must_use]
    pub fn shape(&self) -> String {
        match self {
            Self::Record { type_name, .. } => format!("record {type_name}"),
            other => format!("{} ({} bytes)", other.kind(), other.size().unwrap_or(0)),
        }
    }

    /// Returns true for a zero-size buffer (absent or empty bytes).
    #[must_use]
    pub fn is_empty_buffer(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Bytes(b) => b.is_empty(),
            _ => false,
        }
    }

    /// Returns true if `other` has the same declared kind and size.
    ///
    /// Strings of different length share a shape: their terminators land at
    /// different offsets, which is a content mismatch.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent | Self::Bytes(_), Self::Absent | Self::Bytes(_)) => {
                self.size() == other.size()
            }
            (Self::Str(_), Self::Str(_)) => true,
            (Self::Record { type_name: a, .. }, Self::Record { type_name: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }

    /// Content equality as seen by `pop_assert`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        if self.is_empty_buffer() && other.is_empty_buffer() {
            return true;
        }
        self == other
    }

    /// Raw bytes for buffer-like payloads, strings including their NUL.
    #[must_use]
    pub fn as_c_bytes(&self) -> Option<Vec<u8>> {
        match self {
            Self::Absent => Some(Vec::new()),
            Self::Str(s) => {
                let mut bytes = Vec::with_capacity(s.len() + 1);
                bytes.extend_from_slice(s.as_bytes());
                bytes.push(0);
                Some(bytes)
            }
            Self::Bytes(b) => Some(b.clone()),
            Self::I32(v) => Some(v.to_ne_bytes().to_vec()),
            Self::U32(v) => Some(v.to_ne_bytes().to_vec()),
            Self::I64(v) => Some(v.to_ne_bytes().to_vec()),
            Self::U64(v) => Some(v.to_ne_bytes().to_vec()),
            Self::Record { .. } => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "NULL"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v:#x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Record { type_name, fields } => write!(f, "{type_name} {fields}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_int!(i32 => I32, u32 => U32, i64 => I64, u64 => U64);

impl From<usize> for Payload {
    fn from(value: usize) -> Self {
        Self::U64(value as u64)
    }
}

impl From<isize> for Payload {
    fn from(value: isize) -> Self {
        Self::I64(value as i64)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Non-UTF-8 C strings become a byte buffer that keeps the terminator.
impl From<&CStr> for Payload {
    fn from(value: &CStr) -> Self {
        match value.to_str() {
            Ok(s) => Self::Str(s.to_string()),
            Err(_) => Self::Bytes(value.to_bytes_with_nul().to_vec()),
        }
    }
}

impl From<CString> for Payload {
    fn from(value: CString) -> Self {
        Self::from(value.as_c_str())
    }
}

impl From<&[u8]> for Payload {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Option<&[u8]>> for Payload {
    fn from(value: Option<&[u8]>) -> Self {
        value.map_or(Self::Absent, Self::from)
    }
}

/// Conversion from a popped payload into the caller's destination type.
pub trait FromPayload: Sized {
    /// Kind the destination expects, for size mismatch diagnostics.
    fn requested_shape() -> String;

    /// Converts the payload, or returns `None` if the kind does not fit.
    fn from_payload(payload: Payload) -> Option<Self>;
}

macro_rules! impl_from_payload_int {
    ($($ty:ty => $variant:ident ($size:expr)),* $(,)?) => {
        $(
            impl FromPayload for $ty {
                fn requested_shape() -> String {
                    format!("{} ({} bytes)", stringify!($ty), $size)
                }

                fn from_payload(payload: Payload) -> Option<Self> {
                    match payload {
                        Payload::$variant(v) => Self::try_from(v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_payload_int!(
    i32 => I32(4),
    u32 => U32(4),
    i64 => I64(8),
    u64 => U64(8),
    isize => I64(8),
    usize => U64(8),
);

impl FromPayload for String {
    fn requested_shape() -> String {
        "string".to_string()
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl FromPayload for Vec<u8> {
    fn requested_shape() -> String {
        "bytes".to_string()
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Absent => Some(Vec::new()),
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl FromPayload for Option<Vec<u8>> {
    fn requested_shape() -> String {
        "bytes or absent".to_string()
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        match payload {
            Payload::Absent => Some(None),
            Payload::Bytes(b) => Some(Some(b)),
            _ => None,
        }
    }
}

impl FromPayload for Payload {
    fn requested_shape() -> String {
        "any".to_string()
    }

    fn from_payload(payload: Payload) -> Option<Self> {
        Some(payload)
    }
}
