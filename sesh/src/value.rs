// The `Value`/`Number`/`Map` types in this module are derived from the
// `serde_json` crate by @dtolnay, by way of `tower-sesh::value`.
//
// Dual licensed MIT and Apache 2.0.

//! The `Value` enum, a loosely typed way of representing any session value,
//! plus the [`HeavyValue`] trait used to opt a type into the compact "heavy"
//! wire form described by the codec (see [`crate::codec`]).

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

pub mod map;
mod number;

#[doc(inline)]
pub use self::map::Map;
#[doc(inline)]
pub use self::number::Number;

/// A loosely typed value that can be stored in a session.
///
/// This looks like (and is, in large part, based on) [`serde_json::Value`],
/// with two differences:
///
/// - `ByteArray` is a distinct variant, rather than being coerced into an
///   `Array` of numbers, enabling more efficient encoding.
/// - `Heavy` carries a value that was encoded by a [`HeavyValue`]
///   implementation rather than through the general-purpose light path; see
///   [`Value::from_heavy`].
///
/// [`serde_json::Value`]: https://docs.rs/serde_json/latest/serde_json/enum.Value.html
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    ByteArray(Vec<u8>),
    Array(Vec<Value>),
    Map(Map<String, Value>),
    /// A value pre-encoded by a [`HeavyValue`] implementation.
    ///
    /// The codec's heavy/light split (spec §4.1) partitions a session's
    /// entries into this variant (heavy) and everything else (light); see
    /// [`crate::codec`].
    Heavy(Vec<u8>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(boolean) => f.debug_tuple("Bool").field(boolean).finish(),
            Value::Number(number) => fmt::Debug::fmt(number, f),
            Value::String(string) => f.debug_tuple("String").field(string).finish(),
            Value::ByteArray(bytes) => f
                .debug_tuple("ByteArray")
                .field(&DebugByteArray(bytes))
                .finish(),
            Value::Array(vec) => f.debug_tuple("Array").field(vec).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Heavy(bytes) => f.debug_tuple("Heavy").field(&bytes.len()).finish(),
        }
    }
}

struct DebugByteArray<'a>(&'a [u8]);

// Copied from https://doc.rust-lang.org/1.84.1/src/core/str/lossy.rs.html#113-145.
impl fmt::Debug for DebugByteArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;

        for chunk in self.0.utf8_chunks() {
            let valid = chunk.valid();
            let mut from = 0;
            for (i, c) in valid.char_indices() {
                let esc = c.escape_debug();
                if esc.len() != 1 {
                    f.write_str(&valid[from..i])?;
                    for c in esc {
                        f.write_char(c)?;
                    }
                    from = i + c.len_utf8();
                }
            }
            f.write_str(&valid[from..])?;

            for &b in chunk.invalid() {
                write!(f, "\\x{b:02X}")?;
            }
        }

        f.write_char('"')
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Whether this value is a pre-encoded heavy payload (see
    /// [`HeavyValue`]), as opposed to a general-purpose light value.
    pub fn is_heavy(&self) -> bool {
        matches!(self, Value::Heavy(_))
    }

    /// Encodes `value` through its [`HeavyValue`] implementation and wraps
    /// the result as `Value::Heavy`.
    pub fn from_heavy<H: HeavyValue>(value: &H) -> Value {
        Value::Heavy(value.encode_heavy())
    }

    /// Decodes a `Value::Heavy` back into `H` via its [`HeavyValue`]
    /// implementation. Returns `None` if this value is not `Value::Heavy`.
    pub fn as_heavy<H: HeavyValue>(&self) -> Option<Result<H, HeavyDecodeError>> {
        match self {
            Value::Heavy(bytes) => Some(H::decode_heavy(bytes)),
            _ => None,
        }
    }
}

/// A distinguished "record" type with a more compact wire form than the
/// general-purpose light-value encoding.
///
/// Implement this for types that are expensive to encode through the
/// default [`Value`] representation (e.g. a framework model type with a
/// protobuf or bincode encoding already available) and store them with
/// [`Value::from_heavy`]. Absence of any `HeavyValue` usage is the default:
/// every value is then encoded through the light path.
pub trait HeavyValue: Sized {
    fn encode_heavy(&self) -> Vec<u8>;
    fn decode_heavy(bytes: &[u8]) -> Result<Self, HeavyDecodeError>;
}

/// The error returned by a [`HeavyValue::decode_heavy`] implementation.
#[derive(Debug, thiserror::Error)]
#[error("failed to decode heavy value: {reason}")]
pub struct HeavyDecodeError {
    pub reason: String,
}

impl HeavyDecodeError {
    pub fn new(reason: impl Into<String>) -> HeavyDecodeError {
        HeavyDecodeError {
            reason: reason.into(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::ByteArray(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Map<String, Value>> for Value {
    fn from(m: Map<String, Value>) -> Self {
        Value::Map(m)
    }
}

macro_rules! from_number {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_number! { u8 u16 u32 u64 usize i8 i16 i32 i64 isize }

#[cfg(test)]
mod test {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    impl HeavyValue for Point {
        fn encode_heavy(&self) -> Vec<u8> {
            let mut bytes = Vec::with_capacity(8);
            bytes.extend_from_slice(&self.x.to_le_bytes());
            bytes.extend_from_slice(&self.y.to_le_bytes());
            bytes
        }

        fn decode_heavy(bytes: &[u8]) -> Result<Self, HeavyDecodeError> {
            if bytes.len() != 8 {
                return Err(HeavyDecodeError::new("expected 8 bytes"));
            }
            Ok(Point {
                x: i32::from_le_bytes(bytes[0..4].try_into().unwrap()),
                y: i32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            })
        }
    }

    #[test]
    fn heavy_round_trips() {
        let p = Point { x: 3, y: -7 };
        let value = Value::from_heavy(&p);
        assert!(value.is_heavy());

        let decoded: Point = value.as_heavy::<Point>().unwrap().unwrap();
        assert_eq!((decoded.x, decoded.y), (3, -7));
    }

    #[test]
    fn debug_does_not_print_heavy_bytes() {
        let value = Value::Heavy(vec![1, 2, 3, 4, 5]);
        assert_eq!(format!("{value:?}"), "Heavy(5)");
    }
}
