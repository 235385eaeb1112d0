// Adapted from https://github.com/serde-rs/json (dual MIT/Apache-2.0), by
// way of `tower-sesh::value::Number`.

use std::{fmt, hash::Hash};

use serde::{
    de::{self, Visitor},
    Deserialize, Serialize,
};

/// Represents a number, whether integer or floating point.
///
/// May only represent values which are representable by [`i64`], [`u64`], or
/// [finite] [`f64`].
///
/// [finite]: f64::is_finite
#[derive(Clone, PartialEq, Hash)]
pub struct Number {
    n: NumberImpl,
}

#[derive(Copy, Clone)]
enum NumberImpl {
    PosInt(u64),
    /// Always less than zero.
    NegInt(i64),
    /// Always finite.
    Float(f64),
}

impl PartialEq for NumberImpl {
    fn eq(&self, other: &Self) -> bool {
        use NumberImpl::*;
        match (self, other) {
            (PosInt(a), PosInt(b)) => a.eq(b),
            (NegInt(a), NegInt(b)) => a.eq(b),
            (Float(a), Float(b)) => a.eq(b),
            _ => false,
        }
    }
}

// NaN cannot be represented, so this is valid.
impl Eq for NumberImpl {}
impl Eq for Number {}

impl Hash for NumberImpl {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use NumberImpl::*;
        match *self {
            PosInt(i) => i.hash(state),
            NegInt(i) => i.hash(state),
            Float(f) => {
                if f == 0.0f64 {
                    0.0f64.to_bits().hash(state)
                } else {
                    f.to_bits().hash(state)
                }
            }
        }
    }
}

impl Number {
    /// Returns `true` if the `Number` is an integer between [`i64::MIN`] and
    /// [`i64::MAX`].
    pub fn is_i64(&self) -> bool {
        use NumberImpl::*;
        match self.n {
            PosInt(v) => v <= i64::MAX as u64,
            NegInt(_) => true,
            Float(_) => false,
        }
    }

    /// Returns `true` if the `Number` is an integer between `0` and
    /// [`u64::MAX`].
    pub fn is_u64(&self) -> bool {
        matches!(self.n, NumberImpl::PosInt(_))
    }

    /// Returns `true` if the `Number` can be represented by [`f64`].
    pub fn is_f64(&self) -> bool {
        matches!(self.n, NumberImpl::Float(_))
    }

    /// If the `Number` is an integer, represent it as [`i64`] if possible.
    pub fn as_i64(&self) -> Option<i64> {
        use NumberImpl::*;
        match self.n {
            PosInt(n) => i64::try_from(n).ok(),
            NegInt(n) => Some(n),
            Float(_) => None,
        }
    }

    /// If the `Number` is an integer, represent it as [`u64`] if possible.
    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            NumberImpl::PosInt(n) => Some(n),
            NumberImpl::NegInt(_) | NumberImpl::Float(_) => None,
        }
    }

    /// Represents the number as [`f64`] if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self.n {
            NumberImpl::PosInt(n) => Some(n as f64),
            NumberImpl::NegInt(n) => Some(n as f64),
            NumberImpl::Float(n) => Some(n),
        }
    }

    /// Converts a [finite] [`f64`] to a `Number`. Infinite or `NaN` values
    /// are not valid `Number`s.
    ///
    /// [finite]: f64::is_finite
    pub fn from_f64(f: f64) -> Option<Number> {
        f.is_finite().then_some(Number {
            n: NumberImpl::Float(f),
        })
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.n {
            NumberImpl::PosInt(u) => write!(f, "{u}"),
            NumberImpl::NegInt(i) => write!(f, "{i}"),
            NumberImpl::Float(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({self})")
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.n {
            NumberImpl::PosInt(u) => serializer.serialize_u64(u),
            NumberImpl::NegInt(i) => serializer.serialize_i64(i),
            NumberImpl::Float(f) => serializer.serialize_f64(f),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct NumberVisitor;

        impl Visitor<'_> for NumberVisitor {
            type Value = Number;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(v.into())
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(v.into())
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Number::from_f64(v).ok_or_else(|| de::Error::custom("number must be finite"))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

macro_rules! from_unsigned {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(u: $ty) -> Self {
                    Number { n: NumberImpl::PosInt(u as u64) }
                }
            }
        )*
    };
}

macro_rules! from_signed {
    ($($ty:ty)*) => {
        $(
            impl From<$ty> for Number {
                fn from(i: $ty) -> Self {
                    let n = if i < 0 {
                        NumberImpl::NegInt(i as i64)
                    } else {
                        NumberImpl::PosInt(i as u64)
                    };
                    Number { n }
                }
            }
        )*
    };
}

from_unsigned! { u8 u16 u32 u64 usize }
from_signed! { i8 i16 i32 i64 isize }

impl From<f64> for Number {
    /// # Panics
    ///
    /// Panics if the value is `NaN` or infinite, use [`Number::from_f64`]
    /// for a fallible conversion.
    fn from(f: f64) -> Self {
        Number::from_f64(f).expect("float must be finite")
    }
}
