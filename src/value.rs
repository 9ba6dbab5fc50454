//! The language-neutral value shapes that cross the public API (§6).
//!
//! Values never borrow from the codec or the input buffer: encoding takes
//! an owned `Value`, decoding produces an owned `Value`. This mirrors the
//! teacher's own [`types::Integer`](../types/integer.rs) duality of a
//! native-width integer with a `BigInt` fallback for anything outside the
//! platform-safe range.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::collections::BTreeMap;
use std::fmt;

/// The inclusive safe-integer range mirrored from JavaScript's
/// `Number.isSafeInteger`: values in this range round-trip exactly through
/// a native `i64` and back; values outside it are kept as [`BigInt`].
pub const SAFE_INTEGER_MIN: i64 = -(2i64.pow(53)) + 1;
pub const SAFE_INTEGER_MAX: i64 = 2i64.pow(53) - 1;

/// An INTEGER value: native when it fits the safe-integer range, an
/// arbitrary-precision [`BigInt`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integer {
    Native(i64),
    Big(BigInt),
}

impl Integer {
    /// Narrow a [`BigInt`] to [`Integer::Native`] when it fits the safe
    /// range, otherwise keep it as [`Integer::Big`].
    pub fn from_big(value: BigInt) -> Self {
        match value.to_i64() {
            Some(native) if (SAFE_INTEGER_MIN..=SAFE_INTEGER_MAX).contains(&native) => {
                Integer::Native(native)
            }
            _ => Integer::Big(value),
        }
    }

    /// View this integer as a [`BigInt`], regardless of representation.
    pub fn to_big(&self) -> BigInt {
        match self {
            Integer::Native(n) => BigInt::from(*n),
            Integer::Big(b) => b.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Integer::Native(n) => *n == 0,
            Integer::Big(b) => b.is_zero(),
        }
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Native(n) => write!(f, "{n}"),
            Integer::Big(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::Native(value)
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer::from_big(value)
    }
}

/// The name-or-number shape ENUMERATED accepts on encode; decode always
/// produces [`EnumeratedValue::Name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumeratedValue {
    Name(String),
    Number(i64),
}

impl From<&str> for EnumeratedValue {
    fn from(value: &str) -> Self {
        EnumeratedValue::Name(value.to_string())
    }
}

impl From<i64> for EnumeratedValue {
    fn from(value: i64) -> Self {
        EnumeratedValue::Number(value)
    }
}

/// A dynamic ASN.1 value crossing the `encode`/`decode` boundary.
///
/// SEQUENCE members are an ordered `Vec` of `(name, value)` pairs rather
/// than a `BTreeMap`: §3 requires lookup by name on encode (unordered
/// input) but §8's "SEQUENCE ordering" property only constrains the
/// *encoded bytes*, not how the caller's map iterates, so a `Vec` keeps
/// `Debug` output stable without forcing a dependency on an order-
/// preserving map crate the teacher doesn't already use.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(Integer),
    Boolean(bool),
    Bytes(Vec<u8>),
    /// Encode-only convenience: a hexadecimal string, non-hex characters
    /// stripped before encoding (§4.2 OCTET STRING).
    HexString(String),
    Null,
    Enumerated(EnumeratedValue),
    Sequence(Vec<(String, Value)>),
    SequenceOf(Vec<Value>),
    Choice(String, Box<Value>),
}

impl Value {
    pub fn integer(value: i64) -> Self {
        Value::Integer(Integer::Native(value))
    }

    pub fn big_integer(value: BigInt) -> Self {
        Value::Integer(Integer::from_big(value))
    }

    pub fn sequence(members: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Value::Sequence(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn choice(name: impl Into<String>, inner: Value) -> Self {
        Value::Choice(name.into(), Box::new(inner))
    }

    /// Look up a SEQUENCE member by name. `None` if `self` is not a
    /// `Sequence` or the member is absent.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Sequence(members) => members.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert a `Sequence` value into a lookup map, used internally by
    /// the SEQUENCE codec so repeated member lookups are not linear scans.
    pub(crate) fn as_member_map(&self) -> Option<BTreeMap<&str, &Value>> {
        match self {
            Value::Sequence(members) => {
                Some(members.iter().map(|(k, v)| (k.as_str(), v)).collect())
            }
            _ => None,
        }
    }
}
