//! Element identifiers, property values and their hashable index projection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a vertex or edge, unique within its element kind.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        ElementId(value)
    }
}

/// Property value stored in an element's [`crate::Dictionary`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "null"),
            PropValue::Bool(v) => write!(f, "{v}"),
            PropValue::Int(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Str(v) => write!(f, "{v}"),
            PropValue::Bytes(v) => write!(f, "bytes(len={})", v.len()),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(value: Vec<u8>) -> Self {
        PropValue::Bytes(value)
    }
}

/// Hashable projection of a [`PropValue`] used as the key of an index entry.
///
/// `Null` has no projection: an element whose indexed property is null is not
/// applicable to the index. Floats are keyed by their normalised bit pattern so
/// `-0.0` and `0.0` share an entry and every NaN maps to one entry.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum IndexValue {
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer value.
    Int(i64),
    /// Normalised IEEE-754 bit pattern.
    Float(u64),
    /// String value.
    Str(String),
    /// Byte string value.
    Bytes(Vec<u8>),
}

impl IndexValue {
    /// Projects a property value, returning `None` for values that cannot be indexed.
    pub fn from_prop(value: &PropValue) -> Option<Self> {
        match value {
            PropValue::Null => None,
            PropValue::Bool(b) => Some(IndexValue::Bool(*b)),
            PropValue::Int(i) => Some(IndexValue::Int(*i)),
            PropValue::Float(f) => Some(IndexValue::Float(float_key(*f))),
            PropValue::Str(s) => Some(IndexValue::Str(s.clone())),
            PropValue::Bytes(b) => Some(IndexValue::Bytes(b.clone())),
        }
    }

    /// Converts the key back into the property value it was projected from.
    pub fn to_prop(&self) -> PropValue {
        match self {
            IndexValue::Bool(b) => PropValue::Bool(*b),
            IndexValue::Int(i) => PropValue::Int(*i),
            IndexValue::Float(bits) => PropValue::Float(f64::from_bits(*bits)),
            IndexValue::Str(s) => PropValue::Str(s.clone()),
            IndexValue::Bytes(b) => PropValue::Bytes(b.clone()),
        }
    }
}

impl From<&PropValue> for Option<IndexValue> {
    fn from(value: &PropValue) -> Self {
        IndexValue::from_prop(value)
    }
}

fn float_key(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}
