//! Scalar payloads carried by graph nodes

use super::types::{Key, ValueType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Scalar payload of a literal node
///
/// Multi-valued properties are modeled as edge lists, so there is no array
/// or map variant here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(i64), // Unix timestamp in milliseconds
    Null,
}

/// Hashable identity of a literal, used by the interning index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralKey {
    Null,
    String(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
    DateTime(i64),
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value, integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get datetime value if this is a datetime
    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            PropertyValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::DateTime(_) => "DateTime",
            PropertyValue::Null => "Null",
        }
    }

    /// Interning identity. Floats compare by bit pattern.
    pub fn literal_key(&self) -> LiteralKey {
        match self {
            PropertyValue::String(s) => LiteralKey::String(s.clone()),
            PropertyValue::Integer(i) => LiteralKey::Integer(*i),
            PropertyValue::Float(f) => LiteralKey::Float(f.to_bits()),
            PropertyValue::Boolean(b) => LiteralKey::Boolean(*b),
            PropertyValue::DateTime(dt) => LiteralKey::DateTime(*dt),
            PropertyValue::Null => LiteralKey::Null,
        }
    }

    /// Key under which this literal is attached in an edge list
    pub fn edge_key(&self) -> Key {
        match self {
            PropertyValue::String(s) => Key::Str(s.clone()),
            PropertyValue::Integer(i) | PropertyValue::DateTime(i) => Key::Int(*i),
            PropertyValue::Float(f) => Key::Str(f.to_string()),
            PropertyValue::Boolean(b) => Key::Str(b.to_string()),
            PropertyValue::Null => Key::Null,
        }
    }

    /// Convert any scalar JSON value, `None` for arrays and objects
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(PropertyValue::Null),
            Value::Bool(b) => Some(PropertyValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(PropertyValue::Integer(i)),
                None => n.as_f64().map(PropertyValue::Float),
            },
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert a JSON value only if it fits the expected literal kind
    pub fn coerce(value: &Value, kind: ValueType) -> Option<Self> {
        match (kind, value) {
            (_, Value::Null) => Some(PropertyValue::Null),
            (ValueType::String, Value::String(s)) => Some(PropertyValue::String(s.clone())),
            (ValueType::Number, Value::Number(_)) => Self::from_json(value),
            (ValueType::Boolean, Value::Bool(b)) => Some(PropertyValue::Boolean(*b)),
            (ValueType::Date, Value::Number(n)) => n.as_i64().map(PropertyValue::DateTime),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::Integer(i) | PropertyValue::DateTime(i) => Value::from(*i),
            PropertyValue::Float(f) => Value::from(*f),
            PropertyValue::Boolean(b) => Value::Bool(*b),
            PropertyValue::Null => Value::Null,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::DateTime(dt) => write!(f, "DateTime({})", dt),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl PartialEq<&str> for PropertyValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_string() == Some(*other)
    }
}

impl PartialEq<i64> for PropertyValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_integer() == Some(*other)
    }
}
