//! Core type definitions for the schema graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside the node store arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// Key of an ordered map entry (edge keys, partition keys)
///
/// `Null` is a real key. Absence is expressed with `Option::None` at the
/// call site and is never a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Key {
    Null,
    Int(i64),
    Str(String),
}

impl Key {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Key::Null)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Null => write!(f, "null"),
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i as i64)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Int(i as i64)
    }
}

/// Literal kinds a property can expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Date,
}

impl ValueType {
    /// Parse a literal kind name, `None` for anything else (an object type id)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "boolean" => Some(ValueType::Boolean),
            "date" => Some(ValueType::Date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a property points at: a literal kind or objects of a given type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedType {
    Literal(ValueType),
    Object(String),
}

impl ExpectedType {
    /// Literal kind names map to `Literal`, everything else is a type id
    pub fn parse(name: &str) -> Self {
        match ValueType::parse(name) {
            Some(kind) => ExpectedType::Literal(kind),
            None => ExpectedType::Object(name.to_string()),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ExpectedType::Object(_))
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedType::Literal(kind) => write!(f, "{}", kind),
            ExpectedType::Object(type_id) => write!(f, "{}", type_id),
        }
    }
}

/// Cardinality and value-kind of a property, switched on by schema access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    UniqueValue,
    MultiValue,
    UniqueObject,
    MultiObject,
}

impl PropertyKind {
    pub fn new(unique: bool, expected: &ExpectedType) -> Self {
        match (unique, expected.is_object()) {
            (true, false) => PropertyKind::UniqueValue,
            (false, false) => PropertyKind::MultiValue,
            (true, true) => PropertyKind::UniqueObject,
            (false, true) => PropertyKind::MultiObject,
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, PropertyKind::UniqueValue | PropertyKind::UniqueObject)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, PropertyKind::UniqueObject | PropertyKind::MultiObject)
    }
}
