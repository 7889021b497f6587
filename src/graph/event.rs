//! Graph change data
//!
//! Writes report the objects they touched as `NodeSnapshot`s. Snapshots are
//! owned, JSON-shaped copies of an object, so they can be matched against
//! channel queries and handed to a transport without holding the graph lock.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-shaped copy of one object
///
/// Unique literal properties render as scalars, multi-valued ones as arrays,
/// object references as ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,

    #[serde(rename = "type")]
    pub type_id: String,

    #[serde(flatten)]
    pub properties: IndexMap<String, Value>,
}

impl NodeSnapshot {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: Value) -> Self {
        self.properties.insert(property.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn to_json(&self) -> Value {
        // a struct of strings and JSON values always serializes
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
