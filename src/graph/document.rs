//! Raw construction input for a schema graph
//!
//! The JSON form is a single object keyed by node id. Entries whose `"type"`
//! is `"type"` declare schema types, every other entry is an object whose
//! `"type"` names its type and whose remaining fields are property values:
//!
//! ```json
//! {
//!   "type:document": {
//!     "type": "type",
//!     "name": "Document",
//!     "properties": {
//!       "title": { "name": "Title", "unique": true, "expected_type": "string" }
//!     }
//!   },
//!   "/doc/protovis": { "type": "type:document", "title": "Protovis" }
//! }
//! ```

use super::store::{GraphError, GraphResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker value of `"type"` for schema type entries
pub const TYPE_MARKER: &str = "type";

/// Declared property of a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub unique: bool,
    /// Literal kind (`string`, `number`, `boolean`, `date`) or an object type id
    pub expected_type: String,
}

impl PropertyDecl {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        unique: bool,
        expected_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            unique,
            expected_type: expected_type.into(),
        }
    }
}

/// Declared schema type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
}

impl TypeDecl {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }
}

/// Declared object, also the shape of a write delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub id: String,
    pub type_id: String,
    /// Property key to a scalar, an array of scalars, or object ids
    #[serde(default)]
    pub values: IndexMap<String, Value>,
}

impl ObjectDecl {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            values: IndexMap::new(),
        }
    }

    pub fn with(mut self, property: impl Into<String>, value: Value) -> Self {
        self.values.insert(property.into(), value);
        self
    }

    /// Parse one `id -> { "type": .., props.. }` entry
    pub fn from_entry(id: &str, entry: &Value) -> GraphResult<Self> {
        let fields = as_object(id, entry)?;
        let type_id = type_field(id, fields)?;

        let values = fields
            .iter()
            .filter(|(field, _)| field.as_str() != "type")
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        Ok(Self {
            id: id.to_string(),
            type_id: type_id.to_string(),
            values,
        })
    }

    /// Parse a batch of write deltas keyed by object id
    pub fn parse_batch(deltas: &Value) -> GraphResult<Vec<Self>> {
        let entries = deltas.as_object().ok_or_else(|| {
            GraphError::MalformedDocument("write deltas must be an object keyed by id".to_string())
        })?;
        entries
            .iter()
            .map(|(id, entry)| Self::from_entry(id, entry))
            .collect()
    }
}

/// Types and objects to build a graph from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub types: Vec<TypeDecl>,
    pub objects: Vec<ObjectDecl>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_object(mut self, decl: ObjectDecl) -> Self {
        self.objects.push(decl);
        self
    }

    pub fn from_json_str(source: &str) -> GraphResult<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| GraphError::MalformedDocument(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Split a JSON document into type and object declarations, keeping order
    pub fn from_json(document: &Value) -> GraphResult<Self> {
        let entries = document.as_object().ok_or_else(|| {
            GraphError::MalformedDocument("document must be an object keyed by id".to_string())
        })?;

        let mut doc = GraphDocument::new();
        for (id, entry) in entries {
            let fields = as_object(id, entry)?;
            if type_field(id, fields)? == TYPE_MARKER {
                doc.types.push(parse_type(id, fields)?);
            } else {
                doc.objects.push(ObjectDecl::from_entry(id, entry)?);
            }
        }
        Ok(doc)
    }
}

fn as_object<'v>(id: &str, entry: &'v Value) -> GraphResult<&'v Map<String, Value>> {
    entry
        .as_object()
        .ok_or_else(|| GraphError::MalformedDocument(format!("entry {} is not an object", id)))
}

fn type_field<'v>(id: &str, fields: &'v Map<String, Value>) -> GraphResult<&'v str> {
    fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GraphError::MalformedDocument(format!("entry {} has no type", id)))
}

fn parse_type(id: &str, fields: &Map<String, Value>) -> GraphResult<TypeDecl> {
    let name = fields.get("name").and_then(Value::as_str).unwrap_or(id);
    let mut decl = TypeDecl::new(id, name);

    let Some(properties) = fields.get("properties") else {
        return Ok(decl);
    };
    let properties = properties.as_object().ok_or_else(|| {
        GraphError::MalformedDocument(format!("properties of {} must be an object", id))
    })?;

    for (key, spec) in properties {
        let expected_type = spec
            .get("expected_type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GraphError::MalformedDocument(format!(
                    "property {}.{} has no expected_type",
                    id, key
                ))
            })?;
        let name = spec.get("name").and_then(Value::as_str).unwrap_or(key);
        let unique = spec.get("unique").and_then(Value::as_bool).unwrap_or(false);
        decl.properties
            .push(PropertyDecl::new(key.as_str(), name, unique, expected_type));
    }
    Ok(decl)
}
