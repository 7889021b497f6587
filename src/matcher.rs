//! Predicate oracle used by reads and live-query dispatch
//!
//! The query language itself is not defined by this crate. Anything that can
//! answer "does this node match this query" plugs in through `QueryMatcher`;
//! closures work too. `FieldMatcher` is the built-in default.

use crate::graph::NodeSnapshot;
use serde_json::Value;

/// Decides whether a node matches an opaque JSON query
pub trait QueryMatcher: Send + Sync {
    /// Reject queries the matcher cannot evaluate
    fn validate(&self, _query: &Value) -> Result<(), String> {
        Ok(())
    }

    fn matches(&self, node: &NodeSnapshot, query: &Value) -> bool;
}

impl<F> QueryMatcher for F
where
    F: Fn(&NodeSnapshot, &Value) -> bool + Send + Sync,
{
    fn matches(&self, node: &NodeSnapshot, query: &Value) -> bool {
        self(node, query)
    }
}

/// Field-equality matcher
///
/// The query is a JSON object; every field must match. `type` and `id`
/// compare against the node's type and id. For array-valued properties a
/// scalar matches when it is contained, an array only when equal. `null`
/// matches a missing property. A `null` or empty query matches everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMatcher;

impl FieldMatcher {
    fn field_matches(node: &NodeSnapshot, field: &str, expected: &Value) -> bool {
        match field {
            "type" => expected.as_str() == Some(node.type_id.as_str()),
            "id" => expected.as_str() == Some(node.id.as_str()),
            _ => match node.property(field) {
                None => expected.is_null(),
                Some(Value::Array(items)) => match expected {
                    Value::Array(_) => node.property(field) == Some(expected),
                    scalar => items.contains(scalar),
                },
                Some(actual) => actual == expected,
            },
        }
    }
}

impl QueryMatcher for FieldMatcher {
    fn validate(&self, query: &Value) -> Result<(), String> {
        match query {
            Value::Null | Value::Object(_) => Ok(()),
            other => Err(format!("expected an object, got {}", other)),
        }
    }

    fn matches(&self, node: &NodeSnapshot, query: &Value) -> bool {
        match query {
            Value::Null => true,
            Value::Object(fields) => fields
                .iter()
                .all(|(field, expected)| Self::field_matches(node, field, expected)),
            _ => false,
        }
    }
}
