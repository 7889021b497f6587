//! Core graph implementation
//!
//! This module implements the schema graph data model with:
//! - Ordered, keyed edge lists shared by every node (`OrderedMap`)
//! - Arena storage with id-based node identity (`NodeStore`)
//! - Schema types, typed objects and interned literal leaves (`SchemaGraph`)
//! - JSON-shaped object snapshots for reads and change notifications

pub mod document;
pub mod event;
pub mod node;
pub mod ordered_map;
pub mod property;
pub mod schema;
pub mod store;
pub mod types;

// Re-export main types
pub use document::{GraphDocument, ObjectDecl, PropertyDecl, TypeDecl};
pub use event::NodeSnapshot;
pub use node::{GraphNode, NodeKind, NodeRef, Resolved, PROPERTIES_EDGE, VALUES_EDGE};
pub use ordered_map::{comparators, OrderedMap};
pub use property::PropertyValue;
pub use schema::{group_by_type, ReadOptions, SchemaGraph};
pub use store::{GraphError, GraphResult, NodeStore};
pub use types::{ExpectedType, Key, NodeId, PropertyKind, ValueType};
