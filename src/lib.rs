//! Livegraph
//!
//! An in-memory, schema-aware graph store with reference-identity
//! preservation and live queries.
//!
//! # Architecture
//!
//! - `graph`: ordered edge lists, arena node storage and the schema graph.
//!   Literal values are interned per (type, property, value) and object
//!   references resolve to a single registry node, so shared values compare
//!   by identity.
//! - `matcher`: the query oracle used by reads and live queries.
//! - `live`: channel registry and the match-then-broadcast dispatch pass.
//! - `gateway`: read/write/watch/unwatch over shared, locked state.
//! - `config`: runtime options, loadable from YAML.
//!
//! ## Example Usage
//!
//! ```rust
//! use livegraph::graph::{GraphDocument, ObjectDecl, PropertyDecl, SchemaGraph, TypeDecl};
//! use livegraph::GraphConfig;
//! use serde_json::json;
//!
//! let doc = GraphDocument::new()
//!     .with_type(
//!         TypeDecl::new("type:person", "Person")
//!             .property(PropertyDecl::new("name", "Name", true, "string"))
//!             .property(PropertyDecl::new("knows", "Knows", false, "type:person")),
//!     )
//!     .with_object(
//!         ObjectDecl::new("/person/alice", "type:person")
//!             .with("name", json!("Alice"))
//!             .with("knows", json!(["/person/bob"])),
//!     )
//!     .with_object(ObjectDecl::new("/person/bob", "type:person").with("name", json!("Bob")));
//!
//! let graph = SchemaGraph::from_document(&doc, GraphConfig::default()).unwrap();
//! let alice = graph.get_object("/person/alice").unwrap();
//! let bob = alice.first("knows").unwrap();
//! assert_eq!(bob.value("name").unwrap(), "Bob");
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod gateway;
pub mod graph;
pub mod live;
pub mod matcher;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, GraphConfig};
pub use gateway::RequestGateway;
pub use graph::{
    GraphDocument, GraphError, GraphResult, Key, NodeId, NodeRef, NodeSnapshot, ObjectDecl,
    OrderedMap, PropertyValue, Resolved, SchemaGraph,
};
pub use live::{
    BroadcastError, Broadcaster, ChannelBroadcaster, DispatchEngine, DispatchReport,
    Notification, SessionContext, SubscriberId, SubscriptionRegistry,
};
pub use matcher::{FieldMatcher, QueryMatcher};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
