//! In-memory node storage
//!
//! Every `GraphNode` lives in a flat arena indexed by `NodeId`. Edges are ids
//! into the same arena, so shared targets and cycles need no ownership tricks
//! and node identity is simply "same index".

use super::node::{GraphNode, NodeKind, NodeRef};
use super::property::PropertyValue;
use super::types::{Key, NodeId};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Object {0} not found")]
    ObjectNotFound(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Type {type_id} has no property {property}")]
    UnknownProperty { type_id: String, property: String },

    #[error("Unresolved reference to {0}")]
    UnresolvedReference(String),

    #[error("{0} is not a typed object")]
    NotAnObject(String),

    #[error("Object {id} is of type {existing}, cannot become {requested}")]
    TypeConflict {
        id: String,
        existing: String,
        requested: String,
    },

    #[error("Invalid value for property {property}: {reason}")]
    InvalidValue { property: String, reason: String },

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Arena owning every node of a graph
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<GraphNode>,
}

impl NodeStore {
    /// Create a new empty store
    pub fn new() -> Self {
        NodeStore {
            nodes: Vec::with_capacity(1024),
        }
    }

    /// Create a node and return its id
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        key: impl Into<String>,
        payload: Option<PropertyValue>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(GraphNode::new(id, kind, key, payload));
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(id.index())
    }

    /// Borrowed view that can follow edges
    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.node(id).map(|node| NodeRef::new(self, node))
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Attach `target` under `source`'s `property` edge list
    pub fn link(
        &mut self,
        source: NodeId,
        property: &str,
        key: impl Into<Key>,
        target: NodeId,
    ) -> GraphResult<()> {
        if !self.has_node(target) {
            return Err(GraphError::NodeNotFound(target));
        }
        let node = self
            .node_mut(source)
            .ok_or(GraphError::NodeNotFound(source))?;
        node.set(property, key, target);
        Ok(())
    }

    /// Replace a node's payload; visible through every edge pointing at it
    pub fn set_payload(&mut self, id: NodeId, payload: PropertyValue) -> GraphResult<()> {
        let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.payload = Some(payload);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges across all nodes
    pub fn edge_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| {
                node.properties()
                    .filter_map(|p| node.edges(p))
                    .map(|list| list.len())
                    .sum::<usize>()
            })
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.nodes.iter().map(move |node| NodeRef::new(self, node))
    }
}
