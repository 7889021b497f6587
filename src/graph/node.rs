//! Node implementation for the schema graph
//!
//! A `GraphNode` is either a literal leaf (payload, no edges) or an entity with
//! named, ordered, multi-valued edge lists. Edges hold `NodeId`s into the
//! owning `NodeStore`; `NodeRef` resolves them back into nodes and payloads.

use super::ordered_map::OrderedMap;
use super::property::PropertyValue;
use super::store::{GraphError, GraphResult, NodeStore};
use super::types::{ExpectedType, Key, NodeId, PropertyKind};
use indexmap::IndexMap;
use std::fmt;

/// Edge list of a Type node pointing at its Property nodes
pub const PROPERTIES_EDGE: &str = "properties";

/// Edge list of a Property node pointing at every interned literal
pub const VALUES_EDGE: &str = "values";

/// What a node stands for
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Free-standing node created directly on a store
    Plain,
    /// Interned scalar leaf
    Literal,
    /// Schema type
    Type { name: String },
    /// Property declared on a type
    Property {
        name: String,
        kind: PropertyKind,
        expected: ExpectedType,
    },
    /// Typed object, `type_id` is `None` while it is only a forward reference
    Object { type_id: Option<NodeId> },
}

/// A node in the schema graph
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Arena index of this node
    pub id: NodeId,

    /// Registry key (type id, property key, object id or literal text)
    pub key: String,

    pub kind: NodeKind,

    /// Scalar payload, set on literal leaves
    pub payload: Option<PropertyValue>,

    edges: IndexMap<String, OrderedMap<Key, NodeId>>,
}

impl GraphNode {
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        key: impl Into<String>,
        payload: Option<PropertyValue>,
    ) -> Self {
        GraphNode {
            id,
            key: key.into(),
            kind,
            payload,
            edges: IndexMap::new(),
        }
    }

    /// Append (or overwrite in place) an edge under `property`
    pub fn set(&mut self, property: &str, key: impl Into<Key>, target: NodeId) {
        self.edges
            .entry(property.to_string())
            .or_default()
            .set(key, target);
    }

    /// Full edge list for `property`, empty if the node has none
    pub fn all(&self, property: &str) -> OrderedMap<Key, NodeId> {
        self.edges.get(property).cloned().unwrap_or_default()
    }

    /// Borrowed edge list, if present
    pub fn edges(&self, property: &str) -> Option<&OrderedMap<Key, NodeId>> {
        self.edges.get(property)
    }

    pub fn first(&self, property: &str) -> Option<NodeId> {
        self.edges.get(property).and_then(|list| list.first().copied())
    }

    pub fn get(&self, property: &str, key: impl Into<Key>) -> Option<NodeId> {
        self.edges
            .get(property)
            .and_then(|list| list.get(key).copied())
    }

    /// Swap in a whole edge list, returning the previous one
    pub fn replace(
        &mut self,
        property: &str,
        list: OrderedMap<Key, NodeId>,
    ) -> Option<OrderedMap<Key, NodeId>> {
        self.edges.insert(property.to_string(), list)
    }

    /// Move an edge of `property` to a new key, keeping its position
    pub fn rekey(&mut self, property: &str, old: Key, new: Key) -> bool {
        self.edges
            .get_mut(property)
            .is_some_and(|list| list.rekey(old, new))
    }

    /// Names of the edge lists, in first-use order
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object { .. })
    }

    /// Type of an object node
    pub fn type_id(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Object { type_id } => type_id,
            _ => None,
        }
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl std::hash::Hash for GraphNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Borrowed view of a node that resolves edges through its store
///
/// Two `NodeRef`s are equal when they point at the same slot of the same
/// store, which is how node identity is compared.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    store: &'a NodeStore,
    node: &'a GraphNode,
}

/// Result of schema-driven property access
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// unique literal property
    Value(Option<PropertyValue>),
    /// unique object property
    Node(Option<NodeRef<'a>>),
    /// multi-valued literal property
    Values(OrderedMap<Key, PropertyValue>),
    /// multi-valued object property
    Nodes(OrderedMap<Key, NodeRef<'a>>),
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(store: &'a NodeStore, node: &'a GraphNode) -> Self {
        NodeRef { store, node }
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn key(&self) -> &'a str {
        &self.node.key
    }

    pub fn kind(&self) -> &'a NodeKind {
        &self.node.kind
    }

    pub fn node(&self) -> &'a GraphNode {
        self.node
    }

    pub fn payload(&self) -> Option<&'a PropertyValue> {
        self.node.payload.as_ref()
    }

    fn resolve(&self, id: NodeId) -> Option<NodeRef<'a>> {
        self.store.node_ref(id)
    }

    /// Edge list resolved into nodes
    pub fn all(&self, property: &str) -> OrderedMap<Key, NodeRef<'a>> {
        match self.node.edges(property) {
            Some(list) => list
                .iter()
                .filter_map(|(key, id)| self.resolve(*id).map(|n| (key.clone(), n)))
                .collect(),
            None => OrderedMap::new(),
        }
    }

    pub fn first(&self, property: &str) -> Option<NodeRef<'a>> {
        self.node.first(property).and_then(|id| self.resolve(id))
    }

    /// A specific edge by key
    pub fn get_edge(&self, property: &str, key: impl Into<Key>) -> Option<NodeRef<'a>> {
        self.node.get(property, key).and_then(|id| self.resolve(id))
    }

    /// Payloads of the targets, same keys and order as `all`
    pub fn values(&self, property: &str) -> OrderedMap<Key, PropertyValue> {
        self.all(property)
            .map(|target| target.payload().cloned().unwrap_or(PropertyValue::Null))
    }

    /// Payload of `first(property)`
    pub fn value(&self, property: &str) -> Option<PropertyValue> {
        self.first(property)
            .map(|target| target.payload().cloned().unwrap_or(PropertyValue::Null))
    }

    /// Type node of an object
    pub fn type_node(&self) -> Option<NodeRef<'a>> {
        self.node.type_id().and_then(|id| self.resolve(id))
    }

    /// Display name of a type or property node
    pub fn name(&self) -> Option<&'a str> {
        match &self.node.kind {
            NodeKind::Type { name } | NodeKind::Property { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn property_kind(&self) -> Option<PropertyKind> {
        match &self.node.kind {
            NodeKind::Property { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn expected_type(&self) -> Option<&'a ExpectedType> {
        match &self.node.kind {
            NodeKind::Property { expected, .. } => Some(expected),
            _ => None,
        }
    }

    /// Property node declared for `property` on this object's type
    pub fn property_decl(&self, property: &str) -> GraphResult<NodeRef<'a>> {
        let type_node = self
            .type_node()
            .ok_or_else(|| GraphError::NotAnObject(self.node.key.clone()))?;
        type_node
            .get_edge(PROPERTIES_EDGE, property)
            .ok_or_else(|| GraphError::UnknownProperty {
                type_id: type_node.key().to_string(),
                property: property.to_string(),
            })
    }

    /// Schema-driven access, dispatching on the property's cardinality and kind
    pub fn get(&self, property: &str) -> GraphResult<Resolved<'a>> {
        let decl = self.property_decl(property)?;
        let kind = decl
            .property_kind()
            .ok_or_else(|| GraphError::NotAnObject(decl.key().to_string()))?;

        Ok(match kind {
            PropertyKind::UniqueValue => Resolved::Value(self.value(property)),
            PropertyKind::UniqueObject => Resolved::Node(self.first(property)),
            PropertyKind::MultiValue => Resolved::Values(self.values(property)),
            PropertyKind::MultiObject => Resolved::Nodes(self.all(property)),
        })
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.node.id == other.node.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.node.id)
            .field("key", &self.node.key)
            .finish()
    }
}

impl<'a> Resolved<'a> {
    pub fn as_value(&self) -> Option<&PropertyValue> {
        match self {
            Resolved::Value(value) => value.as_ref(),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeRef<'a>> {
        match self {
            Resolved::Node(node) => *node,
            _ => None,
        }
    }

    pub fn as_values(&self) -> Option<&OrderedMap<Key, PropertyValue>> {
        match self {
            Resolved::Values(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&OrderedMap<Key, NodeRef<'a>>> {
        match self {
            Resolved::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn into_nodes(self) -> Option<OrderedMap<Key, NodeRef<'a>>> {
        match self {
            Resolved::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Number of values or nodes held
    pub fn len(&self) -> usize {
        match self {
            Resolved::Value(value) => usize::from(value.is_some()),
            Resolved::Node(node) => usize::from(node.is_some()),
            Resolved::Values(values) => values.len(),
            Resolved::Nodes(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countries {
        store: NodeStore,
        austrian: NodeId,
        german: NodeId,
        eu: NodeId,
        austria: NodeId,
    }

    fn countries() -> Countries {
        let mut store = NodeStore::new();
        let austrian = store.create_node(NodeKind::Plain, "austrian", Some("Austrian".into()));
        let german = store.create_node(NodeKind::Plain, "german", Some("German".into()));
        let eu = store.create_node(NodeKind::Plain, "eu", None);
        let austria = store.create_node(NodeKind::Plain, "austria", None);
        let barroso = store.create_node(NodeKind::Plain, "barroso", Some("Barroso".into()));

        store.link(austria, "languages", "at", austrian).unwrap();
        store.link(austria, "languages", "ger", german).unwrap();
        store.link(eu, "president", "barroso", barroso).unwrap();

        Countries { store, austrian, german, eu, austria }
    }

    #[test]
    fn test_connected_nodes_keep_order() {
        let c = countries();
        let austria = c.store.node_ref(c.austria).unwrap();

        let languages = austria.all("languages");
        assert_eq!(languages.len(), 2);
        assert_eq!(languages.at(0).unwrap().id(), c.austrian);
        assert_eq!(languages.at(1).unwrap().id(), c.german);
        assert_eq!(austria.get_edge("languages", "ger").unwrap().id(), c.german);
        assert!(austria.get_edge("languages", "fr").is_none());
    }

    #[test]
    fn test_first_connected_node() {
        let c = countries();
        let eu = c.store.node_ref(c.eu).unwrap();

        let president = eu.first("president").unwrap();
        assert_eq!(president.payload(), Some(&PropertyValue::from("Barroso")));
        assert!(eu.first("members").is_none());
        assert!(eu.all("members").is_empty());
    }

    #[test]
    fn test_values_and_value() {
        let c = countries();
        let austria = c.store.node_ref(c.austria).unwrap();
        let eu = c.store.node_ref(c.eu).unwrap();

        let values = austria.values("languages");
        assert_eq!(values.at(0).unwrap(), &PropertyValue::from("Austrian"));
        assert_eq!(values.get("ger"), Some(&PropertyValue::from("German")));
        assert_eq!(austria.value("languages"), Some(PropertyValue::from("Austrian")));

        // unique properties are single-entry edge lists
        assert_eq!(eu.all("president").len(), 1);
        assert_eq!(eu.values("president").first(), Some(&PropertyValue::from("Barroso")));
        assert_eq!(eu.value("president"), Some(PropertyValue::from("Barroso")));
    }

    #[test]
    fn test_null_edge_key() {
        let mut store = NodeStore::new();
        let root = store.create_node(NodeKind::Plain, "root", Some("RootNode".into()));
        let null_node = store.create_node(NodeKind::Plain, "null", Some(PropertyValue::Null));
        store.link(root, "values", Key::Null, null_node).unwrap();

        let root = store.node_ref(root).unwrap();
        assert_eq!(root.get_edge("values", Key::Null).unwrap().id(), null_node);
        assert_eq!(root.value("values"), Some(PropertyValue::Null));
    }

    #[test]
    fn test_shared_targets_are_identical() {
        let mut c = countries();
        let germany = c.store.create_node(NodeKind::Plain, "germany", None);
        c.store.link(germany, "languages", "ger", c.german).unwrap();

        let austria = c.store.node_ref(c.austria).unwrap();
        let germany = c.store.node_ref(germany).unwrap();
        assert_eq!(
            austria.get_edge("languages", "ger").unwrap(),
            germany.first("languages").unwrap()
        );
    }

    #[test]
    fn test_schema_get_requires_object() {
        let c = countries();
        let austria = c.store.node_ref(c.austria).unwrap();
        assert_eq!(
            austria.get("languages"),
            Err(GraphError::NotAnObject("austria".to_string()))
        );
    }

    #[test]
    fn test_raw_node_edges() {
        let mut node = GraphNode::new(NodeId::new(0), NodeKind::Plain, "n", None);
        node.set("tags", "a", NodeId::new(1));
        node.set("tags", "b", NodeId::new(2));
        node.set("tags", "a", NodeId::new(3));

        assert_eq!(node.all("tags").len(), 2);
        assert_eq!(node.first("tags"), Some(NodeId::new(3)));
        assert_eq!(node.get("tags", "b"), Some(NodeId::new(2)));
        assert_eq!(node.properties().collect::<Vec<_>>(), vec!["tags"]);

        let previous = node.replace("tags", OrderedMap::new()).unwrap();
        assert_eq!(previous.len(), 2);
        assert!(node.all("tags").is_empty());
    }
}
