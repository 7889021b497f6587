//! Schema-aware graph with literal and object interning
//!
//! A `SchemaGraph` owns every node in a `NodeStore` and keeps two partitions:
//! `types` (Type nodes, each with a `properties` edge list of Property nodes)
//! and `objects`. Literal values are interned per (type, property, value) and
//! object references always resolve to the single registry node for that id,
//! so equal values and shared references compare by `NodeId`.

use super::document::{GraphDocument, ObjectDecl, TypeDecl};
use super::event::NodeSnapshot;
use super::node::{NodeKind, NodeRef, Resolved, PROPERTIES_EDGE, VALUES_EDGE};
use super::ordered_map::OrderedMap;
use super::property::{LiteralKey, PropertyValue};
use super::store::{GraphError, GraphResult, NodeStore};
use super::types::{ExpectedType, Key, NodeId, PropertyKind, ValueType};
use crate::config::GraphConfig;
use crate::matcher::QueryMatcher;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Identity of an interned literal leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InternKey {
    type_id: NodeId,
    property: String,
    literal: LiteralKey,
}

/// Paging for `read`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ReadOptions {
    pub fn from_json(options: &Value) -> GraphResult<Self> {
        if options.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(options.clone())
            .map_err(|e| GraphError::MalformedQuery(format!("invalid options: {}", e)))
    }
}

/// Schema graph with types, objects and interned literals
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    store: NodeStore,
    types: OrderedMap<Key, NodeId>,
    objects: OrderedMap<Key, NodeId>,
    interned: FxHashMap<InternKey, NodeId>,
    /// Object ids referenced but not declared yet
    pending: IndexSet<String>,
    config: GraphConfig,
}

impl SchemaGraph {
    /// Create an empty graph
    pub fn new(config: GraphConfig) -> Self {
        SchemaGraph {
            store: NodeStore::new(),
            types: OrderedMap::new(),
            objects: OrderedMap::new(),
            interned: FxHashMap::default(),
            pending: IndexSet::new(),
            config,
        }
    }

    /// Build a graph in two passes: schema first, then objects
    ///
    /// Objects may reference ids declared later in the document. Any id that
    /// is still undeclared at the end is reported as `UnresolvedReference`.
    pub fn from_document(document: &GraphDocument, config: GraphConfig) -> GraphResult<Self> {
        let mut graph = Self::new(config);

        for decl in &document.types {
            graph.register_type(decl)?;
        }
        graph.check_schema()?;

        for decl in &document.objects {
            graph.declare_object(decl)?;
        }
        if let Some(id) = graph.pending.first() {
            return Err(GraphError::UnresolvedReference(id.clone()));
        }
        graph.check_references()?;

        info!(
            "Built schema graph: {} types, {} objects, {} interned literals",
            graph.types.len(),
            graph.objects.len(),
            graph.interned.len()
        );
        Ok(graph)
    }

    pub fn from_json(document: &Value, config: GraphConfig) -> GraphResult<Self> {
        Self::from_document(&GraphDocument::from_json(document)?, config)
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn partition(&self, ids: &OrderedMap<Key, NodeId>) -> OrderedMap<Key, NodeRef<'_>> {
        ids.iter()
            .filter_map(|(key, id)| self.store.node_ref(*id).map(|node| (key.clone(), node)))
            .collect()
    }

    /// All Type nodes keyed by type id
    pub fn types(&self) -> OrderedMap<Key, NodeRef<'_>> {
        self.partition(&self.types)
    }

    /// All Object nodes keyed by object id
    pub fn objects(&self) -> OrderedMap<Key, NodeRef<'_>> {
        self.partition(&self.objects)
    }

    pub fn get_type(&self, id: &str) -> Option<NodeRef<'_>> {
        self.types
            .get(id)
            .and_then(|node| self.store.node_ref(*node))
    }

    pub fn get_object(&self, id: &str) -> Option<NodeRef<'_>> {
        self.objects
            .get(id)
            .and_then(|node| self.store.node_ref(*node))
    }

    /// Schema-driven access to `property` of the object `object_id`
    pub fn get(&self, object_id: &str, property: &str) -> GraphResult<Resolved<'_>> {
        self.get_object(object_id)
            .ok_or_else(|| GraphError::ObjectNotFound(object_id.to_string()))?
            .get(property)
    }

    /// Objects for which `predicate` holds, in partition order
    pub fn select<F>(&self, mut predicate: F) -> OrderedMap<Key, NodeRef<'_>>
    where
        F: FnMut(&NodeRef<'_>, &Key) -> bool,
    {
        self.objects().select(|node, key| predicate(node, key))
    }

    pub fn interned_count(&self) -> usize {
        self.interned.len()
    }

    /// Replace the value of an interned literal leaf
    ///
    /// Every edge pointing at the leaf sees the new value. The leaf moves to
    /// the new value's key in the property's `values` list and in the edge
    /// list of every object holding it, keeping its position in each.
    pub fn set_literal(&mut self, id: NodeId, value: PropertyValue) -> GraphResult<()> {
        let entry = self
            .interned
            .iter()
            .find(|(_, leaf)| **leaf == id)
            .map(|(key, _)| key.clone())
            .ok_or_else(|| GraphError::InvalidValue {
                property: id.to_string(),
                reason: "not an interned literal".to_string(),
            })?;

        let (property_node, _, expected) = self.property_of(entry.type_id, &entry.property)?;
        let value = match expected {
            ExpectedType::Literal(value_type) => {
                self.literal(&entry.property, &value.to_json(), value_type)?
            }
            ExpectedType::Object(_) => value,
        };

        let taken = |other: NodeId| GraphError::InvalidValue {
            property: entry.property.clone(),
            reason: format!("value {} is already interned as {}", value, other),
        };
        let rekeyed = InternKey {
            literal: value.literal_key(),
            ..entry.clone()
        };
        if let Some(other) = self.interned.get(&rekeyed).filter(|other| **other != id) {
            return Err(taken(*other));
        }
        let new_key = value.edge_key();
        let sibling = self
            .store
            .node(property_node)
            .and_then(|property| property.get(VALUES_EDGE, new_key.clone()));
        if let Some(other) = sibling.filter(|other| *other != id) {
            return Err(taken(other));
        }

        let old_key = self
            .store
            .node(id)
            .and_then(|leaf| leaf.payload.as_ref())
            .map(PropertyValue::edge_key)
            .ok_or(GraphError::NodeNotFound(id))?;
        let holders: Vec<NodeId> = self
            .objects
            .values()
            .copied()
            .filter(|object| {
                self.store.node(*object).is_some_and(|node| {
                    node.type_id() == Some(entry.type_id)
                        && node.get(&entry.property, old_key.clone()) == Some(id)
                })
            })
            .collect();

        for holder in holders {
            if let Some(node) = self.store.node_mut(holder) {
                node.rekey(&entry.property, old_key.clone(), new_key.clone());
            }
        }
        if let Some(property) = self.store.node_mut(property_node) {
            property.rekey(VALUES_EDGE, old_key, new_key);
        }
        if let Some(leaf) = self.store.node_mut(id) {
            leaf.key = value.to_string();
        }
        self.store.set_payload(id, value)?;
        self.interned.remove(&entry);
        self.interned.insert(rekeyed, id);
        Ok(())
    }

    /// JSON-shaped copy of an object, properties in declaration order
    pub fn snapshot(&self, id: NodeId) -> GraphResult<NodeSnapshot> {
        let node = self.store.node_ref(id).ok_or(GraphError::NodeNotFound(id))?;
        let type_node = node
            .type_node()
            .ok_or_else(|| GraphError::NotAnObject(node.key().to_string()))?;

        let mut snapshot = NodeSnapshot::new(node.key(), type_node.key());
        for decl in type_node.all(PROPERTIES_EDGE).values() {
            let property = decl.key();
            if node.node().edges(property).is_none() {
                continue;
            }
            let value = match decl.property_kind() {
                Some(PropertyKind::UniqueValue) => node
                    .value(property)
                    .map(|v| v.to_json())
                    .unwrap_or(Value::Null),
                Some(PropertyKind::MultiValue) => Value::Array(
                    node.values(property).values().map(PropertyValue::to_json).collect(),
                ),
                Some(PropertyKind::UniqueObject) => node
                    .first(property)
                    .map(|target| Value::from(target.key()))
                    .unwrap_or(Value::Null),
                Some(PropertyKind::MultiObject) => Value::Array(
                    node.all(property)
                        .values()
                        .map(|target| Value::from(target.key()))
                        .collect(),
                ),
                None => continue,
            };
            snapshot.properties.insert(property.to_string(), value);
        }
        Ok(snapshot)
    }

    /// Snapshots of every object matching `query`, honoring offset/limit
    pub fn read<M>(
        &self,
        query: &Value,
        options: &Value,
        matcher: &M,
    ) -> GraphResult<OrderedMap<Key, NodeSnapshot>>
    where
        M: QueryMatcher + ?Sized,
    {
        matcher.validate(query).map_err(GraphError::MalformedQuery)?;
        let options = ReadOptions::from_json(options)?;

        let mut result = OrderedMap::new();
        let mut skipped = 0;
        for (key, id) in self.objects.iter() {
            if options.limit.is_some_and(|limit| result.len() >= limit) {
                break;
            }
            let snapshot = self.snapshot(*id)?;
            if !matcher.matches(&snapshot, query) {
                continue;
            }
            if skipped < options.offset {
                skipped += 1;
                continue;
            }
            result.set(key.clone(), snapshot);
        }
        Ok(result)
    }

    /// Create or merge objects
    ///
    /// The whole batch is validated before anything changes. Each delta
    /// replaces the edge lists of the properties it names and leaves the rest.
    /// Returns the touched objects keyed by id.
    pub fn write(&mut self, deltas: &[ObjectDecl]) -> GraphResult<OrderedMap<Key, NodeSnapshot>> {
        self.validate_write(deltas)?;

        let mut touched = Vec::with_capacity(deltas.len());
        for delta in deltas {
            touched.push(self.declare_object(delta)?);
        }

        let mut updated = OrderedMap::with_capacity(touched.len());
        for id in touched {
            let snapshot = self.snapshot(id)?;
            updated.set(snapshot.id.clone(), snapshot);
        }
        debug!("Applied write of {} objects", updated.len());
        Ok(updated)
    }

    fn register_type(&mut self, decl: &TypeDecl) -> GraphResult<NodeId> {
        if self.types.contains_key(decl.id.as_str()) {
            return Err(GraphError::MalformedDocument(format!(
                "type {} declared twice",
                decl.id
            )));
        }

        let type_node = self.store.create_node(
            NodeKind::Type {
                name: decl.name.clone(),
            },
            decl.id.as_str(),
            None,
        );
        for property in &decl.properties {
            let expected = ExpectedType::parse(&property.expected_type);
            let kind = PropertyKind::new(property.unique, &expected);
            let property_node = self.store.create_node(
                NodeKind::Property {
                    name: property.name.clone(),
                    kind,
                    expected,
                },
                property.key.as_str(),
                None,
            );
            self.store
                .link(type_node, PROPERTIES_EDGE, property.key.as_str(), property_node)?;
        }

        self.types.set(decl.id.as_str(), type_node);
        debug!("Registered type {} with {} properties", decl.id, decl.properties.len());
        Ok(type_node)
    }

    /// Every object-typed property must point at a declared type
    fn check_schema(&self) -> GraphResult<()> {
        for type_node in self.types().values() {
            for property in type_node.all(PROPERTIES_EDGE).values() {
                if let Some(ExpectedType::Object(target)) = property.expected_type() {
                    if !self.types.contains_key(target.as_str()) {
                        return Err(GraphError::UnknownType(target.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    fn type_node_id(&self, type_id: &str) -> GraphResult<NodeId> {
        self.types
            .get(type_id)
            .copied()
            .ok_or_else(|| GraphError::UnknownType(type_id.to_string()))
    }

    fn property_of(
        &self,
        type_node: NodeId,
        property: &str,
    ) -> GraphResult<(NodeId, PropertyKind, ExpectedType)> {
        let type_ref = self
            .store
            .node_ref(type_node)
            .ok_or(GraphError::NodeNotFound(type_node))?;
        let unknown = || GraphError::UnknownProperty {
            type_id: type_ref.key().to_string(),
            property: property.to_string(),
        };

        let decl = type_ref.get_edge(PROPERTIES_EDGE, property).ok_or_else(unknown)?;
        match decl.kind() {
            NodeKind::Property { kind, expected, .. } => Ok((decl.id(), *kind, expected.clone())),
            _ => Err(unknown()),
        }
    }

    fn literal(&self, property: &str, raw: &Value, kind: ValueType) -> GraphResult<PropertyValue> {
        let value = if self.config.validate_literal_types {
            PropertyValue::coerce(raw, kind)
        } else {
            PropertyValue::from_json(raw)
        };
        value.ok_or_else(|| GraphError::InvalidValue {
            property: property.to_string(),
            reason: format!("expected {}, got {}", kind, raw),
        })
    }

    /// Registry node for an object id, creating a placeholder on first sight
    fn obtain_object(&mut self, id: &str) -> NodeId {
        if let Some(node) = self.objects.get(id) {
            return *node;
        }
        let node = self
            .store
            .create_node(NodeKind::Object { type_id: None }, id, None);
        self.objects.set(id, node);
        self.pending.insert(id.to_string());
        node
    }

    fn is_declared(&self, id: &str) -> bool {
        self.objects.contains_key(id) && !self.pending.contains(id)
    }

    /// Interned leaf for (type, property, value)
    fn intern(
        &mut self,
        type_node: NodeId,
        property_node: NodeId,
        property: &str,
        value: PropertyValue,
    ) -> GraphResult<NodeId> {
        let key = InternKey {
            type_id: type_node,
            property: property.to_string(),
            literal: value.literal_key(),
        };
        if let Some(leaf) = self.interned.get(&key) {
            return Ok(*leaf);
        }

        let edge_key = value.edge_key();
        let leaf = self
            .store
            .create_node(NodeKind::Literal, value.to_string(), Some(value));
        self.store.link(property_node, VALUES_EDGE, edge_key, leaf)?;
        self.interned.insert(key, leaf);
        Ok(leaf)
    }

    fn declare_object(&mut self, decl: &ObjectDecl) -> GraphResult<NodeId> {
        let type_node = self.type_node_id(&decl.type_id)?;
        let id = self.obtain_object(&decl.id);
        self.check_type_conflict(&decl.id, id, type_node)?;

        let mut lists = Vec::with_capacity(decl.values.len());
        for (property, raw) in &decl.values {
            let (property_node, kind, expected) = self.property_of(type_node, property)?;
            let items = value_items(raw);
            check_arity(property, kind, &items)?;

            let mut list = OrderedMap::with_capacity(items.len());
            for item in items {
                match &expected {
                    ExpectedType::Literal(value_type) => {
                        let value = self.literal(property, item, *value_type)?;
                        let edge_key = value.edge_key();
                        let leaf = self.intern(type_node, property_node, property, value)?;
                        list.set(edge_key, leaf);
                    }
                    ExpectedType::Object(_) => {
                        let target_id = object_id(property, item)?;
                        let target = self.obtain_object(target_id);
                        list.set(target_id, target);
                    }
                }
            }
            lists.push((property.as_str(), list));
        }

        let node = self.store.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
        node.kind = NodeKind::Object {
            type_id: Some(type_node),
        };
        for (property, list) in lists {
            node.replace(property, list);
        }
        self.pending.shift_remove(decl.id.as_str());
        Ok(id)
    }

    fn check_type_conflict(&self, id: &str, node: NodeId, requested: NodeId) -> GraphResult<()> {
        let existing = self.store.node(node).and_then(|n| n.type_id());
        match existing {
            Some(existing) if existing != requested => Err(GraphError::TypeConflict {
                id: id.to_string(),
                existing: self.store.node(existing).map(|n| n.key.clone()).unwrap_or_default(),
                requested: self.store.node(requested).map(|n| n.key.clone()).unwrap_or_default(),
            }),
            _ => Ok(()),
        }
    }

    /// Every object edge must point at an object of the property's type
    fn check_references(&self) -> GraphResult<()> {
        for object in self.objects().values() {
            let Some(type_node) = object.type_node() else {
                continue;
            };
            for decl in type_node.all(PROPERTIES_EDGE).values() {
                let Some(ExpectedType::Object(expected)) = decl.expected_type() else {
                    continue;
                };
                for target in object.all(decl.key()).values() {
                    let actual = target.type_node().map(|t| t.key()).unwrap_or_default();
                    check_reference(target.key(), expected, actual)?;
                }
            }
        }
        Ok(())
    }

    fn validate_write(&self, deltas: &[ObjectDecl]) -> GraphResult<()> {
        let mut batch: HashMap<&str, &str> = HashMap::with_capacity(deltas.len());
        for delta in deltas {
            if let Some(previous) = batch.insert(delta.id.as_str(), delta.type_id.as_str()) {
                if previous != delta.type_id {
                    return Err(GraphError::TypeConflict {
                        id: delta.id.clone(),
                        existing: previous.to_string(),
                        requested: delta.type_id.clone(),
                    });
                }
            }
        }

        for delta in deltas {
            let type_node = self.type_node_id(&delta.type_id)?;
            if let Some(existing) = self.objects.get(delta.id.as_str()) {
                self.check_type_conflict(&delta.id, *existing, type_node)?;
            }

            for (property, raw) in &delta.values {
                let (_, kind, expected) = self.property_of(type_node, property)?;
                let items = value_items(raw);
                check_arity(property, kind, &items)?;

                for item in items {
                    match &expected {
                        ExpectedType::Literal(value_type) => {
                            self.literal(property, item, *value_type)?;
                        }
                        ExpectedType::Object(expected) => {
                            let target_id = object_id(property, item)?;
                            let actual = match batch.get(target_id) {
                                Some(type_id) => *type_id,
                                None if self.is_declared(target_id) => self
                                    .get_object(target_id)
                                    .and_then(|target| target.type_node())
                                    .map(|type_node| type_node.key())
                                    .unwrap_or_default(),
                                None => {
                                    return Err(GraphError::UnresolvedReference(
                                        target_id.to_string(),
                                    ));
                                }
                            };
                            check_reference(target_id, expected, actual)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// A property value as a list: arrays spread, `null` clears, scalars wrap
fn value_items(raw: &Value) -> Vec<&Value> {
    match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn check_arity(property: &str, kind: PropertyKind, items: &[&Value]) -> GraphResult<()> {
    if kind.is_unique() && items.len() > 1 {
        return Err(GraphError::InvalidValue {
            property: property.to_string(),
            reason: format!("unique property given {} values", items.len()),
        });
    }
    Ok(())
}

fn object_id<'v>(property: &str, item: &'v Value) -> GraphResult<&'v str> {
    item.as_str().ok_or_else(|| GraphError::InvalidValue {
        property: property.to_string(),
        reason: format!("expected an object id, got {}", item),
    })
}

fn check_reference(target: &str, expected: &str, actual: &str) -> GraphResult<()> {
    if actual != expected {
        return Err(GraphError::TypeConflict {
            id: target.to_string(),
            existing: actual.to_string(),
            requested: expected.to_string(),
        });
    }
    Ok(())
}

/// Group snapshots by type id, keeping first-seen order
pub fn group_by_type(
    nodes: &OrderedMap<Key, NodeSnapshot>,
) -> IndexMap<String, Vec<&NodeSnapshot>> {
    let mut groups: IndexMap<String, Vec<&NodeSnapshot>> = IndexMap::new();
    for node in nodes.values() {
        groups.entry(node.type_id.clone()).or_default().push(node);
    }
    groups
}
