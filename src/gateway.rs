//! Request gateway
//!
//! The boundary the transport layer calls into: read, write, watch and
//! unwatch. The graph and the subscription registry sit behind their own
//! tokio `RwLock`s. A write holds the graph write lock through its dispatch
//! pass and takes the registry read lock for that pass, so writes never
//! interleave and watch/unwatch never lands mid-dispatch.

use crate::config::GraphConfig;
use crate::graph::{GraphResult, Key, NodeSnapshot, ObjectDecl, OrderedMap, SchemaGraph};
use crate::live::{
    Broadcaster, DispatchEngine, DispatchReport, SessionContext, SubscriptionRegistry,
};
use crate::matcher::{FieldMatcher, QueryMatcher};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Read/write/watch surface over a shared schema graph
pub struct RequestGateway<M = FieldMatcher> {
    /// Shared graph
    graph: Arc<RwLock<SchemaGraph>>,
    /// Live-query channels
    registry: Arc<RwLock<SubscriptionRegistry>>,
    /// Matches updates to channels and broadcasts them
    engine: DispatchEngine<M>,
}

impl<M> Clone for RequestGateway<M> {
    fn clone(&self) -> Self {
        Self {
            graph: Arc::clone(&self.graph),
            registry: Arc::clone(&self.registry),
            engine: self.engine.clone(),
        }
    }
}

impl RequestGateway<FieldMatcher> {
    /// Gateway using the field-equality matcher
    pub fn new(graph: SchemaGraph, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self::with_matcher(graph, FieldMatcher, broadcaster)
    }
}

impl<M: QueryMatcher> RequestGateway<M> {
    pub fn with_matcher(graph: SchemaGraph, matcher: M, broadcaster: Arc<dyn Broadcaster>) -> Self {
        let registry = SubscriptionRegistry::with_pruning(graph.config().prune_empty_channels);
        info!(
            "Request gateway ready: {} types, {} objects",
            graph.types().len(),
            graph.objects().len()
        );
        Self {
            graph: Arc::new(RwLock::new(graph)),
            registry: Arc::new(RwLock::new(registry)),
            engine: DispatchEngine::with_matcher(matcher, broadcaster),
        }
    }

    /// Build the graph from a JSON document and wrap it
    pub fn from_json(
        document: &Value,
        config: GraphConfig,
        matcher: M,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> GraphResult<Self> {
        let graph = SchemaGraph::from_json(document, config)?;
        Ok(Self::with_matcher(graph, matcher, broadcaster))
    }

    pub fn graph(&self) -> Arc<RwLock<SchemaGraph>> {
        Arc::clone(&self.graph)
    }

    pub fn registry(&self) -> Arc<RwLock<SubscriptionRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Snapshots of every object matching `query`
    pub async fn read(
        &self,
        query: &Value,
        options: &Value,
        session: &SessionContext,
    ) -> GraphResult<OrderedMap<Key, NodeSnapshot>> {
        let graph = self.graph.read().await;
        let result = graph.read(query, options, self.engine.matcher())?;
        debug!("Session {} read {} objects", session.session_id, result.len());
        Ok(result)
    }

    /// Apply object deltas, then dispatch the updated objects before returning
    pub async fn write(
        &self,
        deltas: &Value,
        session: &SessionContext,
    ) -> GraphResult<OrderedMap<Key, NodeSnapshot>> {
        let (updated, _) = self.write_with_report(deltas, session).await?;
        Ok(updated)
    }

    /// `write`, also returning how the dispatch pass went
    pub async fn write_with_report(
        &self,
        deltas: &Value,
        session: &SessionContext,
    ) -> GraphResult<(OrderedMap<Key, NodeSnapshot>, DispatchReport)> {
        let deltas = ObjectDecl::parse_batch(deltas)?;

        let mut graph = self.graph.write().await;
        let updated = graph.write(&deltas)?;

        let registry = self.registry.read().await;
        let report = self.engine.dispatch(&registry, &updated);
        drop(registry);
        drop(graph);

        debug!(
            "Session {} wrote {} objects, notified {} channels",
            session.session_id,
            updated.len(),
            report.delivered.len()
        );
        Ok((updated, report))
    }

    /// Subscribe the session to `channel` with `query`
    pub async fn watch(
        &self,
        channel: &str,
        query: Value,
        session: &SessionContext,
    ) -> GraphResult<()> {
        self.engine
            .matcher()
            .validate(&query)
            .map_err(crate::graph::GraphError::MalformedQuery)?;
        self.registry
            .write()
            .await
            .watch(channel, query, session.subscriber);
        Ok(())
    }

    /// Remove the session from `channel`; false if it was not watching
    pub async fn unwatch(&self, channel: &str, session: &SessionContext) -> bool {
        self.registry
            .write()
            .await
            .unwatch(channel, session.subscriber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphDocument, GraphError, PropertyDecl, TypeDecl};
    use crate::live::{ChannelBroadcaster, Notification, SubscriberId};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn gateway() -> (RequestGateway, UnboundedReceiver<Notification>) {
        let doc = GraphDocument::new().with_type(
            TypeDecl::new("type:note", "Note")
                .property(PropertyDecl::new("text", "Text", true, "string"))
                .property(PropertyDecl::new("tags", "Tags", false, "string")),
        );
        let graph = SchemaGraph::from_document(&doc, GraphConfig::default()).unwrap();
        let (broadcaster, receiver) = ChannelBroadcaster::channel();
        (RequestGateway::new(graph, Arc::new(broadcaster)), receiver)
    }

    #[tokio::test]
    async fn test_write_dispatches_to_watchers() {
        let (gateway, mut receiver) = gateway();
        let session = SessionContext::generate();
        gateway
            .watch("todo", json!({ "tags": "todo" }), &session)
            .await
            .unwrap();

        let updated = gateway
            .write(
                &json!({
                    "/note/1": { "type": "type:note", "text": "buy milk", "tags": ["todo"] },
                    "/note/2": { "type": "type:note", "text": "done", "tags": ["archive"] }
                }),
                &session,
            )
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);

        let notification = receiver.try_recv().unwrap();
        assert_eq!(notification.channel, "todo");
        assert_eq!(notification.subscribers, vec![session.subscriber]);
        assert_eq!(notification.node_ids().collect::<Vec<_>>(), vec!["/note/1"]);
        assert_eq!(notification.nodes.get("/note/1"), updated.get("/note/1"));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_write_dispatches_nothing() {
        let (gateway, mut receiver) = gateway();
        let session = SessionContext::generate();
        gateway.watch("all", json!(null), &session).await.unwrap();

        let err = gateway
            .write(&json!({ "/note/1": { "type": "type:task" } }), &session)
            .await
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownType("type:task".to_string()));
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_read_and_unwatch() {
        let (gateway, mut receiver) = gateway();
        let session = SessionContext::new("s1", SubscriberId::generate());
        gateway.watch("all", json!({}), &session).await.unwrap();
        assert!(gateway.unwatch("all", &session).await);
        assert!(!gateway.unwatch("all", &session).await);

        gateway
            .write(&json!({ "/note/1": { "type": "type:note", "text": "hi" } }), &session)
            .await
            .unwrap();
        // the channel is still registered but has nobody to tell
        let notification = receiver.try_recv().unwrap();
        assert!(notification.subscribers.is_empty());

        let notes = gateway
            .read(&json!({ "text": "hi" }), &json!(null), &session)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_watch_rejects_malformed_query() {
        let (gateway, _receiver) = gateway();
        let session = SessionContext::generate();
        assert!(matches!(
            gateway.watch("bad", json!(["x"]), &session).await,
            Err(GraphError::MalformedQuery(_))
        ));
    }
}
