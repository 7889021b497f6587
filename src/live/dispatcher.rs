//! Match-then-broadcast pass over a batch of updated nodes
//!
//! Every updated node is matched against every channel's query first; only
//! then is one notification per non-empty channel batch broadcast. Callers hold
//! the registry read lock across `dispatch`, so subscriptions cannot change
//! mid-pass.

use super::event::{Broadcaster, Notification};
use super::registry::SubscriptionRegistry;
use crate::graph::{Key, NodeSnapshot, OrderedMap};
use crate::matcher::{FieldMatcher, QueryMatcher};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Channels that received a notification
    pub delivered: Vec<String>,
    /// Channels whose broadcast failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }
}

/// Routes updated nodes to the channels whose query they match
pub struct DispatchEngine<M = FieldMatcher> {
    matcher: Arc<M>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl<M> Clone for DispatchEngine<M> {
    fn clone(&self) -> Self {
        Self {
            matcher: Arc::clone(&self.matcher),
            broadcaster: Arc::clone(&self.broadcaster),
        }
    }
}

impl DispatchEngine<FieldMatcher> {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self::with_matcher(FieldMatcher, broadcaster)
    }
}

impl<M: QueryMatcher> DispatchEngine<M> {
    pub fn with_matcher(matcher: M, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            matcher: Arc::new(matcher),
            broadcaster,
        }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Broadcast the nodes of `updated` to every channel that matches them
    pub fn dispatch(
        &self,
        registry: &SubscriptionRegistry,
        updated: &OrderedMap<Key, NodeSnapshot>,
    ) -> DispatchReport {
        let mut batches: Vec<OrderedMap<Key, NodeSnapshot>> =
            (0..registry.len()).map(|_| OrderedMap::new()).collect();
        for (key, node) in updated.iter() {
            for (batch, channel) in batches.iter_mut().zip(registry.channels()) {
                if self.matcher.matches(node, &channel.query) {
                    batch.set(key.clone(), node.clone());
                }
            }
        }

        let mut report = DispatchReport::default();
        for (nodes, channel) in batches.into_iter().zip(registry.channels()) {
            if nodes.is_empty() {
                continue;
            }
            let notification = Notification {
                channel: channel.name.clone(),
                subscribers: channel.subscribers.iter().copied().collect(),
                nodes,
            };
            debug!(
                "Broadcasting {} nodes to channel {} ({} subscribers)",
                notification.nodes.len(),
                channel.name,
                notification.subscribers.len()
            );
            match self.broadcaster.broadcast(notification) {
                Ok(()) => report.delivered.push(channel.name.clone()),
                Err(e) => {
                    warn!("Broadcast to channel {} failed: {}", channel.name, e);
                    report.failed.push((channel.name.clone(), e.to_string()));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::event::{BroadcastError, SubscriberId};
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder() -> (Arc<dyn Broadcaster>, Arc<Mutex<Vec<Notification>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let broadcaster = move |notification: Notification| -> Result<(), BroadcastError> {
            sink.lock().unwrap().push(notification);
            Ok(())
        };
        (Arc::new(broadcaster), sent)
    }

    fn updated() -> OrderedMap<Key, NodeSnapshot> {
        let mut nodes = OrderedMap::new();
        nodes.set(
            "/doc/a",
            NodeSnapshot::new("/doc/a", "type:document").with("page_count", json!(8)),
        );
        nodes.set(
            "/doc/b",
            NodeSnapshot::new("/doc/b", "type:document").with("page_count", json!(20)),
        );
        nodes.set("/location/berlin", NodeSnapshot::new("/location/berlin", "type:entity"));
        nodes
    }

    #[test]
    fn test_one_batch_per_matching_channel() {
        let (broadcaster, sent) = recorder();
        let engine = DispatchEngine::new(broadcaster);
        let mut registry = SubscriptionRegistry::new();
        let alice = SubscriberId::generate();
        let bob = SubscriberId::generate();
        registry.watch("docs", json!({ "type": "type:document" }), alice);
        registry.watch("docs", json!({ "type": "type:document" }), bob);
        registry.watch("short", json!({ "page_count": 8 }), bob);
        registry.watch("people", json!({ "type": "type:person" }), alice);

        let report = engine.dispatch(&registry, &updated());

        assert_eq!(report.delivered, vec!["docs", "short"]);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[0].nodes.keys().cloned().collect::<Vec<_>>(),
            vec![Key::from("/doc/a"), Key::from("/doc/b")]
        );
        assert_eq!(sent[0].nodes.get("/doc/b"), updated().get("/doc/b"));
        assert_eq!(sent[0].subscribers, vec![alice, bob]);
        assert_eq!(sent[1].node_ids().collect::<Vec<_>>(), vec!["/doc/a"]);
    }

    #[test]
    fn test_failed_broadcast_does_not_stop_others() {
        let failing = |notification: Notification| -> Result<(), BroadcastError> {
            if notification.channel == "docs" {
                Err(BroadcastError::Transport("offline".to_string()))
            } else {
                Ok(())
            }
        };
        let engine = DispatchEngine::new(Arc::new(failing));
        let mut registry = SubscriptionRegistry::new();
        registry.watch("docs", json!({ "type": "type:document" }), SubscriberId::generate());
        registry.watch("places", json!({ "type": "type:entity" }), SubscriberId::generate());

        let report = engine.dispatch(&registry, &updated());
        assert_eq!(report.delivered, vec!["places"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "docs");
    }

    #[test]
    fn test_custom_matcher() {
        let (broadcaster, sent) = recorder();
        let long = |node: &NodeSnapshot, query: &serde_json::Value| {
            let min = query["min_pages"].as_i64().unwrap_or(0);
            node.property("page_count")
                .and_then(serde_json::Value::as_i64)
                .is_some_and(|pages| pages >= min)
        };
        let engine = DispatchEngine::with_matcher(long, broadcaster);
        let mut registry = SubscriptionRegistry::new();
        registry.watch("long", json!({ "min_pages": 10 }), SubscriberId::generate());

        engine.dispatch(&registry, &updated());
        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].node_ids().collect::<Vec<_>>(), vec!["/doc/b"]);
    }

    #[test]
    fn test_nothing_to_dispatch() {
        let (broadcaster, sent) = recorder();
        let engine = DispatchEngine::new(broadcaster);
        let registry = SubscriptionRegistry::new();

        assert!(engine.dispatch(&registry, &updated()).is_empty());
        assert!(sent.lock().unwrap().is_empty());
    }
}
