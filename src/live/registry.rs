//! Channel registry for live queries
//!
//! A channel is a named query plus the group of subscribers watching it.

use super::event::SubscriberId;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::debug;

/// Named query and its subscriber group
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub query: Value,
    pub subscribers: IndexSet<SubscriberId>,
}

impl Channel {
    fn new(name: &str, query: Value) -> Self {
        Self {
            name: name.to_string(),
            query,
            subscribers: IndexSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

/// Channels keyed by name, in registration order
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    channels: IndexMap<String, Channel>,
    prune_empty: bool,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that drops a channel when its last subscriber leaves
    pub fn with_pruning(prune_empty: bool) -> Self {
        Self {
            channels: IndexMap::new(),
            prune_empty,
        }
    }

    /// Set the channel's query and add `subscriber` to its group
    ///
    /// Watching an existing channel replaces its query for every subscriber.
    pub fn watch(&mut self, channel: &str, query: Value, subscriber: SubscriberId) {
        let entry = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| Channel::new(channel, Value::Null));
        entry.query = query;
        let added = entry.subscribers.insert(subscriber);
        debug!(
            "Subscriber {} watching {} ({} subscribers, new: {})",
            subscriber,
            channel,
            entry.subscribers.len(),
            added
        );
    }

    /// Remove `subscriber` from the channel's group
    ///
    /// Returns false when the channel or the subscriber is unknown.
    pub fn unwatch(&mut self, channel: &str, subscriber: SubscriberId) -> bool {
        let Some(entry) = self.channels.get_mut(channel) else {
            return false;
        };
        let removed = entry.subscribers.shift_remove(&subscriber);
        if removed && self.prune_empty && entry.is_empty() {
            self.channels.shift_remove(channel);
            debug!("Pruned empty channel {}", channel);
        }
        removed
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn prune_empty(&self) -> bool {
        self.prune_empty
    }
}
