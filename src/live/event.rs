//! Live-query notifications and their delivery
//!
//! A dispatch pass produces one `Notification` per channel that matched at
//! least one updated node. Delivery goes through a `Broadcaster`, which is the
//! only point where the live-query engine touches a transport.

use crate::graph::{Key, NodeSnapshot, OrderedMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Identity of one watching client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Fresh random id
    pub fn generate() -> Self {
        SubscriberId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SubscriberId {
    fn from(id: Uuid) -> Self {
        SubscriberId(id)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity threaded through every gateway operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub subscriber: SubscriberId,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, subscriber: SubscriberId) -> Self {
        Self {
            session_id: session_id.into(),
            subscriber,
        }
    }

    /// Session with freshly generated ids
    pub fn generate() -> Self {
        let subscriber = SubscriberId::generate();
        Self {
            session_id: Uuid::new_v4().to_string(),
            subscriber,
        }
    }
}

/// Batch of updated nodes for the subscriber group of one channel
///
/// `nodes` is keyed by node id and keeps the order of the write that
/// produced it; it serializes as `{"<id>": {...}, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub channel: String,
    pub subscribers: Vec<SubscriberId>,
    pub nodes: OrderedMap<Key, NodeSnapshot>,
}

impl Notification {
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.values().map(|node| node.id.as_str())
    }
}

/// Delivery failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BroadcastError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Delivers notifications to a channel's subscriber group
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, notification: Notification) -> Result<(), BroadcastError>;
}

impl<F> Broadcaster for F
where
    F: Fn(Notification) -> Result<(), BroadcastError> + Send + Sync,
{
    fn broadcast(&self, notification: Notification) -> Result<(), BroadcastError> {
        self(notification)
    }
}

/// Broadcaster that forwards notifications into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: UnboundedSender<Notification>,
}

impl ChannelBroadcaster {
    pub fn new(sender: UnboundedSender<Notification>) -> Self {
        Self { sender }
    }

    /// Broadcaster plus the receiving end a transport task drains
    pub fn channel() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, notification: Notification) -> Result<(), BroadcastError> {
        self.sender
            .send(notification)
            .map_err(|_| BroadcastError::ChannelClosed)
    }
}
