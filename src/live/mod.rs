//! Live queries
//!
//! Clients watch named channels, each carrying a query. After every write the
//! dispatch engine matches the updated objects against all channel queries and
//! broadcasts one batch per matching channel to that channel's subscribers.

pub mod dispatcher;
pub mod event;
pub mod registry;

pub use dispatcher::{DispatchEngine, DispatchReport};
pub use event::{
    BroadcastError, Broadcaster, ChannelBroadcaster, Notification, SessionContext, SubscriberId,
};
pub use registry::{Channel, SubscriptionRegistry};
