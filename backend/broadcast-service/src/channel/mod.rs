/// Notification channel abstraction
///
/// A channel is a named broadcast topic: publishers hand it an event, every
/// current subscriber of that topic receives the event exactly once. The
/// concrete transport lives behind the `BroadcastTransport` trait so the
/// in-process implementation can be swapped for a hosted pub/sub or a
/// self-managed broker without touching the dispatch pipeline.
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub mod local;

pub use local::LocalBroadcast;

/// Unique identifier for a channel subscriber
///
/// Each subscription gets its own ID when it registers, which allows for
/// precise cleanup when the connection behind it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// One event delivered on a broadcast channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Capability interface over the pub/sub transport.
///
/// Delivery is at-most-once: a subscriber that is unreachable at publish
/// time is dropped silently, never queued or retried.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    /// Push `payload` to every current subscriber of `channel`/`event`.
    ///
    /// Returns once the message has been handed to the transport, not once
    /// any subscriber has processed it.
    async fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> Result<()>;

    /// Register a new subscriber for `channel`/`event`.
    ///
    /// Events arrive on the returned receiver in publish order for this
    /// subscription; no ordering is guaranteed across subscriptions.
    async fn subscribe(
        &self,
        channel: &str,
        event: &str,
    ) -> (SubscriberId, UnboundedReceiver<ChannelEvent>);

    /// Drop a subscriber registration. Must be called when the connection
    /// behind it closes.
    async fn unsubscribe(&self, channel: &str, event: &str, subscriber_id: SubscriberId);
}
