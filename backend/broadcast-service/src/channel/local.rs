use super::{BroadcastTransport, ChannelEvent, SubscriberId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};

/// Subscriber entry with ID and channel
struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<ChannelEvent>,
}

type TopicKey = (String, String);

/// In-process broadcast transport.
///
/// Tracks which subscribers are listening on which (channel, event) topic
/// and fans each published payload out to all of them. Dead senders are
/// cleaned up during publish, so a subscriber that went away simply stops
/// receiving; the publish itself still succeeds.
#[derive(Default, Clone)]
pub struct LocalBroadcast {
    // (channel, event) -> list of subscribers
    topics: Arc<RwLock<HashMap<TopicKey, Vec<Subscriber>>>>,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber count for a topic (for operator visibility)
    pub async fn subscriber_count(&self, channel: &str, event: &str) -> usize {
        let guard = self.topics.read().await;
        guard
            .get(&(channel.to_string(), event.to_string()))
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl BroadcastTransport for LocalBroadcast {
    async fn publish(&self, channel: &str, event: &str, payload: serde_json::Value) -> Result<()> {
        let key = (channel.to_string(), event.to_string());
        let mut guard = self.topics.write().await;

        if let Some(subscribers) = guard.get_mut(&key) {
            let delivery = ChannelEvent {
                channel: channel.to_string(),
                event: event.to_string(),
                payload,
            };

            let before = subscribers.len();
            // Send to all subscribers, remove dead ones
            subscribers.retain(|subscriber| subscriber.sender.send(delivery.clone()).is_ok());
            let after = subscribers.len();

            if before != after {
                tracing::debug!(
                    channel,
                    event,
                    dropped = before - after,
                    active = after,
                    "dead subscribers cleaned up during publish"
                );
            }

            if subscribers.is_empty() {
                guard.remove(&key);
            }
        }

        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        event: &str,
    ) -> (SubscriberId, UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.topics.write().await;
        let subscribers = guard
            .entry((channel.to_string(), event.to_string()))
            .or_default();
        subscribers.push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });

        tracing::debug!(
            channel,
            event,
            subscribers = subscribers.len(),
            "subscriber added"
        );

        (subscriber_id, rx)
    }

    async fn unsubscribe(&self, channel: &str, event: &str, subscriber_id: SubscriberId) {
        let key = (channel.to_string(), event.to_string());
        let mut guard = self.topics.write().await;

        if let Some(subscribers) = guard.get_mut(&key) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fan_out_reaches_every_subscriber_once() {
        let transport = LocalBroadcast::new();

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (_, rx) = transport.subscribe("notifications", "notification.sent").await;
            receivers.push(rx);
        }

        transport
            .publish(
                "notifications",
                "notification.sent",
                json!({"title": "Hi", "description": "there"}),
            )
            .await
            .unwrap();

        for rx in receivers.iter_mut() {
            let received = rx.recv().await.unwrap();
            assert_eq!(received.payload, json!({"title": "Hi", "description": "there"}));
            // Exactly one delivery per subscriber
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_succeeds() {
        let transport = LocalBroadcast::new();

        let result = transport
            .publish("notifications", "notification.sent", json!({"title": "x"}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_fail_publish() {
        let transport = LocalBroadcast::new();

        let (_, rx) = transport.subscribe("notifications", "notification.sent").await;
        drop(rx);

        let result = transport
            .publish("notifications", "notification.sent", json!({"title": "x"}))
            .await;
        assert!(result.is_ok());
        assert_eq!(
            transport.subscriber_count("notifications", "notification.sent").await,
            0
        );
    }

    #[tokio::test]
    async fn test_unsubscribed_connection_receives_nothing() {
        let transport = LocalBroadcast::new();

        let (id, mut rx) = transport.subscribe("notifications", "notification.sent").await;
        let (_, mut other_rx) = transport.subscribe("notifications", "notification.sent").await;

        transport
            .unsubscribe("notifications", "notification.sent", id)
            .await;
        transport
            .publish("notifications", "notification.sent", json!({"title": "x"}))
            .await
            .unwrap();

        assert!(other_rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let transport = LocalBroadcast::new();

        let (_, mut notif_rx) = transport.subscribe("notifications", "notification.sent").await;
        let (_, mut other_rx) = transport.subscribe("alerts", "alert.raised").await;

        transport
            .publish("notifications", "notification.sent", json!({"title": "x"}))
            .await
            .unwrap();

        assert!(notif_rx.recv().await.is_some());
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_arrive_in_publish_order_per_subscriber() {
        let transport = LocalBroadcast::new();

        let (_, mut rx) = transport.subscribe("notifications", "notification.sent").await;

        for i in 0..5 {
            transport
                .publish("notifications", "notification.sent", json!({"n": i}))
                .await
                .unwrap();
        }

        for i in 0..5 {
            let received = rx.recv().await.unwrap();
            assert_eq!(received.payload, json!({"n": i}));
        }
    }

    #[tokio::test]
    async fn test_concurrent_publishes_stay_discrete() {
        let transport = LocalBroadcast::new();

        let (_, mut rx) = transport.subscribe("notifications", "notification.sent").await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let transport = transport.clone();
            handles.push(tokio::spawn(async move {
                transport
                    .publish("notifications", "notification.sent", json!({"n": i}))
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let mut seen = Vec::new();
        for _ in 0..20 {
            let received = rx.recv().await.unwrap();
            seen.push(received.payload["n"].as_i64().unwrap());
        }
        seen.sort();
        let expected: Vec<i64> = (0..20).collect();
        // Each publish arrived exactly once, unmerged
        assert_eq!(seen, expected);
    }
}
