/// Device Registry
///
/// Tracks every device that has registered a connection identifier, with
/// optional metadata. Supports:
/// - Idempotent upsert keyed on socket id
/// - Snapshot listing, most recently registered first
/// - Lookup and counting for operator visibility
///
/// The registry is bookkeeping, not the delivery path: the broadcast
/// transport keeps its own subscriber set. Records are replaced on
/// re-registration and survive disconnects.
use crate::error::{AppError, Result};
use crate::models::Device;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry entry. `seq` is a monotonic insertion counter so listing order
/// stays stable when two upserts land on the same timestamp.
struct Registration {
    seq: u64,
    device: Device,
}

/// Thread-safe device registry using Arc<RwLock<>> for shared state.
///
/// Upserts replace the whole record under the write lock, so concurrent
/// writers for the same socket id serialize to last-writer-wins and readers
/// never observe a half-written record.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    inner: Arc<RwLock<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    devices: HashMap<String, Registration>,
    next_seq: u64,
}

impl DeviceRegistry {
    /// Create a new, empty DeviceRegistry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `socket_id`.
    ///
    /// Unseen ids create a record; seen ids have their metadata replaced
    /// wholesale and `registered_at` refreshed. Returns the stored record.
    pub async fn upsert(
        &self,
        socket_id: &str,
        device_info: Option<serde_json::Value>,
    ) -> Result<Device> {
        if socket_id.trim().is_empty() {
            return Err(AppError::validation("socket_id", "socket_id is required"));
        }

        let device = Device {
            socket_id: socket_id.to_string(),
            device_info,
            registered_at: Utc::now(),
        };

        let mut state = self.inner.write().await;
        state.next_seq += 1;
        let seq = state.next_seq;
        state.devices.insert(
            socket_id.to_string(),
            Registration {
                seq,
                device: device.clone(),
            },
        );

        tracing::debug!(socket_id = %device.socket_id, "device registered");

        Ok(device)
    }

    /// Snapshot of all registrations, most recently registered first.
    pub async fn list(&self) -> Vec<Device> {
        let state = self.inner.read().await;
        let mut entries: Vec<(u64, Device)> = state
            .devices
            .values()
            .map(|r| (r.seq, r.device.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, device)| device).collect()
    }

    /// Look up the record for a socket id
    pub async fn get(&self, socket_id: &str) -> Option<Device> {
        let state = self.inner.read().await;
        state.devices.get(socket_id).map(|r| r.device.clone())
    }

    /// Number of distinct registered devices
    pub async fn count(&self) -> usize {
        let state = self.inner.read().await;
        state.devices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = DeviceRegistry::new();
        assert_eq!(registry.count().await, 0);
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_creates_record() {
        let registry = DeviceRegistry::new();

        let device = registry
            .upsert("socket-1", Some(json!({"platform": "MacIntel"})))
            .await
            .unwrap();

        assert_eq!(device.socket_id, "socket-1");
        assert_eq!(registry.count().await, 1);
        assert_eq!(registry.get("socket-1").await, Some(device));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let registry = DeviceRegistry::new();

        let first = registry
            .upsert("socket-1", Some(json!({"browser": "Safari"})))
            .await
            .unwrap();
        let second = registry
            .upsert("socket-1", Some(json!({"browser": "Chrome"})))
            .await
            .unwrap();

        assert_eq!(registry.count().await, 1);
        assert!(second.registered_at >= first.registered_at);

        let stored = registry.get("socket-1").await.unwrap();
        assert_eq!(stored.device_info, Some(json!({"browser": "Chrome"})));
    }

    #[tokio::test]
    async fn test_upsert_replaces_metadata_wholesale() {
        let registry = DeviceRegistry::new();

        registry
            .upsert("socket-1", Some(json!({"platform": "iPhone", "browser": "Safari"})))
            .await
            .unwrap();
        registry
            .upsert("socket-1", Some(json!({"platform": "iPhone"})))
            .await
            .unwrap();

        let stored = registry.get("socket-1").await.unwrap();
        // No merge with the previous metadata
        assert_eq!(stored.device_info, Some(json!({"platform": "iPhone"})));
    }

    #[tokio::test]
    async fn test_upsert_without_metadata() {
        let registry = DeviceRegistry::new();

        let device = registry.upsert("socket-1", None).await.unwrap();
        assert!(device.device_info.is_none());
    }

    #[tokio::test]
    async fn test_empty_socket_id_rejected() {
        let registry = DeviceRegistry::new();

        assert!(registry.upsert("", None).await.is_err());
        assert!(registry.upsert("   ", None).await.is_err());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_list_orders_most_recent_first() {
        let registry = DeviceRegistry::new();

        registry.upsert("socket-1", None).await.unwrap();
        registry.upsert("socket-2", None).await.unwrap();
        registry.upsert("socket-3", None).await.unwrap();

        let devices = registry.list().await;
        let ids: Vec<&str> = devices.iter().map(|d| d.socket_id.as_str()).collect();
        assert_eq!(ids, vec!["socket-3", "socket-2", "socket-1"]);
    }

    #[tokio::test]
    async fn test_reregistration_moves_device_to_front() {
        let registry = DeviceRegistry::new();

        registry.upsert("socket-1", None).await.unwrap();
        registry.upsert("socket-2", None).await.unwrap();
        registry.upsert("socket-1", None).await.unwrap();

        let devices = registry.list().await;
        let ids: Vec<&str> = devices.iter().map(|d| d.socket_id.as_str()).collect();
        assert_eq!(ids, vec!["socket-1", "socket-2"]);
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_count_matches_distinct_ids_under_repeats() {
        let registry = DeviceRegistry::new();

        for round in 0..3 {
            for i in 0..10 {
                registry
                    .upsert(&format!("socket-{}", i), Some(json!({"round": round})))
                    .await
                    .unwrap();
            }
        }

        assert_eq!(registry.count().await, 10);
        assert_eq!(registry.list().await.len(), 10);
    }

    #[tokio::test]
    async fn test_concurrent_registration() {
        let registry = DeviceRegistry::new();

        let mut handles = Vec::new();
        for i in 0..100 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .upsert(&format!("socket-{}", i), Some(json!({"n": i})))
                    .await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(registry.count().await, 100);

        let devices = registry.list().await;
        assert_eq!(devices.len(), 100);
        let mut ids: Vec<String> = devices.into_iter().map(|d| d.socket_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }
}
