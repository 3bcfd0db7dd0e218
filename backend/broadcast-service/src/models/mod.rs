use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Channel every notification is broadcast on.
pub const NOTIFICATIONS_CHANNEL: &str = "notifications";

/// Event name carried by every broadcast notification.
pub const NOTIFICATION_SENT_EVENT: &str = "notification.sent";

/// Maximum accepted title length, in Unicode code points.
pub const MAX_TITLE_LEN: usize = 255;

/// A registered device.
///
/// One record per live connection identifier. Records are replaced on
/// re-registration and never expire; the registry is an inventory of
/// registrations, not a presence table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    /// Transport-assigned connection identifier. Primary key.
    pub socket_id: String,

    /// Free-form metadata reported by the client (platform, browser, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<serde_json::Value>,

    /// Timestamp of the most recent registration for this socket id
    pub registered_at: DateTime<Utc>,
}

/// An outbound notification, immutable once constructed.
///
/// Built by the dispatcher per accepted request, broadcast once, then
/// discarded. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub title: String,
    pub description: String,
}

impl NotificationEvent {
    /// Wire payload subscribers decode. Field names and casing are the
    /// contract; nothing else goes on the wire.
    pub fn payload(&self) -> serde_json::Value {
        json!({
            "title": self.title,
            "description": self.description,
        })
    }
}

/// Request to register a device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDevicePayload {
    pub socket_id: String,
    #[serde(default)]
    pub device_info: Option<serde_json::Value>,
}

/// Request to broadcast a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendNotificationPayload {
    pub title: String,
    pub description: String,
}
