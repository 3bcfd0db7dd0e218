/// WebSocket frame types exchanged with connected clients
use serde::{Deserialize, Serialize};

/// Frames sent by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection established; carries the transport-assigned socket id
    Connected { socket_id: String, timestamp: i64 },

    /// A broadcast notification surfaced to this client
    Notification {
        title: String,
        description: String,
        received_at: i64,
    },

    /// Error message from server
    Error { code: String, message: String },
}

/// Frames accepted from clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Client reports (or refreshes) its device metadata
    Register {
        device_info: Option<serde_json::Value>,
    },
}

impl ServerMessage {
    /// Create a connected message
    pub fn connected(socket_id: String) -> Self {
        ServerMessage::Connected {
            socket_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Create a notification message
    pub fn notification(title: String, description: String) -> Self {
        ServerMessage::Notification {
            title,
            description,
            received_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Create an error message
    pub fn error(code: String, message: String) -> Self {
        ServerMessage::Error { code, message }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ClientMessage {
    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
