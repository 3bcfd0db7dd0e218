pub mod channel;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod services;
pub mod websocket;

pub use channel::{BroadcastTransport, ChannelEvent, LocalBroadcast, SubscriberId};
pub use config::Config;
pub use error::{AppError, Result};
pub use registry::DeviceRegistry;
pub use services::NotificationDispatcher;
pub use websocket::{ServerMessage, WsSession};
