/// WebSocket connection glue
///
/// Binds one client connection to the core:
/// 1. On connect: mints the socket id, registers the device, subscribes to
///    the notification channel
/// 2. On channel event: surfaces the notification to the client
/// 3. On disconnect: drops the channel subscription only — the registry
///    record deliberately stays behind
pub mod messages;
pub mod session;

pub use messages::{ClientMessage, ServerMessage};
pub use session::WsSession;
