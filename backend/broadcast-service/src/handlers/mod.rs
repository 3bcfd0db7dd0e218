pub mod devices;
/// HTTP handlers for the broadcast service API
pub mod notifications;
pub mod websocket;

pub use devices::*;
pub use notifications::*;
pub use websocket::register_routes as register_websocket;
