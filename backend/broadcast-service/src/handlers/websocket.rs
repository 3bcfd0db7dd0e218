/// WebSocket upgrade route
///
/// Assigns each connection its socket id, subscribes it to the notification
/// channel, and hands it to a WsSession. The session registers the device;
/// delivery is driven entirely by the channel subscription.
use crate::channel::BroadcastTransport;
use crate::models::{NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT};
use crate::registry::DeviceRegistry;
use crate::websocket::WsSession;
use actix_web::{http::header, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub platform: Option<String>,
    pub browser: Option<String>,
}

/// Initial device metadata from the upgrade request itself
fn device_info_from_request(req: &HttpRequest, params: &ConnectParams) -> Option<serde_json::Value> {
    let mut info = serde_json::Map::new();

    if let Some(platform) = &params.platform {
        info.insert("platform".to_string(), json!(platform));
    }
    if let Some(browser) = &params.browser {
        info.insert("browser".to_string(), json!(browser));
    }
    if let Some(user_agent) = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        info.insert("userAgent".to_string(), json!(user_agent));
    }

    if info.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(info))
    }
}

/// GET /ws
pub async fn connect(
    req: HttpRequest,
    stream: web::Payload,
    registry: web::Data<DeviceRegistry>,
    transport: web::Data<Arc<dyn BroadcastTransport>>,
    query: web::Query<ConnectParams>,
) -> Result<HttpResponse, Error> {
    // The transport assigns the connection identifier
    let socket_id = Uuid::new_v4().to_string();
    let params = query.into_inner();
    let device_info = device_info_from_request(&req, &params);

    let (subscriber_id, events) = transport
        .subscribe(NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT)
        .await;

    let session = WsSession::new(
        socket_id,
        registry.get_ref().clone(),
        transport.get_ref().clone(),
        subscriber_id,
        events,
        device_info,
    );

    ws::start(session, &req, stream)
}

/// Register WebSocket routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(connect));
}
