use crate::channel::{BroadcastTransport, ChannelEvent, SubscriberId};
use crate::models::{NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT};
use crate::registry::DeviceRegistry;
use crate::websocket::messages::{ClientMessage, ServerMessage};
use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// How often the server pings the client
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Close the connection after this long without a pong
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

// Message type for forwarding channel events to the WebSocket actor
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct Deliver(ChannelEvent);

/// One client connection.
///
/// Holds this connection's subscription to the notification channel and its
/// identity in the device registry. The registry record outlives the
/// session: registrations are an inventory of everything that connected,
/// not a presence table, so disconnects leave it untouched.
pub struct WsSession {
    socket_id: String,
    registry: DeviceRegistry,
    transport: Arc<dyn BroadcastTransport>,
    subscriber_id: SubscriberId,
    events: Option<UnboundedReceiver<ChannelEvent>>,
    device_info: Option<serde_json::Value>,
    hb: Instant,
}

impl WsSession {
    pub fn new(
        socket_id: String,
        registry: DeviceRegistry,
        transport: Arc<dyn BroadcastTransport>,
        subscriber_id: SubscriberId,
        events: UnboundedReceiver<ChannelEvent>,
        device_info: Option<serde_json::Value>,
    ) -> Self {
        Self {
            socket_id,
            registry,
            transport,
            subscriber_id,
            events: Some(events),
            device_info,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(socket_id = %act.socket_id, "WebSocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn register_device(&self, device_info: Option<serde_json::Value>) {
        let registry = self.registry.clone();
        let socket_id = self.socket_id.clone();

        actix::spawn(async move {
            if let Err(e) = registry.upsert(&socket_id, device_info).await {
                tracing::error!(socket_id = %socket_id, "device registration failed: {}", e);
            }
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(socket_id = %self.socket_id, "WebSocket session started");

        self.hb(ctx);

        // Register with whatever metadata the upgrade request carried;
        // the client can refresh it later with a Register frame
        self.register_device(self.device_info.clone());

        // Tell the client its socket id so it can address itself in
        // registration retries
        match ServerMessage::connected(self.socket_id.clone()).to_json() {
            Ok(frame) => ctx.text(frame),
            Err(e) => tracing::error!("failed to encode connected frame: {}", e),
        }

        // Bridge the channel subscription into the actor mailbox
        if let Some(mut events) = self.events.take() {
            let addr = ctx.address();
            actix::spawn(async move {
                while let Some(event) = events.recv().await {
                    addr.do_send(Deliver(event));
                }
            });
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(socket_id = %self.socket_id, "WebSocket session stopped");

        // Drop the channel subscription; the registry record stays
        let transport = self.transport.clone();
        let subscriber_id = self.subscriber_id;

        actix::spawn(async move {
            transport
                .unsubscribe(NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT, subscriber_id)
                .await;
        });
    }
}

// Surface channel events to the client
impl Handler<Deliver> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        let payload = msg.0.payload;
        let (title, description) = match (payload["title"].as_str(), payload["description"].as_str())
        {
            (Some(title), Some(description)) => (title.to_string(), description.to_string()),
            _ => {
                tracing::warn!(socket_id = %self.socket_id, "discarding malformed channel payload");
                return;
            }
        };

        match ServerMessage::notification(title, description).to_json() {
            Ok(frame) => ctx.text(frame),
            Err(e) => tracing::error!("failed to encode notification frame: {}", e),
        }
    }
}

// Handle WebSocket protocol messages
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match ClientMessage::from_json(&text) {
                Ok(ClientMessage::Register { device_info }) => {
                    self.device_info = device_info.clone();
                    self.register_device(device_info);
                }
                Err(e) => {
                    tracing::warn!(socket_id = %self.socket_id, "failed to parse WS message: {}", e);
                    if let Ok(frame) = ServerMessage::error(
                        "BAD_FRAME".to_string(),
                        "unrecognized message".to_string(),
                    )
                    .to_json()
                    {
                        ctx.text(frame);
                    }
                }
            },
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(socket_id = %self.socket_id, "WebSocket close received: {:?}", reason);
                ctx.stop();
            }
            _ => {}
        }
    }
}
