use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use broadcast_service::{
    handlers::{
        devices::register_routes as register_devices,
        notifications::register_routes as register_notifications,
        websocket::register_routes as register_websocket,
    },
    metrics, BroadcastTransport, Config, DeviceRegistry, LocalBroadcast, NotificationDispatcher,
};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default().allow_any_method().allow_any_header().max_age(3600);
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting broadcast service");

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    // Core state, injected into every handler; lives as long as the process
    let registry = DeviceRegistry::new();
    let transport: Arc<dyn BroadcastTransport> = Arc::new(LocalBroadcast::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(transport.clone()));
    tracing::info!("Device registry and broadcast channel initialized");

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    let allowed_origins = config.cors.allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(transport.clone()))
            .app_data(web::Data::new(dispatcher.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .wrap(build_cors(&allowed_origins))
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/", web::get().to(|| async { "Broadcast Service v1.0" }))
            .configure(|cfg| {
                register_notifications(cfg);
                register_devices(cfg);
                register_websocket(cfg);
            })
    })
    .bind(&addr)?
    .run()
    .await
}
