use super::ApiResponse;
use crate::error::AppError;
/// Device registration handlers
use crate::models::RegisterDevicePayload;
use crate::registry::DeviceRegistry;
use actix_web::{web, HttpResponse};

/// Register a device
///
/// POST /api/v1/devices/register
///
/// Idempotent: retrying with the same socket id replaces the stored
/// metadata and refreshes the registration timestamp.
pub async fn register_device(
    registry: web::Data<DeviceRegistry>,
    req: web::Json<RegisterDevicePayload>,
) -> Result<HttpResponse, AppError> {
    let device = registry
        .upsert(&req.socket_id, req.device_info.clone())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(serde_json::json!({
        "message": "Device registered successfully",
        "device": device,
    }))))
}

/// List registered devices, most recent first
///
/// GET /api/v1/devices
///
/// Operator visibility only; the broadcast path never consults this.
pub async fn list_devices(registry: web::Data<DeviceRegistry>) -> Result<HttpResponse, AppError> {
    let devices = registry.list().await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "count": devices.len(),
        "devices": devices,
    }))))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/devices")
            .route("/register", web::post().to(register_device))
            .route("", web::get().to(list_devices)),
    );
}
