use crate::error::AppError;
use crate::metrics;
/// Notification publish handlers
use crate::models::SendNotificationPayload;
use crate::services::NotificationDispatcher;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Broadcast a notification to every connected client
///
/// POST /api/v1/notifications/send
pub async fn send_notification(
    dispatcher: web::Data<Arc<NotificationDispatcher>>,
    req: web::Json<SendNotificationPayload>,
) -> Result<HttpResponse, AppError> {
    let event = dispatcher.publish(&req.title, &req.description).await?;

    metrics::inc_notifications_published();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "message": "Notification broadcast successfully",
        "notification": event,
    }))))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/notifications").route("/send", web::post().to(send_notification)),
    );
}
