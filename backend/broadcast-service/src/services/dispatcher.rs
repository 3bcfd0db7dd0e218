/// Notification dispatch pipeline
///
/// Validates an outbound notification request, constructs the immutable
/// event payload, and hands it to the broadcast transport exactly once per
/// request. Validation happens here, at the boundary, producing one
/// authoritative error set; nothing downstream re-checks fields.
///
/// Broadcast is fire-and-forget: the call succeeds once the transport
/// accepts the event. No subscriber acknowledgment is awaited, nothing is
/// persisted, nothing is retried.
use crate::channel::BroadcastTransport;
use crate::error::{AppError, FieldError, Result};
use crate::models::{
    NotificationEvent, MAX_TITLE_LEN, NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT,
};
use std::sync::Arc;
use tracing::info;

pub struct NotificationDispatcher {
    transport: Arc<dyn BroadcastTransport>,
}

impl NotificationDispatcher {
    /// Create a new dispatcher over the given transport
    pub fn new(transport: Arc<dyn BroadcastTransport>) -> Self {
        Self { transport }
    }

    /// Validate and broadcast a notification.
    ///
    /// Returns the constructed event after the transport has accepted it
    /// for fan-out. The event is not retained anywhere after the call.
    pub async fn publish(&self, title: &str, description: &str) -> Result<NotificationEvent> {
        let event = validate(title, description)?;

        self.transport
            .publish(NOTIFICATIONS_CHANNEL, NOTIFICATION_SENT_EVENT, event.payload())
            .await?;

        info!(title = %event.title, "notification broadcast accepted");

        Ok(event)
    }
}

fn validate(title: &str, description: &str) -> Result<NotificationEvent> {
    let mut errors = Vec::new();

    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "title is required"));
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.push(FieldError::new(
            "title",
            format!("title must not exceed {} characters", MAX_TITLE_LEN),
        ));
    }

    if description.trim().is_empty() {
        errors.push(FieldError::new("description", "description is required"));
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(NotificationEvent {
        title: title.to_string(),
        description: description.to_string(),
    })
}
