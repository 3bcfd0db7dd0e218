use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("broadcast transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Shorthand for a single-field validation failure
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 422,
            AppError::TransportUnavailable(_) => 503,
            AppError::Config(_) | AppError::Internal => 500,
        }
    }

    /// Field errors grouped per field, in the shape validation responses use
    pub fn errors_by_field(&self) -> serde_json::Value {
        let mut grouped = serde_json::Map::new();
        if let AppError::Validation(errors) = self {
            for err in errors {
                if let Some(messages) = grouped
                    .entry(err.field.to_string())
                    .or_insert_with(|| json!([]))
                    .as_array_mut()
                {
                    messages.push(json!(err.message));
                }
            }
        }
        serde_json::Value::Object(grouped)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(AppError::status_code(self)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if matches!(self, AppError::Validation(_)) {
            body["errors"] = self.errors_by_field();
        }
        HttpResponse::build(ResponseError::status_code(self)).json(body)
    }
}
