use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::{AppError, FieldError};

/// API error type with HTTP status code, machine-readable kind and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let kind = err.kind();
        match err {
            AppError::Validation(fields) => Self {
                status: StatusCode::BAD_REQUEST,
                kind,
                message: fields
                    .first()
                    .map(|f| f.message.clone())
                    .unwrap_or_else(|| "Invalid request".to_string()),
                fields,
            },
            AppError::Unauthorized(msg) => Self::new(StatusCode::UNAUTHORIZED, kind, msg),
            AppError::Forbidden(msg) => Self::new(StatusCode::FORBIDDEN, kind, msg),
            AppError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, kind, msg),
            AppError::InvalidState(msg) | AppError::Conflict(msg) => {
                Self::new(StatusCode::CONFLICT, kind, msg)
            }
            AppError::PolicyViolation(msg) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, kind, msg)
            }
            AppError::ExternalService(msg) => {
                tracing::warn!(error = %msg, "external service failure");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    kind,
                    "Payment provider unavailable, please try again",
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, kind, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.kind,
            "message": self.message,
        });
        if !self.fields.is_empty() {
            body["fields"] = json!(self.fields);
        }

        (self.status, Json(body)).into_response()
    }
}
