use crate::services::gallery_service::PageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 429 Too Many Requests
    pub fn too_many_requests() -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));

        (self.status, body).into_response()
    }
}

/// Only the two request-level failures reach the client; the underlying
/// cause is logged, never echoed.
impl From<PageError> for AppError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::InvalidCursor(err) => {
                tracing::debug!("rejecting request: {}", err);
                AppError::bad_request("Invalid lastKey format")
            }
            PageError::StoreUnavailable(err) => {
                tracing::error!("find month error: {}", err);
                AppError::internal("Error listing objects")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{month_scanner::CursorError, object_store::StoreError};

    #[test]
    fn page_errors_map_to_fixed_messages() {
        let bad: AppError = PageError::InvalidCursor(CursorError("x".into())).into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "Invalid lastKey format");

        let down: AppError = PageError::StoreUnavailable(StoreError::List {
            prefix: "2025/11/".into(),
            message: "timeout".into(),
        })
        .into();
        assert_eq!(down.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(down.message, "Error listing objects");
    }
}
