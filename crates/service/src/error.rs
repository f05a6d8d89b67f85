//! Read API errors.
//!
//! Handlers return [`Result`]. A 500 is reported to Sentry and logged with
//! its event id; the client only ever sees a generic message for it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why a lookup did not produce an order.
#[derive(Debug, Error)]
pub enum AppError {
    /// No cache entry for the requested id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request did not name an order.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A cached value could not be turned into a response.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if let Self::Internal(_) = &self {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Order lookup failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Order lookup rejected");
            self.to_string()
        };

        (status, body).into_response()
    }
}

/// Result type for read API handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_order() {
        assert_eq!(
            AppError::NotFound("order b563feb7".to_string()).to_string(),
            "Not found: order b563feb7"
        );
        assert_eq!(
            AppError::BadRequest("order id is required".to_string()).to_string(),
            "Bad request: order id is required"
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status(), expected);
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_not_found_body_is_descriptive() {
        let response = AppError::NotFound("order A".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        assert_eq!(body.as_ref(), b"Not found: order A");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("cached value for x1 is not JSON".to_string())
            .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        assert_eq!(body.as_ref(), b"Internal server error");
    }
}
