//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestration::OrchestrationError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Request conflicts with current state (e.g. not enough stock).
    Conflict(String),
    /// Authentication or signature failure.
    Unauthorized(String),
    /// An upstream service failed or timed out.
    BadGateway(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadGateway(msg) => {
                tracing::error!(error = %msg, "upstream dependency failure");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrchestrationError::InsufficientStock(_) => ApiError::Conflict(err.to_string()),
            OrchestrationError::InvalidArgument(_) | OrchestrationError::Validation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            OrchestrationError::Unauthorized(_) => ApiError::Unauthorized(err.to_string()),
            OrchestrationError::DependencyFailure(_) => ApiError::BadGateway(err.to_string()),
            OrchestrationError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_error_category_mapping() {
        assert_eq!(
            status_of(OrchestrationError::NotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(OrchestrationError::InsufficientStock("x".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(OrchestrationError::InvalidArgument("x".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrchestrationError::Unauthorized("x".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(OrchestrationError::DependencyFailure("x".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }
}
