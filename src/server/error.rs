//! Host Error Types
//!
//! Errors raised while serving the dashboard or proxying to the backend, and
//! their conversion to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Host and proxy error types
#[derive(Error, Debug)]
pub enum HostError {
    /// No document, asset or route for this path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Only GET and HEAD reach the SPA document
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the configured limit
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Upstream refused or dropped the connection
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Upstream did not answer in time
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl HostError {
    pub fn status(&self) -> StatusCode {
        match self {
            HostError::NotFound(_) => StatusCode::NOT_FOUND,
            HostError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HostError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HostError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HostError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HostError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            HostError::Internal(_) | HostError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            HostError::NotFound(_) => "NOT_FOUND",
            HostError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            HostError::BadRequest(_) => "BAD_REQUEST",
            HostError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            HostError::BadGateway(_) => "BAD_GATEWAY",
            HostError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
            HostError::Internal(_) => "INTERNAL_ERROR",
            HostError::Io(_) => "IO_ERROR",
        }
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HostError::NotFound("/x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HostError::BadGateway("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            HostError::GatewayTimeout("30s".into()).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            HostError::PayloadTooLarge(10).into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
