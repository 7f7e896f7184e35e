//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrchestrationError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request that never reached the orchestrator.
    BadRequest(String),
    /// Missing or unknown bearer token.
    Unauthorized(String),
    /// Valid token without the required scope.
    Forbidden(String),
    /// Workflow failure.
    Orchestration(OrchestrationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Orchestration(err) => orchestration_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn orchestration_error_to_response(err: OrchestrationError) -> (StatusCode, String) {
    let status = match &err {
        OrchestrationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        OrchestrationError::NotFound(_) => StatusCode::NOT_FOUND,
        OrchestrationError::Backpressure(_) => StatusCode::SERVICE_UNAVAILABLE,
        OrchestrationError::Upstream { .. } => {
            tracing::error!(error = %err, "upstream failure");
            StatusCode::BAD_GATEWAY
        }
    };
    (status, err.to_string())
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        ApiError::Orchestration(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: OrchestrationError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_orchestration_status_mapping() {
        assert_eq!(
            status_of(OrchestrationError::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(OrchestrationError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(OrchestrationError::Backpressure("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(OrchestrationError::Upstream {
                status: 500,
                body: "x".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
    }
}
