// =============================================================================
// ERROR HANDLING
// =============================================================================

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{error, warn};

use boxsight_core::logging::{self, components};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    BadRequest(String),
    /// Provider unreachable or answered with an error.
    BadGateway(String),
    GatewayTimeout(String),
    /// A required dependency (API key, provider) is not configured.
    ServiceUnavailable(String),
    Internal(String),
}

impl From<boxsight_core::Error> for ApiError {
    fn from(err: boxsight_core::Error) -> Self {
        use boxsight_core::Error;
        match err {
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::UnsupportedMediaType(msg) => ApiError::UnsupportedMediaType(msg),
            e @ Error::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Config(msg) => {
                error!(
                    { logging::COMPONENT } = components::API,
                    { logging::ERROR_MSG } = %msg,
                    "Service misconfigured"
                );
                ApiError::ServiceUnavailable(msg)
            }
            e @ (Error::ProviderUnavailable(_) | Error::ProviderError(_)) => {
                warn!(
                    { logging::COMPONENT } = components::API,
                    { logging::ERROR_MSG } = %e,
                    "Vision provider failed"
                );
                ApiError::BadGateway("Vision provider request failed".to_string())
            }
            e @ Error::ProviderTimeout(_) => {
                warn!(
                    { logging::COMPONENT } = components::API,
                    { logging::ERROR_MSG } = %e,
                    "Vision provider timed out"
                );
                ApiError::GatewayTimeout("Vision provider timed out".to_string())
            }
            e @ (Error::Serialization(_) | Error::Io(_)) => {
                error!(
                    { logging::COMPONENT } = components::API,
                    { logging::ERROR_MSG } = %e,
                    "Internal error"
                );
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
