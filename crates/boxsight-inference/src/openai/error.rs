//! OpenAI-specific error handling.

use boxsight_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Image or prompt rejected (bad format, too large, policy).
    InvalidRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) | (413, _) | (422, _) => Self::InvalidRequest,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert a provider error response into a boxsight [`Error`].
///
/// Every status maps to `ProviderError`; the code only shapes the message,
/// which stays server-side.
pub fn to_provider_error(code: OpenAIErrorCode, status: u16, message: &str) -> Error {
    let kind = match code {
        OpenAIErrorCode::AuthenticationError => "authentication failed",
        OpenAIErrorCode::RateLimitExceeded => "rate limit exceeded",
        OpenAIErrorCode::ModelNotFound => "model not found",
        OpenAIErrorCode::InvalidRequest => "request rejected",
        OpenAIErrorCode::ServerError => "server error",
        OpenAIErrorCode::Unknown => "unexpected status",
    };
    Error::ProviderError(format!("{} ({}): {}", kind, status, message))
}
