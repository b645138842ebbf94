//! Error types for boxsight.

use thiserror::Error;

/// Result type alias using boxsight's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for boxsight operations.
///
/// Normalization never produces one of these: an unparseable model reply is a
/// degraded [`crate::AnalysisResult`], not a fault.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or mismatched bearer credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upload content type is not an accepted image format
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Upload exceeds the configured size ceiling
    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Vision provider could not be reached
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Vision provider did not answer within the configured timeout
    #[error("Provider timeout: {0}")]
    ProviderTimeout(String),

    /// Vision provider answered with a non-success status or an unreadable body
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether another attempt against the provider could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable(_) | Error::ProviderTimeout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::ProviderTimeout(e.to_string())
        } else if e.is_decode() {
            Error::ProviderError(e.to_string())
        } else {
            Error::ProviderUnavailable(e.to_string())
        }
    }
}
