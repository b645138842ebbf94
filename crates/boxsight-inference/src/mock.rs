//! Mock vision backend for deterministic testing.
//!
//! Returns a canned reply (or a canned failure) and records every call so
//! tests can assert whether the provider was reached at all.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boxsight_inference::mock::MockVisionBackend;
//!
//! #[tokio::test]
//! async fn test_with_mock_backend() {
//!     let backend = MockVisionBackend::new().with_reply(r#"{"total_count": 0}"#);
//!
//!     let reply = backend.describe_image(b"...", "image/png", "Count").await.unwrap();
//!     assert_eq!(backend.call_count(), 1);
//! }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use boxsight_core::{Error, Result};

use crate::vision::VisionBackend;

/// Failure the mock returns instead of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Provider unreachable.
    Unavailable,
    /// Provider did not answer in time.
    Timeout,
    /// Provider answered with an error status.
    Error,
}

impl MockFailure {
    fn to_error(self) -> Error {
        match self {
            Self::Unavailable => Error::ProviderUnavailable("mock: connection refused".into()),
            Self::Timeout => Error::ProviderTimeout("mock: request timed out".into()),
            Self::Error => Error::ProviderError("mock: server error (500)".into()),
        }
    }
}

/// One recorded `describe_image` call.
#[derive(Debug, Clone)]
pub struct MockVisionCall {
    pub mime_type: String,
    pub prompt: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone)]
struct MockConfig {
    reply: String,
    failure: Option<MockFailure>,
    latency_ms: u64,
    model: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            reply: "{}".to_string(),
            failure: None,
            latency_ms: 0,
            model: "mock-vision".to_string(),
        }
    }
}

/// Mock vision backend for testing.
#[derive(Clone, Default)]
pub struct MockVisionBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockVisionCall>>>,
}

impl MockVisionBackend {
    /// Create a new mock backend replying with `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reply text returned for every call.
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).reply = reply.into();
        self
    }

    /// Fail every call with the given failure.
    pub fn with_failure(mut self, failure: MockFailure) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(failure);
        self
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockVisionCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of `describe_image` calls so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        self.call_log.lock().unwrap().push(MockVisionCall {
            mime_type: mime_type.to_string(),
            prompt: prompt.to_string(),
            size_bytes: image_data.len(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        match self.config.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(self.config.reply.clone()),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
