//! Vision backend trait.

use async_trait::async_trait;
use boxsight_core::Result;

/// Backend that answers a prompt about an image with free-form text.
///
/// Implementations make exactly one logical request per call (plus any
/// bounded retries they are configured for) and hold no per-request state.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send `image_data` with `prompt` to the model and return its reply text.
    ///
    /// Failures map to `Error::ProviderUnavailable`, `Error::ProviderTimeout`
    /// or `Error::ProviderError`.
    async fn describe_image(&self, image_data: &[u8], mime_type: &str, prompt: &str)
        -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
