//! OpenAI-compatible vision backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info, warn};

use boxsight_core::logging::{self, components};
use boxsight_core::{defaults, Error, ProviderSettings, Result};

use super::error::{to_provider_error, OpenAIErrorCode};
use super::types::*;
use crate::vision::VisionBackend;

/// Configuration for the OpenAI-compatible vision backend.
#[derive(Clone)]
pub struct OpenAIVisionConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Vision-capable model.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// `image_url.detail` value.
    pub image_detail: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Extra attempts for retryable failures.
    pub max_retries: u32,
    /// First retry delay in milliseconds; doubles per attempt.
    pub retry_base_delay_ms: u64,
}

impl std::fmt::Debug for OpenAIVisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIVisionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("image_detail", &self.image_detail)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl OpenAIVisionConfig {
    /// Build from service settings. Returns None if no API key is configured.
    pub fn from_settings(settings: &ProviderSettings) -> Option<Self> {
        let api_key = settings.api_key.clone()?;
        Some(Self {
            base_url: settings.base_url.clone(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            image_detail: settings.image_detail.clone(),
            timeout_seconds: settings.timeout_secs,
            max_retries: settings.max_retries,
            retry_base_delay_ms: defaults::VISION_RETRY_BASE_DELAY_MS,
        })
    }
}

/// One failed attempt, with whether another attempt may help.
struct AttemptFailure {
    error: Error,
    retryable: bool,
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(e: reqwest::Error) -> Self {
        let error = Error::from(e);
        Self {
            retryable: error.is_transient(),
            error,
        }
    }
}

/// OpenAI-compatible vision backend.
pub struct OpenAIVisionBackend {
    client: Client,
    config: OpenAIVisionConfig,
}

impl OpenAIVisionBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIVisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            { logging::COMPONENT } = components::VISION,
            url = %config.base_url,
            model = %config.model,
            timeout_secs = config.timeout_seconds,
            max_retries = config.max_retries,
            "Initializing OpenAI vision backend"
        );

        Ok(Self { client, config })
    }

    /// Create from service settings.
    /// Returns Ok(None) if `OPENAI_API_KEY` is not set.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Option<Self>> {
        OpenAIVisionConfig::from_settings(settings)
            .map(Self::new)
            .transpose()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIVisionConfig {
        &self.config
    }

    fn build_request(&self, image_data: &[u8], mime_type: &str, prompt: &str) -> VisionChatRequest {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        let data_url = format!("data:{};base64,{}", mime_type, image_b64);

        VisionChatRequest {
            model: self.config.model.clone(),
            messages: vec![VisionMessage::user(vec![
                ContentPart::text(prompt),
                ContentPart::image(data_url, self.config.image_detail.clone()),
            ])],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        }
    }

    async fn send_once(&self, request: &VisionChatRequest) -> std::result::Result<String, AttemptFailure> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, error_type) = match serde_json::from_str::<OpenAIErrorResponse>(&body) {
                Ok(parsed) => (parsed.error.message, parsed.error.error_type.unwrap_or_default()),
                Err(_) => (body.chars().take(defaults::RAW_PREVIEW_CHARS).collect(), String::new()),
            };
            let code = OpenAIErrorCode::from_response(status.as_u16(), &error_type);
            warn!(
                { logging::COMPONENT } = components::VISION,
                { logging::PROVIDER_STATUS } = status.as_u16(),
                error_code = ?code,
                { logging::ERROR_MSG } = %message,
                "Vision provider returned an error"
            );
            return Err(AttemptFailure {
                error: to_provider_error(code, status.as_u16(), &message),
                retryable: code.is_retryable(),
            });
        }

        // Decode failures map to ProviderError; a body read that times out stays a timeout.
        let result: ChatCompletionResponse = response.json().await?;

        if let Some(usage) = &result.usage {
            debug!(
                { logging::COMPONENT } = components::VISION,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Vision token usage"
            );
        }

        Ok(result.first_text())
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(factor))
    }
}

#[async_trait]
impl VisionBackend for OpenAIVisionBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        let request = self.build_request(image_data, mime_type, prompt);
        let started = Instant::now();

        debug!(
            { logging::COMPONENT } = components::VISION,
            { logging::MODEL } = %self.config.model,
            { logging::CONTENT_TYPE } = mime_type,
            { logging::SIZE_BYTES } = image_data.len(),
            { logging::PROMPT_LEN } = prompt.len(),
            "Sending image to vision provider"
        );

        let mut attempt: u32 = 1;
        loop {
            match self.send_once(&request).await {
                Ok(text) => {
                    info!(
                        { logging::COMPONENT } = components::VISION,
                        { logging::MODEL } = %self.config.model,
                        { logging::ATTEMPT } = attempt,
                        { logging::DURATION_MS } = started.elapsed().as_millis() as u64,
                        { logging::RESPONSE_LEN } = text.len(),
                        "Vision analysis complete"
                    );
                    return Ok(text);
                }
                Err(failure) if failure.retryable && attempt <= self.config.max_retries => {
                    let delay = self.retry_delay(attempt);
                    warn!(
                        { logging::COMPONENT } = components::VISION,
                        { logging::ATTEMPT } = attempt,
                        delay_ms = delay.as_millis() as u64,
                        { logging::ERROR_MSG } = %failure.error,
                        "Vision request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(
                        { logging::COMPONENT } = components::VISION,
                        { logging::ATTEMPT } = attempt,
                        { logging::DURATION_MS } = started.elapsed().as_millis() as u64,
                        { logging::ERROR_MSG } = %failure.error,
                        "Vision request failed"
                    );
                    return Err(failure.error);
                }
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
