//! Service configuration, built once at startup and shared read-only.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::defaults;

/// Environment variable names recognized by [`ServiceConfig::from_env`].
pub mod env {
    pub const API_KEY: &str = "API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    pub const OPENAI_VISION_MODEL: &str = "OPENAI_VISION_MODEL";
    pub const OPENAI_MAX_TOKENS: &str = "OPENAI_MAX_TOKENS";
    pub const OPENAI_TEMPERATURE: &str = "OPENAI_TEMPERATURE";
    pub const OPENAI_IMAGE_DETAIL: &str = "OPENAI_IMAGE_DETAIL";
    pub const OPENAI_TIMEOUT: &str = "OPENAI_TIMEOUT";
    pub const OPENAI_MAX_RETRIES: &str = "OPENAI_MAX_RETRIES";
    pub const MAX_FILE_SIZE_MB: &str = "MAX_FILE_SIZE_MB";
    pub const PROMPT_FILE: &str = "PROMPT_FILE";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const HOST: &str = "HOST";
    pub const PORT: &str = "PORT";
}

/// Vision provider settings.
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    /// Provider credential. `None` disables analysis endpoints.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Vision-capable model name.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// `image_url.detail` value ("low", "high", "auto").
    pub image_detail: String,
    pub timeout_secs: u64,
    /// Extra attempts for retryable failures.
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::OPENAI_URL.to_string(),
            model: defaults::VISION_MODEL.to_string(),
            max_tokens: defaults::VISION_MAX_TOKENS,
            temperature: defaults::VISION_TEMPERATURE,
            image_detail: defaults::VISION_IMAGE_DETAIL.to_string(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
            max_retries: defaults::VISION_MAX_RETRIES,
        }
    }
}

/// Process-wide configuration.
///
/// Constructed once in `main` and injected into every component; nothing
/// reads the environment after startup.
#[derive(Clone, PartialEq)]
pub struct ServiceConfig {
    /// Shared bearer secret. `None` means protected endpoints refuse service.
    pub api_key: Option<String>,
    pub provider: ProviderSettings,
    /// Upload ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Operator-editable prompt file.
    pub prompt_path: PathBuf,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderSettings::default(),
            max_upload_bytes: defaults::MAX_FILE_SIZE_MB * defaults::BYTES_PER_MB,
            prompt_path: PathBuf::from(defaults::PROMPT_FILE),
            log_level: defaults::LOG_LEVEL.to_string(),
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
        }
    }
}

// Secrets are reported as set/unset only.
fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("image_detail", &self.image_detail)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("provider", &self.provider)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("prompt_path", &self.prompt_path)
            .field("log_level", &self.log_level)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl ServiceConfig {
    /// Create from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup.
    ///
    /// Empty values count as unset. Unparseable numbers fall back to the
    /// default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let base = Self::default();

        let max_file_size_mb: u64 = parse_or_default(
            env::MAX_FILE_SIZE_MB,
            get(env::MAX_FILE_SIZE_MB),
            defaults::MAX_FILE_SIZE_MB,
        );

        let provider = ProviderSettings {
            api_key: get(env::OPENAI_API_KEY),
            base_url: get(env::OPENAI_BASE_URL).unwrap_or(base.provider.base_url),
            model: get(env::OPENAI_VISION_MODEL).unwrap_or(base.provider.model),
            max_tokens: parse_or_default(
                env::OPENAI_MAX_TOKENS,
                get(env::OPENAI_MAX_TOKENS),
                base.provider.max_tokens,
            ),
            temperature: parse_or_default(
                env::OPENAI_TEMPERATURE,
                get(env::OPENAI_TEMPERATURE),
                base.provider.temperature,
            ),
            image_detail: get(env::OPENAI_IMAGE_DETAIL).unwrap_or(base.provider.image_detail),
            timeout_secs: parse_or_default(
                env::OPENAI_TIMEOUT,
                get(env::OPENAI_TIMEOUT),
                base.provider.timeout_secs,
            ),
            max_retries: parse_or_default(
                env::OPENAI_MAX_RETRIES,
                get(env::OPENAI_MAX_RETRIES),
                base.provider.max_retries,
            ),
        };

        Self {
            api_key: get(env::API_KEY),
            provider,
            max_upload_bytes: max_file_size_mb.saturating_mul(defaults::BYTES_PER_MB),
            prompt_path: get(env::PROMPT_FILE)
                .map(PathBuf::from)
                .unwrap_or(base.prompt_path),
            log_level: get(env::LOG_LEVEL)
                .map(|v| v.to_lowercase())
                .unwrap_or(base.log_level),
            host: get(env::HOST).unwrap_or(base.host),
            port: parse_or_default(env::PORT, get(env::PORT), base.port),
        }
    }

    /// Whether a bearer secret is configured.
    pub fn auth_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Whether the vision provider can be called.
    pub fn provider_configured(&self) -> bool {
        self.provider.api_key.is_some()
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                variable = key,
                value = %value,
                default = %default,
                "Unparseable configuration value, using default"
            );
            default
        }),
    }
}
