//! Centralized default constants for boxsight.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration loading, the provider client and the HTTP layer reference
//! these constants instead of defining their own magic numbers.

// =============================================================================
// SERVER
// =============================================================================

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default log level when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const LOG_LEVEL: &str = "info";

/// Service name reported by `/` and `/health`.
pub const SERVICE_NAME: &str = "boxsight";

// =============================================================================
// UPLOADS
// =============================================================================

/// Default upload ceiling in megabytes.
pub const MAX_FILE_SIZE_MB: u64 = 20;

/// Bytes per megabyte for `MAX_FILE_SIZE_MB`.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Headroom added to the framework body limit on top of the upload ceiling,
/// covering multipart boundaries and headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

// =============================================================================
// PROMPT
// =============================================================================

/// Default operator-editable prompt file.
pub const PROMPT_FILE: &str = "prompt.txt";

// =============================================================================
// VISION PROVIDER
// =============================================================================

/// Default OpenAI API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default vision-capable model.
pub const VISION_MODEL: &str = "gpt-4o";

/// Completion token budget per analysis.
pub const VISION_MAX_TOKENS: u32 = 2000;

/// Low temperature keeps counts stable across calls.
pub const VISION_TEMPERATURE: f32 = 0.1;

/// `image_url.detail` sent with every image.
pub const VISION_IMAGE_DETAIL: &str = "high";

/// Provider request timeout in seconds.
pub const VISION_TIMEOUT_SECS: u64 = 60;

/// Extra attempts for retryable provider failures (0 = single attempt).
pub const VISION_MAX_RETRIES: u32 = 0;

/// First retry delay; doubles on every further attempt.
pub const VISION_RETRY_BASE_DELAY_MS: u64 = 500;

// =============================================================================
// NORMALIZER
// =============================================================================

/// `summary.arrangement` when the provider omits it.
pub const ARRANGEMENT_UNKNOWN: &str = "unknown";

/// `summary.arrangement` of a degraded result.
pub const ARRANGEMENT_UNPARSEABLE: &str = "unparseable";

/// `box_details[].type` when the provider omits it.
pub const BOX_TYPE_UNKNOWN: &str = "unknown";

/// Characters of raw provider text included in degrade warnings.
pub const RAW_PREVIEW_CHARS: usize = 200;
