//! Structured logging field name constants for boxsight.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query the same names across the API and the
//! provider client.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (degraded replies include a bounded preview) |
//! | INFO  | Lifecycle events (startup, shutdown), analysis completions |
//! | DEBUG | Decision points, config choices, provider request shape |
//!
//! Credentials (bearer tokens, provider keys) are never logged.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Component originating the log event. Values come from [`components`].
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "count_boxes", "describe_image", "normalize"
pub const OPERATION: &str = "op";

// ─── Upload fields ─────────────────────────────────────────────────────────

/// Client-supplied filename of the upload.
pub const FILENAME: &str = "filename";

/// Declared or resolved MIME type.
pub const CONTENT_TYPE: &str = "content_type";

/// Upload size in bytes.
pub const SIZE_BYTES: &str = "size_bytes";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of the prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of boxes reported in a normalized result.
pub const BOX_COUNT: &str = "box_count";

/// Provider attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// HTTP status returned by the provider.
pub const PROVIDER_STATUS: &str = "provider_status";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether normalization fell back to a degraded result.
pub const DEGRADED: &str = "degraded";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Values for the [`COMPONENT`] field.
pub mod components {
    pub const AUTH: &str = "auth";
    pub const VALIDATOR: &str = "validator";
    pub const PROMPT: &str = "prompt";
    pub const VISION: &str = "openai_vision";
    pub const NORMALIZER: &str = "normalizer";
    pub const API: &str = "api";
}
