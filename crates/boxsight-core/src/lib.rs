//! # boxsight-core
//!
//! Core types, configuration and pure request-path logic for boxsight.
//!
//! This crate provides the pieces that need no network access:
//! - [`ServiceConfig`]: process configuration loaded once at startup
//! - [`BearerGuard`]: static bearer-token check
//! - [`UploadPolicy`]: upload size ceiling and image type allow-list
//! - [`PromptSource`]: operator-editable prompt with a built-in fallback
//! - [`normalize`]: model reply to [`AnalysisResult`] coercion

pub mod auth;
pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod upload;

// Re-export commonly used types at crate root
pub use auth::BearerGuard;
pub use config::{ProviderSettings, ServiceConfig};
pub use error::{Error, Result};
pub use models::{AnalysisResult, BoxDetail, SimpleAnalysis, Summary, UploadedImage};
pub use normalize::{normalize, parse_analysis, DegradeReason, Degraded};
pub use prompt::{PromptOrigin, PromptSource, DEFAULT_PROMPT};
pub use upload::{resolve_format, sniff_format, ImageFormat, UploadPolicy};
