//! # boxsight-inference
//!
//! Vision provider abstraction for boxsight.
//!
//! This crate provides:
//! - [`VisionBackend`]: pluggable image-plus-prompt backend trait
//! - OpenAI-compatible implementation (feature `openai`, default)
//! - Recording mock backend (feature `mock`, always on for unit tests)
//!
//! # Feature Flags
//!
//! - `openai` (default): Enable the OpenAI-compatible vision backend
//! - `mock`: Export [`mock::MockVisionBackend`] for tests in dependent crates

pub mod vision;

#[cfg(feature = "openai")]
pub mod openai;

// Mock vision backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use boxsight_core::*;

#[cfg(feature = "openai")]
pub use openai::{OpenAIVisionBackend, OpenAIVisionConfig};

pub use vision::VisionBackend;
