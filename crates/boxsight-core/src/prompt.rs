//! Prompt source for the vision model.
//!
//! The prompt lives in an operator-editable text file. It is read once at
//! startup; a missing, unreadable or blank file falls back to the embedded
//! default and never fails the request path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::logging::{self, components};

/// Built-in box-counting instructions.
pub const DEFAULT_PROMPT: &str = r#"You are an expert computer vision AI specialized in counting boxes and extracting text labels from images.

Please analyze the provided image and:

1. **Count all visible boxes/packages/containers** in the image
2. **Extract any visible text labels, barcodes, or identifying information** on the boxes
3. **Identify the type of boxes** (shipping boxes, product boxes, containers, etc.)
4. **Note the arrangement/stacking** of boxes if relevant

Return your analysis in the following JSON format:
{
    "total_count": <number>,
    "box_details": [
        {
            "box_id": <sequential_number>,
            "type": "<box_type>",
            "labels": ["<text1>", "<text2>"],
            "confidence": <0.0-1.0>,
            "position": "<general_position_description>"
        }
    ],
    "summary": {
        "total_boxes": <number>,
        "boxes_with_labels": <number>,
        "common_labels": ["<frequent_labels>"],
        "arrangement": "<description_of_arrangement>"
    },
    "confidence_score": <overall_confidence_0.0-1.0>
}

Be thorough and accurate. If you cannot clearly see a box or are unsure, indicate lower confidence. If no text is visible on a box, use an empty array for labels."#;

/// Where the active prompt came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOrigin {
    File(PathBuf),
    Embedded,
}

/// Immutable prompt text, cheap to clone across handlers.
#[derive(Debug, Clone)]
pub struct PromptSource {
    text: Arc<str>,
    origin: PromptOrigin,
}

impl PromptSource {
    /// Load the prompt from `path`, falling back to [`DEFAULT_PROMPT`].
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                info!(
                    { logging::COMPONENT } = components::PROMPT,
                    path = %path.display(),
                    prompt_len = contents.trim().len(),
                    "Loaded prompt file"
                );
                Self {
                    text: Arc::from(contents.trim()),
                    origin: PromptOrigin::File(path.to_path_buf()),
                }
            }
            Ok(_) => {
                warn!(
                    { logging::COMPONENT } = components::PROMPT,
                    path = %path.display(),
                    "Prompt file is empty, using built-in prompt"
                );
                Self::embedded()
            }
            Err(e) => {
                warn!(
                    { logging::COMPONENT } = components::PROMPT,
                    path = %path.display(),
                    error = %e,
                    "Prompt file unreadable, using built-in prompt"
                );
                Self::embedded()
            }
        }
    }

    /// The built-in prompt.
    pub fn embedded() -> Self {
        Self {
            text: Arc::from(DEFAULT_PROMPT),
            origin: PromptOrigin::Embedded,
        }
    }

    /// Fixed prompt text, mainly for tests.
    pub fn fixed(text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Self::embedded();
        }
        Self {
            text: Arc::from(text),
            origin: PromptOrigin::Embedded,
        }
    }

    pub fn current_prompt(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &PromptOrigin {
        &self.origin
    }
}

impl Default for PromptSource {
    fn default() -> Self {
        Self::embedded()
    }
}
