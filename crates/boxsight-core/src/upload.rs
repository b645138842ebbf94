//! Upload validation: size ceiling and image content-type allow-list.
//!
//! Runs before anything is sent to the vision provider, so rejected uploads
//! never cost an external call. Size is checked first: an oversized upload is
//! rejected as too large whatever its declared type.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};

/// Image formats the vision provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Canonical MIME type, used in the provider data URL.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Match a filename extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

/// Accepted MIME strings (lowercase) and the format each maps to.
static ACCEPTED_MIME_TYPES: Lazy<HashMap<&'static str, ImageFormat>> = Lazy::new(|| {
    [
        ("image/jpeg", ImageFormat::Jpeg),
        ("image/jpg", ImageFormat::Jpeg),
        ("image/pjpeg", ImageFormat::Jpeg),
        ("image/png", ImageFormat::Png),
        ("image/webp", ImageFormat::WebP),
        ("image/gif", ImageFormat::Gif),
    ]
    .into_iter()
    .collect()
});

/// Declared types that carry no information; the filename decides instead.
const GENERIC_MIME_TYPES: &[&str] = &["application/octet-stream"];

/// Limits applied to every upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.max_upload_bytes)
    }

    /// Reject `size` if it exceeds the ceiling.
    pub fn check_size(&self, size: u64) -> Result<()> {
        if size > self.max_bytes {
            return Err(Error::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate an upload, returning the resolved image format.
    ///
    /// `declared` is the client-supplied content type; `filename` is only
    /// consulted when `declared` is missing or generic.
    pub fn validate(
        &self,
        declared: Option<&str>,
        filename: Option<&str>,
        size: u64,
    ) -> Result<ImageFormat> {
        self.check_size(size)?;
        resolve_format(declared, filename)
    }

    /// Validate an in-memory upload that has no filename.
    ///
    /// A specific declared type decides; a missing or generic one falls back
    /// to sniffing the magic bytes.
    pub fn validate_bytes(&self, declared: Option<&str>, data: &[u8]) -> Result<ImageFormat> {
        self.check_size(data.len() as u64)?;

        match declared.map(essence).filter(|m| !m.is_empty()) {
            Some(mime) if !GENERIC_MIME_TYPES.contains(&mime.as_str()) => {
                resolve_format(Some(mime.as_str()), None)
            }
            _ => sniff_format(data).ok_or_else(|| {
                Error::UnsupportedMediaType(
                    "Could not detect image type. Supported: JPEG, PNG, WebP, GIF".to_string(),
                )
            }),
        }
    }
}

/// Resolve the image format from a declared content type and filename.
pub fn resolve_format(declared: Option<&str>, filename: Option<&str>) -> Result<ImageFormat> {
    let declared = declared.map(essence).filter(|m| !m.is_empty());

    match declared.as_deref() {
        Some(mime) if !GENERIC_MIME_TYPES.contains(&mime) => {
            ACCEPTED_MIME_TYPES.get(mime).copied().ok_or_else(|| {
                Error::UnsupportedMediaType(format!(
                    "Unsupported file type '{}'. Supported: JPEG, PNG, WebP, GIF",
                    mime
                ))
            })
        }
        _ => filename
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| ImageFormat::from_extension(ext))
            .ok_or_else(|| {
                Error::UnsupportedMediaType(format!(
                    "Cannot determine image type of '{}'. Supported: JPEG, PNG, WebP, GIF",
                    filename.unwrap_or("upload")
                ))
            }),
    }
}

/// Detect the image format from magic bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    infer::get(data).and_then(|kind| ACCEPTED_MIME_TYPES.get(kind.mime_type()).copied())
}

/// MIME essence: parameters stripped, trimmed, lowercased.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
