//! Box-counting HTTP handlers.
//!
//! Each handler runs the same pipeline: bearer check, upload validation,
//! one vision provider call with the configured prompt, then normalization
//! of the reply into an [`AnalysisResult`]. Uploads are validated before the
//! provider is looked up or contacted.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use boxsight_core::logging::{self, components};
use boxsight_core::{normalize, AnalysisResult, SimpleAnalysis, UploadPolicy, UploadedImage};
use boxsight_inference::VisionBackend;

use crate::auth::RequireApiKey;
use crate::{ApiError, AppState};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Response for `POST /count-boxes`.
#[derive(Debug, Serialize)]
pub struct CountBoxesResponse {
    /// Client-supplied filename, if any.
    pub filename: Option<String>,
    pub analysis: AnalysisResult,
}

/// Request body for `POST /count-boxes-base64`.
#[derive(Debug, Deserialize)]
pub struct Base64ImageRequest {
    /// Base64 image data, optionally as a `data:<mime>;base64,` URL.
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ImageInfo {
    pub size_bytes: u64,
    pub content_type: String,
}

/// Response for `POST /count-boxes-base64`.
#[derive(Debug, Serialize)]
pub struct Base64AnalysisResponse {
    pub analysis: AnalysisResult,
    pub image_info: ImageInfo,
}

/// Count boxes and read their labels in an uploaded image.
///
/// # Multipart Fields
/// - `file`: JPEG, PNG, WebP or GIF image (required)
///
/// # Returns
/// - 200 OK with `{filename, analysis}`
/// - 400 Bad Request if the file is missing or empty
/// - 401 Unauthorized without a valid bearer token
/// - 413 Payload Too Large above `MAX_FILE_SIZE_MB`
/// - 415 Unsupported Media Type for non-image uploads
/// - 502/504 if the vision provider fails or times out
/// - 503 Service Unavailable if the provider or API key is not configured
pub async fn count_boxes(
    _auth: RequireApiKey,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CountBoxesResponse>, ApiError> {
    let image = read_upload(&state.policy, multipart).await?;
    let backend = vision_backend(&state)?;
    let analysis = analyze(backend.as_ref(), state.prompt.current_prompt(), &image).await?;

    Ok(Json(CountBoxesResponse {
        filename: image.filename,
        analysis,
    }))
}

/// Same as [`count_boxes`], answering only `{total_count, labels}`.
pub async fn count_boxes_simple(
    _auth: RequireApiKey,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SimpleAnalysis>, ApiError> {
    let image = read_upload(&state.policy, multipart).await?;
    let backend = vision_backend(&state)?;
    let analysis = analyze(backend.as_ref(), state.prompt.current_prompt(), &image).await?;

    Ok(Json(analysis.to_simple()))
}

/// Count boxes in a base64-encoded image sent as JSON.
///
/// # Request Body
/// - `image`: base64 image bytes or a `data:image/...;base64,` URL (required)
///
/// # Returns
/// - 200 OK with `{analysis, image_info}`
/// - 400 Bad Request for invalid or empty base64 data
/// - other statuses as for [`count_boxes`]
pub async fn count_boxes_base64(
    _auth: RequireApiKey,
    State(state): State<AppState>,
    Json(req): Json<Base64ImageRequest>,
) -> Result<Json<Base64AnalysisResponse>, ApiError> {
    let (declared, payload) = split_data_url(&req.image)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(strip_whitespace(payload))
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 image data: {}", e)))?;

    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Image data is empty".into()));
    }

    let format = state.policy.validate_bytes(declared, &bytes)?;
    let image = UploadedImage {
        filename: None,
        content_type: format.mime_type().to_string(),
        bytes,
    };

    let backend = vision_backend(&state)?;
    let analysis = analyze(backend.as_ref(), state.prompt.current_prompt(), &image).await?;

    Ok(Json(Base64AnalysisResponse {
        analysis,
        image_info: ImageInfo {
            size_bytes: image.size(),
            content_type: image.content_type,
        },
    }))
}

fn vision_backend(state: &AppState) -> Result<Arc<dyn VisionBackend>, ApiError> {
    state.vision.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable(
            "Vision provider not configured. Set OPENAI_API_KEY environment variable.".into(),
        )
    })
}

/// Read the `file` field, enforcing the size ceiling while streaming.
async fn read_upload(
    policy: &UploadPolicy,
    mut multipart: Multipart,
) -> Result<UploadedImage, ApiError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue; // ignore unknown fields
        }

        let filename = field.file_name().map(|n| n.to_string());
        let declared = field.content_type().map(|c| c.to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            // Stop reading as soon as the ceiling is crossed
            policy.check_size((bytes.len() + chunk.len()) as u64)?;
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".into()));
        }

        let format = policy.validate(declared.as_deref(), filename.as_deref(), bytes.len() as u64)?;

        debug!(
            { logging::COMPONENT } = components::VALIDATOR,
            { logging::FILENAME } = filename.as_deref().unwrap_or("(none)"),
            declared = declared.as_deref().unwrap_or("(none)"),
            { logging::CONTENT_TYPE } = format.mime_type(),
            { logging::SIZE_BYTES } = bytes.len(),
            "Upload accepted"
        );

        return Ok(UploadedImage {
            filename,
            content_type: format.mime_type().to_string(),
            bytes,
        });
    }

    Err(ApiError::BadRequest(
        "Missing file in multipart form".to_string(),
    ))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Split an optional `data:<mime>;base64,` prefix from the payload.
fn split_data_url(input: &str) -> Result<(Option<&str>, &str), ApiError> {
    let input = input.trim();
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok((None, input));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ApiError::BadRequest("Malformed data URL".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ApiError::BadRequest("Data URL must be base64-encoded".into()))?;

    Ok(((!mime.is_empty()).then_some(mime), payload))
}

/// Line-wrapped base64 (MIME style, 76 columns) decodes like a single line.
fn strip_whitespace(payload: &str) -> String {
    payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

/// Send the image to the provider and normalize its reply.
async fn analyze(
    backend: &dyn VisionBackend,
    prompt: &str,
    image: &UploadedImage,
) -> Result<AnalysisResult, ApiError> {
    let started = Instant::now();

    let raw = backend
        .describe_image(&image.bytes, &image.content_type, prompt)
        .await?;
    let analysis = normalize(&raw);

    info!(
        { logging::COMPONENT } = components::API,
        { logging::OPERATION } = "count_boxes",
        { logging::MODEL } = backend.model_name(),
        { logging::FILENAME } = image.filename.as_deref().unwrap_or("(none)"),
        { logging::CONTENT_TYPE } = %image.content_type,
        { logging::SIZE_BYTES } = image.size(),
        { logging::BOX_COUNT } = analysis.total_count,
        { logging::DEGRADED } = analysis.is_degraded(),
        { logging::DURATION_MS } = started.elapsed().as_millis() as u64,
        "Image analyzed"
    );

    Ok(analysis)
}
