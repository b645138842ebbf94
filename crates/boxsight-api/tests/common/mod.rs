#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use boxsight_api::{build_router, AppState};
use boxsight_core::{PromptSource, ServiceConfig};
use boxsight_inference::mock::MockVisionBackend;
use boxsight_inference::VisionBackend;

pub const API_KEY: &str = "test-secret-key";
pub const TEST_PROMPT: &str = "Count every box and read its labels.";
const BOUNDARY: &str = "boxsight-test-boundary";

/// Provider reply used throughout the end-to-end tests.
pub const PROVIDER_REPLY: &str = r#"{"total_count":2,"box_details":[{"box_id":1,"type":"box","labels":["FRAGILE"],"confidence":0.9,"position":"left"}],"summary":{"total_boxes":2,"boxes_with_labels":1,"common_labels":["FRAGILE"],"arrangement":"stacked"},"confidence_score":0.85}"#;

/// Build a test `ServiceConfig` with the bearer secret set and default limits.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        api_key: Some(API_KEY.to_string()),
        ..ServiceConfig::default()
    }
}

/// Build the full router with the given config and (optional) vision backend.
pub fn build_app(config: ServiceConfig, vision: Option<MockVisionBackend>) -> Router {
    let vision = vision.map(|m| Arc::new(m) as Arc<dyn VisionBackend>);
    build_router(AppState::new(config, PromptSource::fixed(TEST_PROMPT), vision))
}

/// Router with default config and a mock provider replying with [`PROVIDER_REPLY`].
pub fn build_test_app() -> (Router, MockVisionBackend) {
    let mock = MockVisionBackend::new().with_reply(PROVIDER_REPLY);
    (build_app(test_config(), Some(mock.clone())), mock)
}

pub fn bearer() -> String {
    format!("Bearer {}", API_KEY)
}

/// A JPEG-looking payload of `len` bytes.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len.max(4)];
    data[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    data
}

/// Encode a single multipart part.
pub fn multipart_body(
    field: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"\r\n").as_bytes(),
        ),
    }
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart upload with the image in the `file` field.
pub async fn post_image(
    app: Router,
    uri: &str,
    auth: Option<&str>,
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Response {
    let body = multipart_body("file", filename, content_type, data);
    post_multipart(app, uri, auth, body).await
}

pub async fn post_multipart(app: Router, uri: &str, auth: Option<&str>, body: Vec<u8>) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(
    app: Router,
    uri: &str,
    auth: Option<&str>,
    json: serde_json::Value,
) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    app.oneshot(builder.body(Body::from(json.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
