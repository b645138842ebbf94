//! boxsight-api - HTTP API server for boxsight
//!
//! The router is built here so integration tests exercise the same middleware
//! stack as the binary.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{MakeSpan, TraceLayer},
};
use tracing::{info_span, Span};
use uuid::Uuid;

use boxsight_core::{defaults, logging};

pub use error::ApiError;
pub use state::AppState;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Request span carrying the correlation ID, so handler events inherit it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            { logging::REQUEST_ID } = request_id(request)
        )
    }
}

fn request_id<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
}

// =============================================================================
// ROUTER
// =============================================================================

/// Body limit for a payload of `payload_bytes`, leaving room for framing so
/// the upload validator, not the framework, rejects oversized images.
fn body_limit(payload_bytes: u64) -> usize {
    usize::try_from(payload_bytes.saturating_add(defaults::MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX)
}

pub fn build_router(state: AppState) -> Router {
    let max_bytes = state.policy.max_bytes;
    // base64 inflates 3 bytes to 4
    let base64_bytes = max_bytes.div_ceil(3).saturating_mul(4);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/count-boxes", post(handlers::count_boxes))
        .route("/count-boxes-simple", post(handlers::count_boxes_simple))
        .route(
            "/count-boxes-base64",
            post(handlers::count_boxes_base64)
                .layer(DefaultBodyLimit::max(body_limit(base64_bytes))),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit(max_bytes)))
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
