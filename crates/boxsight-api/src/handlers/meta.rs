//! Service metadata and health handlers. Neither requires authentication.

use axum::response::IntoResponse;
use axum::Json;

use boxsight_core::defaults;

// =============================================================================
// SERVICE INFO
// =============================================================================

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": defaults::SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Counts boxes and reads their labels in uploaded images using a vision model",
        "endpoints": {
            "/": "Service information",
            "/health": "Liveness probe",
            "/count-boxes": "POST multipart image (field 'file'); full analysis",
            "/count-boxes-simple": "POST multipart image (field 'file'); total count and labels",
            "/count-boxes-base64": "POST JSON {\"image\": \"<base64>\"}; full analysis",
        },
    }))
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

/// Liveness only: never touches the vision provider.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": defaults::SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
