// =============================================================================
// AUTHENTICATION
// =============================================================================

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use tracing::debug;

use boxsight_core::logging::{self, components};

use crate::{ApiError, AppState};

/// Extractor that requires `Authorization: Bearer <API_KEY>`.
///
/// Usage:
/// ```ignore
/// async fn my_handler(_auth: RequireApiKey, State(state): State<AppState>) -> impl IntoResponse {
///     // ... handler logic
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireApiKey;

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if let Err(e) = state.guard.authorize(auth_header) {
            debug!(
                { logging::COMPONENT } = components::AUTH,
                path = %parts.uri.path(),
                reason = %e,
                "Request rejected"
            );
            return Err(e.into());
        }

        Ok(RequireApiKey)
    }
}
