//! Static bearer-token guard.
//!
//! Tokens are compared as SHA-256 digests in constant time so neither the
//! secret's length nor its prefix leaks through response timing.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};

/// Decides whether a request's `Authorization` header carries the shared secret.
#[derive(Clone)]
pub struct BearerGuard {
    secret_digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for BearerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl BearerGuard {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret_digest: secret.filter(|s| !s.is_empty()).map(digest),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.api_key.as_deref())
    }

    pub fn is_configured(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Check a raw `Authorization` header value.
    ///
    /// Returns `Error::Config` when no secret is configured, so a missing
    /// `API_KEY` refuses every request instead of admitting them.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<()> {
        let expected = self
            .secret_digest
            .as_ref()
            .ok_or_else(|| Error::Config("API_KEY is not configured".to_string()))?;

        let token = authorization
            .and_then(bearer_token)
            .ok_or_else(|| Error::Unauthorized("Missing bearer token".to_string()))?;

        if bool::from(digest(token).ct_eq(expected)) {
            Ok(())
        } else {
            Err(Error::Unauthorized("Invalid API key".to_string()))
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token yields `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
