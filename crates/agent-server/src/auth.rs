//! Shared-secret authentication for dashboard-only routes.

use agent_runtime::INTERNAL_TOKEN_HEADER;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor that admits only requests carrying the internal token in
/// `x-internal-token`.
#[derive(Debug, Clone, Copy)]
pub struct InternalAuth;

#[async_trait]
impl FromRequestParts<AppState> for InternalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.internal_token.as_deref() else {
            return Err(ApiError::Misconfigured("Internal token not configured"));
        };
        let provided = parts
            .headers
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            return Err(ApiError::Unauthorized);
        }
        Ok(InternalAuth)
    }
}

/// Equality whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
