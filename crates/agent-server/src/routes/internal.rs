//! Internal cache-invalidation hook for the dashboard.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::auth::InternalAuth;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Reloaded {
    pub success: bool,
    pub message: String,
}

/// Drop the cached agent, runner, configuration and knowledge for a
/// chatbot and load it again. Requires the shared internal token.
pub async fn reload(
    _auth: InternalAuth,
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
) -> Result<Json<Reloaded>> {
    state
        .runtime
        .reload(&chatbot_id)
        .await
        .map_err(ApiError::internal("Failed to reload configuration"))?;

    info!(chatbot_id = %chatbot_id, "Configuration reloaded");
    Ok(Json(Reloaded {
        success: true,
        message: format!("Configuration reloaded for chatbot {}", chatbot_id),
    }))
}
