//! Route handlers for the agent server.

pub mod chat;
pub mod health;
pub mod internal;
pub mod session;
pub mod widget;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Widget-facing API
        .route("/api/session", post(session::create_session))
        .route("/api/session/end", post(session::end_session))
        .route("/api/chat", post(chat::chat))
        .route("/api/widget/:chatbot_id/config", get(widget::widget_config))
        // Transcripts, internal token required
        .route("/api/sessions/:app_name/:user_id", get(session::list_sessions))
        .route(
            "/api/sessions/:app_name/:user_id/:session_id",
            get(session::get_session),
        )
        // Dashboard hook
        .route("/api/internal/reload/:chatbot_id", post(internal::reload))
        // Health check
        .route("/api/health", get(health::health))
}

/// Trimmed, non-empty request field.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
