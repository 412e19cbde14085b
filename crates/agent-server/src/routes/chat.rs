//! Chat route.

use agent_core::{collect_text, SessionKey};
use agent_runtime::chatbot_id_from_app_name;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::required;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Reply used when the agent produced no text.
const EMPTY_REPLY: &str = "I couldn't generate a response.";

const FAILED: &str = "Failed to process message";

/// One visitor message.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatBody {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub app_name: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
}

/// Run one agent turn in an existing session.
pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatBody>) -> Result<Json<ChatReply>> {
    let message = body.message.filter(|m| !m.trim().is_empty());
    let (Some(session_id), Some(user_id), Some(app_name), Some(message)) = (
        required(body.session_id),
        required(body.user_id),
        required(body.app_name),
        message,
    ) else {
        return Err(ApiError::BadRequest(
            "sessionId, userId, appName, and message are required",
        ));
    };

    let runtime = &state.runtime;
    let chatbot_id = chatbot_id_from_app_name(&app_name).unwrap_or(&app_name);

    let key = SessionKey::new(app_name.as_str(), user_id.as_str(), session_id.as_str());
    if !runtime
        .sessions()
        .session_exists(&key)
        .await
        .map_err(ApiError::internal(FAILED))?
    {
        return Err(ApiError::NotFound("Session not found. Please create a new session."));
    }

    let active = runtime
        .loader()
        .is_chatbot_active(chatbot_id)
        .await
        .map_err(ApiError::internal(FAILED))?;
    if !active {
        return Err(ApiError::Forbidden("Chatbot is no longer active"));
    }

    let config = runtime
        .loader()
        .load_chatbot_config(chatbot_id)
        .await
        .map_err(ApiError::internal(FAILED))?
        .ok_or(ApiError::NotFound("Chatbot configuration not found"))?;

    let runner = runtime
        .runner_for_config(&config)
        .await
        .map_err(ApiError::internal(FAILED))?;
    let events = runner
        .run(&user_id, &session_id, &message)
        .await
        .map_err(ApiError::internal(FAILED))?;

    let text = collect_text(&events);
    debug!(chatbot_id, session_id = %session_id, reply_len = text.len(), "Chat turn complete");

    Ok(Json(ChatReply {
        success: true,
        response: if text.is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text
        },
    }))
}
