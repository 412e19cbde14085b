//! Session routes.

use agent_core::{CreateSessionRequest, GetSessionOptions, Session, SessionKey, SessionMetadata};
use agent_runtime::app_name_for;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tracing::{info, warn};

use super::required;
use crate::auth::InternalAuth;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Request to open a widget session.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateSessionBody {
    pub chatbot_id: Option<String>,
    pub visitor_id: Option<String>,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub success: bool,
    pub session_id: String,
    pub user_id: String,
    pub app_name: String,
    pub message: &'static str,
}

/// Addresses a session for ending it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndSessionBody {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub app_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionEnded {
    pub success: bool,
    pub message: &'static str,
}

/// Transcript filters.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranscriptQuery {
    pub after_timestamp: Option<i64>,
    pub num_recent_events: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub success: bool,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub success: bool,
    pub session: Session,
}

/// Open a session for an active chatbot.
pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateSessionBody>,
) -> Result<Json<SessionCreated>> {
    let chatbot_id = required(body.chatbot_id).ok_or(ApiError::BadRequest("chatbotId is required"))?;

    let chatbot = state
        .runtime
        .loader()
        .load_chatbot_config(&chatbot_id)
        .await
        .map_err(ApiError::internal("Failed to create session"))?
        .ok_or(ApiError::NotFound("Chatbot not found"))?;
    if !chatbot.is_active {
        return Err(ApiError::Forbidden("Chatbot is not active"));
    }

    let user_agent = body.user_agent.or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });
    let visitor_id = required(body.visitor_id);
    let user_id = visitor_id
        .clone()
        .unwrap_or_else(|| format!("visitor_{}", uuid::Uuid::new_v4()));

    let mut initial_state = Map::new();
    initial_state.insert("chatbotId".to_string(), json!(chatbot_id));

    let request = CreateSessionRequest {
        state: initial_state,
        metadata: SessionMetadata {
            chatbot_id: Some(chatbot_id.clone()),
            visitor_id,
            visitor_name: body.visitor_name,
            visitor_email: body.visitor_email,
            page_url: body.page_url,
            user_agent,
        },
        ..CreateSessionRequest::new(app_name_for(&chatbot_id), user_id)
    };

    let session = state
        .runtime
        .sessions()
        .create_session(request)
        .await
        .map_err(ApiError::internal("Failed to create session"))?;

    info!(chatbot_id = %chatbot_id, session_id = %session.id, "Session created");

    Ok(Json(SessionCreated {
        success: true,
        session_id: session.id,
        user_id: session.user_id,
        app_name: session.app_name,
        message: "Session created successfully",
    }))
}

/// Delete a session. Storage failures are logged, never reported.
pub async fn end_session(
    State(state): State<AppState>,
    Json(body): Json<EndSessionBody>,
) -> Result<Json<SessionEnded>> {
    let (Some(session_id), Some(user_id), Some(app_name)) = (
        required(body.session_id),
        required(body.user_id),
        required(body.app_name),
    ) else {
        return Err(ApiError::BadRequest("sessionId, userId, and appName are required"));
    };

    let key = SessionKey::new(app_name, user_id, session_id);
    if let Err(e) = state.runtime.sessions().delete_session(&key).await {
        warn!(session_id = %key.session_id, "Error ending session: {}", e);
        return Ok(Json(SessionEnded {
            success: true,
            message: "Session ended",
        }));
    }

    Ok(Json(SessionEnded {
        success: true,
        message: "Session ended successfully",
    }))
}

/// A visitor's sessions for one app, newest first, without events.
/// Dashboard only; the response includes visitor contact details.
pub async fn list_sessions(
    _auth: InternalAuth,
    State(state): State<AppState>,
    Path((app_name, user_id)): Path<(String, String)>,
) -> Result<Json<SessionList>> {
    let sessions = state
        .runtime
        .sessions()
        .list_sessions(&app_name, &user_id)
        .await
        .map_err(ApiError::internal("Failed to list sessions"))?;

    Ok(Json(SessionList {
        success: true,
        sessions,
    }))
}

/// One session with its (filtered) transcript. Dashboard only.
pub async fn get_session(
    _auth: InternalAuth,
    State(state): State<AppState>,
    Path((app_name, user_id, session_id)): Path<(String, String, String)>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<SessionDetail>> {
    let key = SessionKey::new(app_name, user_id, session_id);
    let options = GetSessionOptions {
        after_timestamp: query.after_timestamp,
        num_recent_events: query.num_recent_events,
    };

    let session = state
        .runtime
        .sessions()
        .get_session(&key, options)
        .await
        .map_err(ApiError::internal("Failed to fetch session"))?
        .ok_or(ApiError::NotFound("Session not found"))?;

    Ok(Json(SessionDetail {
        success: true,
        session,
    }))
}
