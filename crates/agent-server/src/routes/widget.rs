//! Public widget configuration.

use agent_runtime::ResolvedWidgetConfig;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::state::AppState;

const FAILED: &str = "Failed to fetch widget configuration";

/// Appearance settings the embedded widget needs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAppearance {
    pub title: String,
    pub subtitle: Option<String>,
    pub welcome_message: String,
    pub placeholder: String,
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub border_radius: i64,
    pub position: String,
    pub auto_open: bool,
    pub auto_open_delay: i64,
    pub show_branding: bool,
}

impl From<&ResolvedWidgetConfig> for WidgetAppearance {
    fn from(config: &ResolvedWidgetConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            welcome_message: config.welcome_message.clone(),
            placeholder: config.placeholder.clone(),
            primary_color: config.primary_color.clone(),
            background_color: config.background_color.clone(),
            text_color: config.text_color.clone(),
            border_radius: config.border_radius,
            position: config.position.clone(),
            auto_open: config.auto_open,
            auto_open_delay: config.auto_open_delay,
            show_branding: config.show_branding,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WidgetConfigReply {
    pub success: bool,
    pub config: WidgetAppearance,
}

/// Widget settings for an active chatbot, falling back to defaults when
/// none were saved.
pub async fn widget_config(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
) -> Result<Json<WidgetConfigReply>> {
    let loader = state.runtime.loader();
    let chatbot = loader
        .load_chatbot_config(&chatbot_id)
        .await
        .map_err(ApiError::internal(FAILED))?
        .ok_or(ApiError::NotFound("Chatbot not found"))?;
    if !chatbot.is_active {
        return Err(ApiError::Forbidden("Chatbot is not active"));
    }

    let config = match loader
        .load_widget_config(&chatbot_id)
        .await
        .map_err(ApiError::internal(FAILED))?
    {
        Some(widget) => WidgetAppearance::from(widget.as_ref()),
        None => WidgetAppearance::from(&ResolvedWidgetConfig::fallback(&chatbot.id, &chatbot.name)),
    };

    Ok(Json(WidgetConfigReply {
        success: true,
        config,
    }))
}
