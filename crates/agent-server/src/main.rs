//! Agent server for embeddable chat widgets.
//!
//! Serves the widget session, chat and configuration API for every tenant
//! chatbot from one process, plus the dashboard's reload hook.

mod auth;
mod config;
mod error;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use agent_core::{ChatModel, EchoModel};
use agent_runtime::{AgentRuntime, RuntimeSettings};
use axum::middleware;
use database::Database;
use model_client::OpenAiChatModel;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::rate_limit::ClientRateLimiter;
use crate::state::AppState;

/// Model backend from the environment, or the echo model when no API key
/// is configured.
fn chat_model() -> Arc<dyn ChatModel> {
    match OpenAiChatModel::from_env() {
        Ok(model) => {
            info!(api_url = %model.config().api_url, "Using chat-completions backend");
            Arc::new(model)
        }
        Err(e) => {
            warn!("{}; falling back to echo model", e);
            Arc::new(EchoModel::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting agent server");
    if config.internal_token.is_none() {
        warn!("INTERNAL_API_TOKEN not set, reload endpoint disabled");
    }

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let settings = RuntimeSettings::from_env();
    let runtime = AgentRuntime::with_database(db, chat_model(), &settings);
    let state = AppState::new(runtime, config.internal_token.clone());

    let mut app = routes::router().nest_service("/widget", ServeDir::new(&config.widget_dir));
    match ClientRateLimiter::per_minute(config.rate_limit_per_minute) {
        Some(limiter) => {
            let limiter = Arc::new(limiter);
            limiter.spawn_pruner();
            app = app.layer(middleware::from_fn_with_state(limiter, rate_limit::limit_by_ip));
        }
        None => warn!("RATE_LIMIT_PER_MINUTE is 0, rate limiting disabled"),
    }
    let app = app.layer(CorsLayer::permissive()).with_state(state);

    info!(
        addr = %config.addr,
        widget_dir = %config.widget_dir.display(),
        rate_limit_per_minute = config.rate_limit_per_minute,
        "Agent server listening"
    );
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
