//! OpenAI-compatible chat-completions backend.
//!
//! This crate provides a [`ChatModel`](agent_core::ChatModel) that talks to
//! any endpoint implementing the `/chat/completions` protocol. The default
//! endpoint is Gemini's OpenAI-compatible surface.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use agent_core::ChatModel;
//! use model_client::OpenAiChatModel;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::from_env()?);
//!     println!("Using {}", model.name());
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiChatModel;
pub use config::{ModelClientConfig, ModelClientConfigBuilder, DEFAULT_API_URL};
