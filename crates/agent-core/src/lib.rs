//! Core traits and types for agent-backed chat sessions.
//!
//! This crate provides the shared interface between configuration, storage
//! and model backends. It defines:
//!
//! - [`AgentDefinition`] - An immutable, ready-to-run agent
//! - [`Session`] / [`Event`] - The conversation model and its transcript
//! - [`SessionService`] - The trait all session stores implement
//! - [`ChatModel`] - The trait all model backends implement
//! - [`Runner`] - Drives one agent through turns against a session store
//! - [`sanitize_knowledge`] / [`build_instruction`] - Instruction assembly
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use agent_core::{
//!     collect_text, AgentDefinition, CreateSessionRequest, EchoModel, GenerationConfig,
//!     InMemorySessionService, Runner, SessionService,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> agent_core::Result<()> {
//!     let sessions = Arc::new(InMemorySessionService::new());
//!     let session = sessions
//!         .create_session(CreateSessionRequest::new("demo", "visitor-1"))
//!         .await?;
//!
//!     let agent = Arc::new(AgentDefinition::new(
//!         "bot-1",
//!         "echo",
//!         "Echo assistant",
//!         "Repeat everything.",
//!         GenerationConfig::default(),
//!     ));
//!     let runner = Runner::new("demo", agent, sessions, Arc::new(EchoModel::new()));
//!
//!     let events = runner.run("visitor-1", &session.id, "Hello!").await?;
//!     assert_eq!(collect_text(&events), "Hello!");
//!     Ok(())
//! }
//! ```

mod agent;
mod echo;
mod error;
mod event;
mod memory;
mod model;
mod prompt;
mod runner;
mod sanitize;
mod session;

pub use agent::{normalize_identifier, AgentDefinition, GenerationConfig};
pub use echo::EchoModel;
pub use error::{AgentError, Result};
pub use event::{now_millis, Content, Event, EventActions, Part, UsageMetadata};
pub use memory::InMemorySessionService;
pub use model::{ChatModel, ModelMessage, ModelRequest, ModelResponse, Role};
pub use prompt::{
    build_instruction, format_knowledge_block, Fingerprint, KnowledgeEntry,
    BASE_INSTRUCTIONS,
};
pub use runner::{collect_text, Runner};
pub use sanitize::{sanitize_knowledge, REDACTION_MARKER};
pub use session::{
    apply_event, ensure_event_identity, generate_session_id, CreateSessionRequest,
    GetSessionOptions, Session, SessionKey, SessionMetadata, SessionService,
};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
