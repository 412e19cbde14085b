//! SQLite persistence layer for the agent chat platform.
//!
//! This crate provides async database operations for tenants, chatbots,
//! widget appearance, knowledge sources and conversation sessions using SQLx
//! with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{chatbot, tenant, Database, NewChatbot, NewTenant};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:agent_chat.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     tenant::create_tenant(db.pool(), &NewTenant::new("t-1", "Acme", "acme")).await?;
//!     chatbot::create_chatbot(db.pool(), &NewChatbot::new("bot-1", "t-1", "Support")).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod chatbot;
pub mod error;
pub mod event;
pub mod knowledge_source;
pub mod models;
pub mod session;
pub mod tenant;
pub mod validation;
pub mod widget_config;

pub use error::{DatabaseError, Result};
pub use models::{
    Chatbot, ChatbotUpdate, EventRecord, KnowledgeKind, KnowledgeSource, NewChatbot,
    NewKnowledgeSource, NewSessionRecord, NewTenant, ProcessingStatus, SessionRecord, Tenant,
    WidgetConfig, WidgetConfigInput,
};
pub use validation::ValidationError;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent chat turns and session reads.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/agent_chat.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory URLs are pinned to a single connection that is never
    /// recycled: every SQLite connection opens its own private memory
    /// database, so a larger pool would hand out empty schemas.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { pool_size })
            .acquire_timeout(Duration::from_secs(30));
        if in_memory {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            if in_memory { 1 } else { pool_size }
        );

        Ok(Self { pool })
    }

    /// Open a fresh, migrated in-memory database.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect("sqlite::memory:").await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
