use async_trait::async_trait;
use thiserror::Error;

use leadflow_core::domain::field::FieldConfig;
use leadflow_core::domain::lead::Lead;
use leadflow_core::domain::state::{ConversationState, RestoredState};

pub mod conversation;
pub mod field_config;
pub mod lead;
pub mod memory;

pub use conversation::SqlConversationRepository;
pub use field_config::SqlFieldConfigRepository;
pub use lead::SqlLeadRepository;
pub use memory::{
    InMemoryConversationRepository, InMemoryFieldConfigRepository, InMemoryLeadRepository,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Session store for per-thread dialogue state.
///
/// Loads never fail on malformed content: unreadable entries come back reset
/// and listed in [`RestoredState::repaired_keys`].
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_thread(&self, thread_id: &str)
        -> Result<Option<RestoredState>, RepositoryError>;
    async fn save(&self, state: ConversationState) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait FieldConfigRepository: Send + Sync {
    /// Active configs ordered by `sort_order`.
    async fn list_active(&self) -> Result<Vec<FieldConfig>, RepositoryError>;
    async fn save(&self, config: FieldConfig) -> Result<(), RepositoryError>;
}

/// Captured leads. A thread's first saved lead is kept; later saves are ignored.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn find_by_thread(&self, thread_id: &str) -> Result<Option<Lead>, RepositoryError>;
    async fn save(&self, lead: Lead) -> Result<(), RepositoryError>;
}
