//! Storage crate: relational persistence and repository abstractions.
//!
//! The core pipeline only needs create/read/update/delete by id and simple
//! equality/ordering filters, so everything here is plain sqlx over SQLite.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – MemoryRecord, ReplicaRecord, ConversationRecord, MessageRecord
//! - [`memory_repo`] – MemoryRepository
//! - [`replica_repo`] – ReplicaRepository
//! - [`conversation_repo`] – ConversationRepository (conversations + messages)
//! - [`sqlite_pool`] – SqlitePoolManager

mod conversation_repo;
mod error;
mod memory_repo;
mod models;
mod replica_repo;
mod sqlite_pool;

pub use conversation_repo::ConversationRepository;
pub use error::StorageError;
pub use memory_repo::MemoryRepository;
pub use models::{
    ContentKind, ConversationKind, ConversationRecord, MemoryAnnotations, MemoryRecord,
    MessageRecord, MessageRole, ReplicaRecord, ReplicaStatus, TrainingStatus,
};
pub use replica_repo::ReplicaRepository;
pub use sqlite_pool::SqlitePoolManager;
