//! # Recall
//!
//! Semantic retrieval over a user's memory namespace and the context
//! blocks that ground chat personas, plus replica training (building a
//! replica's derived namespace from the user's memories).
//!
//! An empty context is a valid outcome, not an error: when nothing clears
//! the similarity bar the block carries a sentinel line instead. A failed
//! embedding or index call during context assembly degrades the same way,
//! so an outage never fails the chat turn that asked for context.

mod retriever;
mod trainer;

pub use retriever::{ContextBlock, MemoryRetriever, RetrievedMemory};
pub use trainer::{ReplicaTrainer, TrainingOutcome};

/// Minimum similarity for a memory to enter self-chat context.
pub const CONTEXT_THRESHOLD: f32 = 0.7;
/// Minimum similarity for replica-scoped context (looser: the name term
/// dilutes the query).
pub const REPLICA_CONTEXT_THRESHOLD: f32 = 0.6;
/// Minimum similarity for a memory to count as involving a replica
/// during training.
pub const TRAINING_THRESHOLD: f32 = 0.3;
