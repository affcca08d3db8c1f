//! Record models for persistence.

mod conversation;
mod memory_record;
mod replica_record;

pub use conversation::{ConversationKind, ConversationRecord, MessageRecord, MessageRole};
pub use memory_record::{ContentKind, MemoryAnnotations, MemoryRecord};
pub use replica_record::{ReplicaRecord, ReplicaStatus, TrainingStatus};
