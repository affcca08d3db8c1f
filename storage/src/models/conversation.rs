//! Conversation and message record models.
//!
//! A conversation is a dialogue thread scoped to a user, optionally to a
//! replica. Messages are immutable once created and ordered by creation
//! time within their conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type discriminator for a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationKind {
    /// Chat with the user's own past self.
    SelfReflection,
    /// Chat with a replica persona.
    Replica,
    /// Chat with a named companion service.
    Service,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::SelfReflection => "self",
            ConversationKind::Replica => "replica",
            ConversationKind::Service => "service",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "replica" => ConversationKind::Replica,
            "service" => ConversationKind::Service,
            _ => ConversationKind::SelfReflection,
        }
    }
}

/// Role of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            "system" => MessageRole::System,
            _ => MessageRole::User,
        }
    }
}

/// A dialogue thread. Created lazily on the first message of a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    /// Present only for replica conversations.
    pub replica_id: Option<String>,
    pub title: String,
    pub kind: ConversationKind,
    pub started_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ConversationRecord {
    /// Creates a new conversation with a generated UUID.
    pub fn new(
        user_id: impl Into<String>,
        kind: ConversationKind,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            replica_id: None,
            title: title.into(),
            kind,
            started_at: Utc::now(),
            last_message_at: None,
        }
    }

    pub fn with_replica(mut self, replica_id: impl Into<String>) -> Self {
        self.replica_id = Some(replica_id.into());
        self
    }
}

/// One turn in a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub content: String,
    pub role: MessageRole,
    pub tokens_used: Option<i64>,
    /// Model/provider identifier that produced an assistant turn.
    pub model_used: Option<String>,
    pub confidence: Option<f64>,
    /// Ids of the memories used as grounding for this turn.
    pub relevant_memory_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Creates a new message with a generated UUID and current timestamp.
    pub fn new(
        conversation_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            content: content.into(),
            role,
            tokens_used: None,
            model_used: None,
            confidence: None,
            relevant_memory_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_generation_meta(
        mut self,
        tokens_used: Option<i64>,
        model_used: Option<String>,
    ) -> Self {
        self.tokens_used = tokens_used;
        self.model_used = model_used;
        self
    }

    pub fn with_relevant_memories(mut self, ids: Vec<String>) -> Self {
        self.relevant_memory_ids = ids;
        self
    }
}
