//! # Prompt
//!
//! Builds system prompts for the three conversation personas and the chat
//! message types shared by every generation backend.
//!
//! ## Personas
//!
//! - **Past self**: first-person reflection grounded in the user's memories
//! - **Replica**: a named person with personality, speaking style, and status
//! - **Companion service**: a fixed catalog of specialized assistants
//!
//! ## External interactions
//!
//! - **AI models**: Output is sent as the system message to LLM APIs.

mod persona;
mod service;

pub use persona::{replica_prompt, self_reflection_prompt, ReplicaPersona, ReplicaLifecycle};
pub use service::{service_prompt, CompanionService, COMPANION_SERVICES};

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
