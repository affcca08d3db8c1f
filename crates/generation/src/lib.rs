//! # Generation
//!
//! Text generation behind a single [`GenerationBackend`] trait, with one
//! implementation per provider and an ordered fallback router on top.
//!
//! ## Providers
//!
//! - **OpenAI** – chat completions via `async-openai`
//! - **Gemini** – raw HTTP, flattened prompt
//! - **Groq** – raw HTTP, OpenAI-shaped messages
//! - **Ollama** – local daemon, flattened prompt
//! - **Hugging Face** – bare inference API
//!
//! ## External interactions
//!
//! - **LLM APIs**: every backend performs one network call per `generate`.

use async_trait::async_trait;
use prompt::ChatMessage;

mod config;
pub mod providers;
mod router;
mod table;

pub use config::EnvGenerationConfig;
pub use router::{FallbackRouter, RoutedResponse};
pub use table::{ProviderEntry, ProviderTable};

/// Stable identifier for a generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
    Gemini,
    Groq,
    Ollama,
    HuggingFace,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::Groq => "groq",
            ProviderId::Ollama => "ollama",
            ProviderId::HuggingFace => "huggingface",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "OpenAI",
            ProviderId::Gemini => "Google Gemini",
            ProviderId::Groq => "Groq (Llama 3)",
            ProviderId::Ollama => "Ollama (Local)",
            ProviderId::HuggingFace => "Hugging Face",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(ProviderId::OpenAi),
            "gemini" => Some(ProviderId::Gemini),
            "groq" => Some(ProviderId::Groq),
            "ollama" => Some(ProviderId::Ollama),
            "huggingface" => Some(ProviderId::HuggingFace),
            _ => None,
        }
    }

    pub const ALL: [ProviderId; 5] = [
        ProviderId::OpenAi,
        ProviderId::Gemini,
        ProviderId::Groq,
        ProviderId::Ollama,
        ProviderId::HuggingFace,
    ];
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by generation backends and the router.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0} API key not configured")]
    NotConfigured(ProviderId),
    #[error("{provider} API error: {message}")]
    Upstream { provider: ProviderId, message: String },
    #[error("{0} request timed out")]
    Timeout(ProviderId),
    #[error("All AI providers failed. Last error: {last}")]
    Exhausted { last: String },
}

/// One generation request: the persona system prompt, the prior turns in
/// oldest-first order, and the current user message. Backends trim the
/// history to whatever window their API handles well.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        history: Vec<ChatMessage>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
            user_message: user_message.into(),
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Result of a single successful generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub text: String,
    /// Total tokens reported by the provider, when it reports any.
    pub tokens_used: Option<u32>,
}

/// A single text-generation provider.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn id(&self) -> ProviderId;

    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationOutput, GenerationError>;
}
