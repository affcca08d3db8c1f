//! Generation configuration loaded from environment variables.

use std::env;

/// Per-provider keys and endpoints. Absent keys leave the provider
/// unavailable rather than failing load; Ollama needs no key.
#[derive(Debug, Clone)]
pub struct EnvGenerationConfig {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub huggingface_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_model: String,
    pub ollama_base_url: String,
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

impl EnvGenerationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            groq_api_key: non_empty("GROQ_API_KEY"),
            huggingface_api_key: non_empty("HUGGINGFACE_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}

impl Default for EnvGenerationConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            groq_api_key: None,
            huggingface_api_key: None,
            openai_model: "gpt-4".to_string(),
            ollama_model: "llama3".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }
}
