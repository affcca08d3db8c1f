//! Provider backends. One module per provider; shared prompt flattening
//! for the APIs that take a single text blob instead of a message list.

use prompt::{ChatMessage, MessageRole};

mod gemini;
mod groq;
mod huggingface;
mod ollama;
mod openai;

pub use gemini::GeminiBackend;
pub use groq::GroqBackend;
pub use huggingface::HuggingFaceBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Flattens a chat into a single prompt: system text, an optional
/// "Conversation History" block from the last `max_turns` messages, then
/// the current question with an "Assistant:" cue.
pub(crate) fn flatten_prompt(
    system_prompt: &str,
    history: &[ChatMessage],
    user_message: &str,
    max_turns: usize,
) -> String {
    let recent = tail(history, max_turns);
    if recent.is_empty() {
        return format!("{system_prompt}\n\nUser: {user_message}\nAssistant:");
    }
    let context = recent
        .iter()
        .map(|m| format!("{}: {}", role_label(m.role), m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{system_prompt}\n\nConversation History:\n{context}\n\nUser: {user_message}\nAssistant:")
}

/// Last `n` messages of the history, preserving order.
pub(crate) fn tail(history: &[ChatMessage], n: usize) -> &[ChatMessage] {
    let start = history.len().saturating_sub(n);
    &history[start..]
}

fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}
