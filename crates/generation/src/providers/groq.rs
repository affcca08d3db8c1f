//! Groq backend. OpenAI-shaped chat completion payload against Groq's
//! endpoint with a small fast model.

use async_trait::async_trait;
use prompt::ChatMessage;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId};

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const GROQ_MODEL: &str = "llama3-8b-8192";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_TOKENS: u32 = 600;
const HISTORY_TURNS: usize = 6;

#[derive(Clone)]
pub struct GroqBackend {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl GroqBackend {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }
}

fn to_wire(msg: &ChatMessage) -> serde_json::Value {
    json!({ "role": msg.role.as_str(), "content": msg.content })
}

#[async_trait]
impl GenerationBackend for GroqBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Groq
    }

    #[instrument(skip(self, request))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(ProviderId::Groq));
        }
        let upstream = |message: String| GenerationError::Upstream {
            provider: ProviderId::Groq,
            message,
        };

        let mut messages = vec![to_wire(&ChatMessage::system(request.system_prompt.clone()))];
        messages.extend(super::tail(&request.history, HISTORY_TURNS).iter().map(to_wire));
        messages.push(to_wire(&ChatMessage::user(request.user_message.clone())));

        let payload = json!({
            "model": GROQ_MODEL,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": MAX_TOKENS,
        });

        info!(model = GROQ_MODEL, "step: groq request");

        let response = self
            .client
            .post(GROQ_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(ProviderId::Groq)
                } else {
                    upstream(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "groq request failed");
            return Err(upstream(body));
        }

        let data: GroqResponse = response.json().await.map_err(|e| upstream(e.to_string()))?;
        let text = data
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| upstream("no completion choice in response".to_string()))?;
        let tokens_used = data.usage.map(|u| u.total_tokens);

        info!(tokens = ?tokens_used, "step: groq done");
        Ok(GenerationOutput { text, tokens_used })
    }
}
