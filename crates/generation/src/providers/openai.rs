//! OpenAI chat completions backend over `async-openai`.

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};
use tracing::{info, instrument, warn};

use crate::{GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_TOKENS: u32 = 500;

/// OpenAI backend. Holds the async-openai client and chat model name.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    pub fn with_api_key(api_key: String) -> Self {
        Self::new(api_key, "gpt-4".to_string())
    }
}

fn to_openai_message(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, GenerationError> {
    let map_err = |e: async_openai::error::OpenAIError| GenerationError::Upstream {
        provider: ProviderId::OpenAi,
        message: e.to_string(),
    };
    let content = msg.content.clone();
    Ok(match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_err)?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_err)?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(map_err)?
            .into(),
    })
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let upstream = |message: String| GenerationError::Upstream {
            provider: ProviderId::OpenAi,
            message,
        };

        let mut messages = vec![to_openai_message(&ChatMessage::system(
            request.system_prompt.clone(),
        ))?];
        for msg in super::tail(&request.history, 6) {
            messages.push(to_openai_message(msg)?);
        }
        messages.push(to_openai_message(&ChatMessage::user(
            request.user_message.clone(),
        ))?);

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .max_tokens(MAX_TOKENS)
            .temperature(request.temperature)
            .build()
            .map_err(|e| upstream(e.to_string()))?;

        info!(model = %self.model, "step: chat completion request");

        let chat = self.client.chat();
        let create_future = chat.create(api_request);
        let response = match tokio::time::timeout(REQUEST_TIMEOUT, create_future).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "chat completion failed");
                return Err(upstream(e.to_string()));
            }
            Err(_) => {
                warn!(timeout_secs = REQUEST_TIMEOUT.as_secs(), "chat completion timed out");
                return Err(GenerationError::Timeout(ProviderId::OpenAi));
            }
        };

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| upstream("no completion choice in response".to_string()))?;
        let tokens_used = response.usage.map(|u| u.total_tokens);

        info!(tokens = ?tokens_used, "step: chat completion done");
        Ok(GenerationOutput { text, tokens_used })
    }
}
