//! Ollama backend against a local daemon. No API key; a connection refusal
//! just means the daemon is not running and the router moves on.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId};

/// Local models are slower than hosted APIs.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
const NUM_PREDICT: u32 = 600;
const HISTORY_TURNS: usize = 4;

#[derive(Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Ollama
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let upstream = |message: String| GenerationError::Upstream {
            provider: ProviderId::Ollama,
            message,
        };

        let full_prompt = super::flatten_prompt(
            &request.system_prompt,
            &request.history,
            &request.user_message,
            HISTORY_TURNS,
        );
        let payload = json!({
            "model": self.model,
            "prompt": full_prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": NUM_PREDICT,
            }
        });

        info!(model = %self.model, "step: ollama request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(ProviderId::Ollama)
                } else if e.is_connect() {
                    upstream("Ollama not running. Start with: ollama serve".to_string())
                } else {
                    upstream(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "ollama request failed");
            return Err(upstream(body));
        }

        let data: OllamaResponse = response.json().await.map_err(|e| upstream(e.to_string()))?;

        info!("step: ollama done");
        Ok(GenerationOutput {
            text: data.response,
            tokens_used: None,
        })
    }
}
