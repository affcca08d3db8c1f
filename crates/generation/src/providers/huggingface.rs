//! Hugging Face inference backend. Bare text-in/text-out: the hosted
//! conversational models take no system prompt or history, only the
//! current message. Kept as the last resort in the fallback order.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId};

const HF_URL: &str = "https://api-inference.huggingface.co/models/microsoft/DialoGPT-large";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_NEW_TOKENS: u32 = 600;

#[derive(Clone)]
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    api_key: String,
}

impl HuggingFaceBackend {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }
}

#[async_trait]
impl GenerationBackend for HuggingFaceBackend {
    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    #[instrument(skip(self, request))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(ProviderId::HuggingFace));
        }
        let upstream = |message: String| GenerationError::Upstream {
            provider: ProviderId::HuggingFace,
            message,
        };

        let payload = json!({
            "inputs": request.user_message,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "temperature": request.temperature,
            }
        });

        info!("step: huggingface request");

        let response = self
            .client
            .post(HF_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(ProviderId::HuggingFace)
                } else {
                    upstream(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "huggingface request failed");
            return Err(upstream(body));
        }

        // The endpoint returns either an array of generations or one object.
        let data: Value = response.json().await.map_err(|e| upstream(e.to_string()))?;
        let text = data
            .get(0)
            .and_then(|v| v.get("generated_text"))
            .or_else(|| data.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| upstream("no generated_text in response".to_string()))?;

        info!("step: huggingface done");
        Ok(GenerationOutput {
            text,
            tokens_used: None,
        })
    }
}
