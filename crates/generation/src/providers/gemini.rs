//! Google Gemini backend. The API takes one flattened text blob, so the
//! system prompt and the last four turns are folded into a single prompt.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::{GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId};

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
const MAX_OUTPUT_TOKENS: u32 = 600;
const HISTORY_TURNS: usize = 4;

#[derive(Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

impl GeminiBackend {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    #[instrument(skip(self, request))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(ProviderId::Gemini));
        }
        let upstream = |message: String| GenerationError::Upstream {
            provider: ProviderId::Gemini,
            message,
        };

        let full_prompt = super::flatten_prompt(
            &request.system_prompt,
            &request.history,
            &request.user_message,
            HISTORY_TURNS,
        );
        let payload = json!({
            "contents": [{ "parts": [{ "text": full_prompt }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        info!("step: gemini request");

        let response = self
            .client
            .post(format!("{GEMINI_URL}?key={}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(ProviderId::Gemini)
                } else {
                    upstream(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(body = %body, "gemini request failed");
            return Err(upstream(body));
        }

        let data: GeminiResponse = response.json().await.map_err(|e| upstream(e.to_string()))?;
        let text = data
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| upstream("no candidate in response".to_string()))?;

        info!("step: gemini done");
        Ok(GenerationOutput {
            text,
            tokens_used: None,
        })
    }
}
