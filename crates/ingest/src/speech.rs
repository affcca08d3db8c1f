//! Speech-to-text for voice memories.

use async_openai::types::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{info, instrument, warn};

const TRANSCRIBE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Transcribes a voice recording to text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String, anyhow::Error>;
}

/// Whisper transcription over the OpenAI audio API.
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: "whisper-1".to_string(),
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    #[instrument(skip(self, audio), fields(filename = %filename, size = audio.len()))]
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<String, anyhow::Error> {
        info!(model = %self.model, "step: transcription request");

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                filename.to_string(),
                audio.to_vec(),
            ))
            .model(self.model.clone())
            .build()?;

        let audio_api = self.client.audio();
        let transcribe_future = audio_api.transcribe(request);
        let response = match tokio::time::timeout(TRANSCRIBE_TIMEOUT, transcribe_future).await {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!(error = %e, "transcription failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_secs = TRANSCRIBE_TIMEOUT.as_secs(),
                    "transcription timed out"
                );
                return Err(anyhow::anyhow!(
                    "transcription timed out after {} seconds",
                    TRANSCRIBE_TIMEOUT.as_secs()
                ));
            }
        };

        info!(text_len = response.text.len(), "step: transcription done");
        Ok(response.text)
    }
}
