//! Fallback router tests with scripted in-process backends.
//!
//! External interactions: none (no network; every backend is a fake).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use generation::{
    EnvGenerationConfig, FallbackRouter, GenerationBackend, GenerationError, GenerationOutput,
    GenerationRequest, ProviderId, ProviderTable,
};

/// Backend that always succeeds or always fails, counting its calls.
struct ScriptedBackend {
    id: ProviderId,
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn ok(id: ProviderId, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(GenerationOutput {
                text: text.clone(),
                tokens_used: Some(7),
            }),
            None => Err(GenerationError::Upstream {
                provider: self.id,
                message: format!("{} is down", self.id),
            }),
        }
    }
}

fn all_available() -> ProviderTable {
    ProviderTable::from_config(&EnvGenerationConfig {
        openai_api_key: Some("k".into()),
        gemini_api_key: Some("k".into()),
        groq_api_key: Some("k".into()),
        huggingface_api_key: Some("k".into()),
        ..EnvGenerationConfig::default()
    })
}

fn request() -> GenerationRequest {
    GenerationRequest::new("system", vec![], "hello")
}

/// **Setup**: all providers available, the preferred one healthy.
/// **Action**: route to openai.
/// **Expected**: openai answers, no fallback tag, nothing else called.
#[tokio::test]
async fn test_preferred_provider_answers_without_fallback() {
    let openai = ScriptedBackend::ok(ProviderId::OpenAi, "from openai");
    let gemini = ScriptedBackend::ok(ProviderId::Gemini, "from gemini");
    let router = FallbackRouter::new(all_available())
        .register(openai.clone())
        .register(gemini.clone());

    let routed = router.generate(ProviderId::OpenAi, &request()).await.unwrap();
    assert_eq!(routed.output.text, "from openai");
    assert_eq!(routed.provider, ProviderId::OpenAi);
    assert_eq!(routed.requested, ProviderId::OpenAi);
    assert!(!routed.fallback_used);
    assert_eq!(gemini.calls(), 0);
}

/// **Setup**: preferred provider fails, the next one by priority works.
/// **Action**: route to openai.
/// **Expected**: gemini answers; outcome tagged fallback_used with the
/// original request preserved.
#[tokio::test]
async fn test_failure_falls_through_in_priority_order() {
    let openai = ScriptedBackend::failing(ProviderId::OpenAi);
    let gemini = ScriptedBackend::ok(ProviderId::Gemini, "from gemini");
    let router = FallbackRouter::new(all_available())
        .register(openai.clone())
        .register(gemini.clone());

    let routed = router.generate(ProviderId::OpenAi, &request()).await.unwrap();
    assert_eq!(routed.output.text, "from gemini");
    assert_eq!(routed.provider, ProviderId::Gemini);
    assert_eq!(routed.requested, ProviderId::OpenAi);
    assert!(routed.fallback_used);
    assert_eq!(openai.calls(), 1);
}

/// **Setup**: preferred provider has no key; next one fails; third works.
/// **Action**: route to openai (unavailable).
/// **Expected**: openai is never attempted, gemini fails, groq answers with
/// the fallback tag naming openai as requested.
#[tokio::test]
async fn test_unavailable_preferred_is_skipped_not_attempted() {
    let table = ProviderTable::from_config(&EnvGenerationConfig {
        gemini_api_key: Some("k".into()),
        groq_api_key: Some("k".into()),
        ..EnvGenerationConfig::default()
    });
    let openai = ScriptedBackend::ok(ProviderId::OpenAi, "never");
    let gemini = ScriptedBackend::failing(ProviderId::Gemini);
    let groq = ScriptedBackend::ok(ProviderId::Groq, "from groq");
    let router = FallbackRouter::new(table)
        .register(openai.clone())
        .register(gemini.clone())
        .register(groq.clone());

    let routed = router.generate(ProviderId::OpenAi, &request()).await.unwrap();
    assert_eq!(routed.provider, ProviderId::Groq);
    assert_eq!(routed.requested, ProviderId::OpenAi);
    assert!(routed.fallback_used);
    assert_eq!(openai.calls(), 0);
    assert_eq!(gemini.calls(), 1);
}

/// **Setup**: ollama has no key but a registered backend; nothing else
/// configured.
/// **Action**: route to gemini.
/// **Expected**: ollama is still attempted and answers.
#[tokio::test]
async fn test_ollama_attempted_without_key() {
    let table = ProviderTable::from_config(&EnvGenerationConfig::default());
    let ollama = ScriptedBackend::ok(ProviderId::Ollama, "from ollama");
    let router = FallbackRouter::new(table).register(ollama.clone());

    let routed = router.generate(ProviderId::Gemini, &request()).await.unwrap();
    assert_eq!(routed.provider, ProviderId::Ollama);
    assert!(routed.fallback_used);
    assert_eq!(ollama.calls(), 1);
}

/// **Setup**: every available provider fails.
/// **Action**: route to openai.
/// **Expected**: a single Exhausted error carrying the last underlying
/// provider error.
#[tokio::test]
async fn test_exhaustion_reports_last_error() {
    let table = ProviderTable::from_config(&EnvGenerationConfig {
        openai_api_key: Some("k".into()),
        gemini_api_key: Some("k".into()),
        ..EnvGenerationConfig::default()
    });
    let openai = ScriptedBackend::failing(ProviderId::OpenAi);
    let gemini = ScriptedBackend::failing(ProviderId::Gemini);
    let ollama = ScriptedBackend::failing(ProviderId::Ollama);
    let router = FallbackRouter::new(table)
        .register(openai.clone())
        .register(gemini.clone())
        .register(ollama.clone());

    let err = router
        .generate(ProviderId::OpenAi, &request())
        .await
        .unwrap_err();
    match err {
        GenerationError::Exhausted { last } => {
            assert!(last.contains("ollama is down"), "last error was: {last}");
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
    assert_eq!(openai.calls(), 1);
    assert_eq!(gemini.calls(), 1);
    assert_eq!(ollama.calls(), 1);
}
