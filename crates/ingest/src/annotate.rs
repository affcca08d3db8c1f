//! Annotation pass: emotion scores and entity extraction via an LLM.
//!
//! Both analyses expect strict JSON back. A malformed reply degrades to
//! empty annotations; ingestion never fails on this pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use generation::{GenerationBackend, GenerationRequest};
use serde_json::Value;
use storage::MemoryAnnotations;
use tracing::{debug, instrument, warn};

const EMOTION_PROMPT: &str = "You are an emotion analysis expert. Analyze the emotional \
content of the given text and return a JSON object with emotion scores between 0 and 1 \
for: joy, sadness, anger, fear, surprise, disgust, trust, anticipation.";

const ENTITY_PROMPT: &str = "Extract people, locations, and topics from the text. Return \
a JSON object with three arrays: 'people' (names of people mentioned), 'locations' \
(places mentioned), and 'topics' (main themes or subjects discussed).";

const EMOTION_VOCABULARY: [&str; 8] = [
    "joy",
    "sadness",
    "anger",
    "fear",
    "surprise",
    "disgust",
    "trust",
    "anticipation",
];

/// Runs the two analysis calls against any generation backend.
#[derive(Clone)]
pub struct Annotator {
    backend: Arc<dyn GenerationBackend>,
}

impl Annotator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Annotates content. Each analysis that fails (call or parse) leaves
    /// its part of the result empty.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn annotate(&self, content: &str) -> MemoryAnnotations {
        let mut annotations = MemoryAnnotations::default();
        annotations.emotions = self.analyze_emotions(content).await;
        let (people, locations, topics) = self.extract_entities(content).await;
        annotations.people = people;
        annotations.locations = locations;
        annotations.topics = topics;
        annotations
    }

    async fn analyze_emotions(&self, content: &str) -> BTreeMap<String, f32> {
        let request =
            GenerationRequest::new(EMOTION_PROMPT, vec![], content).with_temperature(0.1);
        let reply = match self.backend.generate(&request).await {
            Ok(output) => output.text,
            Err(e) => {
                warn!(error = %e, "emotion analysis call failed");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str::<BTreeMap<String, f64>>(&reply) {
            Ok(scores) => scores
                .into_iter()
                .filter(|(k, _)| EMOTION_VOCABULARY.contains(&k.as_str()))
                .map(|(k, v)| (k, (v as f32).clamp(0.0, 1.0)))
                .collect(),
            Err(e) => {
                warn!(error = %e, "emotion analysis reply was not valid JSON");
                BTreeMap::new()
            }
        }
    }

    async fn extract_entities(&self, content: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
        let request = GenerationRequest::new(ENTITY_PROMPT, vec![], content).with_temperature(0.1);
        let reply = match self.backend.generate(&request).await {
            Ok(output) => output.text,
            Err(e) => {
                warn!(error = %e, "entity extraction call failed");
                return (vec![], vec![], vec![]);
            }
        };

        match serde_json::from_str::<Value>(&reply) {
            Ok(value) => {
                debug!("entity extraction reply parsed");
                (
                    string_list(&value, "people"),
                    string_list(&value, "locations"),
                    string_list(&value, "topics"),
                )
            }
            Err(e) => {
                warn!(error = %e, "entity extraction reply was not valid JSON");
                (vec![], vec![], vec![])
            }
        }
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
