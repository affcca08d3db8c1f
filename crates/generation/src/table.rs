//! Provider capability table: availability and fixed fallback priority.

use crate::{EnvGenerationConfig, ProviderId};

/// One provider's standing: fixed priority (lower tries first) and whether
/// a key was configured for it.
#[derive(Debug, Clone, Copy)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub priority: u8,
    pub available: bool,
}

/// Explicit value computed once from config. Immutable afterwards; chat
/// flows hand it to the router instead of consulting global state.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    entries: Vec<ProviderEntry>,
}

fn priority(id: ProviderId) -> u8 {
    match id {
        ProviderId::OpenAi => 1,
        ProviderId::Gemini => 2,
        ProviderId::Groq => 3,
        ProviderId::Ollama => 4,
        ProviderId::HuggingFace => 5,
    }
}

impl ProviderTable {
    pub fn from_config(config: &EnvGenerationConfig) -> Self {
        let available = |id: ProviderId| match id {
            ProviderId::OpenAi => config.openai_api_key.is_some(),
            ProviderId::Gemini => config.gemini_api_key.is_some(),
            ProviderId::Groq => config.groq_api_key.is_some(),
            // Local daemon, no key. Reachability is only known by trying.
            ProviderId::Ollama => true,
            ProviderId::HuggingFace => config.huggingface_api_key.is_some(),
        };
        let mut entries: Vec<ProviderEntry> = ProviderId::ALL
            .iter()
            .map(|&id| ProviderEntry {
                id,
                priority: priority(id),
                available: available(id),
            })
            .collect();
        entries.sort_by_key(|e| e.priority);
        Self { entries }
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn is_available(&self, id: ProviderId) -> bool {
        self.entries
            .iter()
            .any(|e| e.id == id && (e.available || e.id == ProviderId::Ollama))
    }

    /// Ordered attempt list for a request: the preferred provider first,
    /// then the rest by priority, with unavailable providers dropped
    /// (Ollama is always kept and probed).
    pub fn chain_from(&self, preferred: ProviderId) -> Vec<ProviderId> {
        let mut chain = Vec::with_capacity(self.entries.len());
        if self.is_available(preferred) {
            chain.push(preferred);
        }
        for entry in &self.entries {
            if entry.id == preferred {
                continue;
            }
            if entry.available || entry.id == ProviderId::Ollama {
                chain.push(entry.id);
            }
        }
        chain
    }
}
