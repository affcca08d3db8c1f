//! Ordered fallback routing across generation backends.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId,
    ProviderTable,
};

/// A successful routed generation, tagged with what was asked for and what
/// actually answered.
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub output: GenerationOutput,
    /// Provider that produced the response.
    pub provider: ProviderId,
    /// Provider the caller asked for.
    pub requested: ProviderId,
    pub fallback_used: bool,
}

/// Tries backends in the order the [`ProviderTable`] dictates until one
/// succeeds. Every failure is logged and the next provider tried; only
/// full exhaustion is an error.
pub struct FallbackRouter {
    backends: HashMap<ProviderId, Arc<dyn GenerationBackend>>,
    table: ProviderTable,
}

impl FallbackRouter {
    pub fn new(table: ProviderTable) -> Self {
        Self {
            backends: HashMap::new(),
            table,
        }
    }

    pub fn register(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backends.insert(backend.id(), backend);
        self
    }

    pub fn table(&self) -> &ProviderTable {
        &self.table
    }

    #[instrument(skip(self, request), fields(preferred = %preferred))]
    pub async fn generate(
        &self,
        preferred: ProviderId,
        request: &GenerationRequest,
    ) -> Result<RoutedResponse, GenerationError> {
        let chain = self.table.chain_from(preferred);
        let mut last_error = format!("no providers available for {preferred}");

        for provider in chain {
            let Some(backend) = self.backends.get(&provider) else {
                warn!(%provider, "no backend registered, skipping");
                continue;
            };
            match backend.generate(request).await {
                Ok(output) => {
                    let fallback_used = provider != preferred;
                    if fallback_used {
                        info!(%provider, requested = %preferred, "fell back to another provider");
                    }
                    return Ok(RoutedResponse {
                        output,
                        provider,
                        requested: preferred,
                        fallback_used,
                    });
                }
                Err(e) => {
                    warn!(%provider, error = %e, "provider failed, trying next");
                    last_error = e.to_string();
                }
            }
        }

        Err(GenerationError::Exhausted { last: last_error })
    }
}
