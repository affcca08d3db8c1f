//! # Echo Chat
//!
//! Conversational orchestrator over memories: past-self reflection,
//! replica personas, and companion services.
//!
//! Every chat call resolves (or lazily creates) a conversation thread,
//! assembles memory context and recent history, renders the persona's
//! system prompt, and routes generation through the provider fallback
//! chain. A generation failure never surfaces as an error: the outcome
//! carries the failure message and the conversation id, and no messages
//! are persisted for the failed turn.
//!
//! ## External interactions
//!
//! - **SQLite**: conversations, messages, and replica records
//! - **Vector index**: memory retrieval for context assembly
//! - **AI models**: text generation via the fallback router

use std::sync::Arc;

use chrono::Utc;
use echo_core::EchoError;
use generation::{FallbackRouter, GenerationRequest, ProviderId};
use prompt::{
    replica_prompt, self_reflection_prompt, service_prompt, ChatMessage, CompanionService,
    ReplicaLifecycle, ReplicaPersona,
};
use recall::MemoryRetriever;
use storage::{
    ConversationKind, ConversationRecord, ConversationRepository, MessageRecord, MessageRole,
    ReplicaRepository, ReplicaStatus,
};
use tracing::{info, instrument, warn};

/// History turns carried into each generation request.
const HISTORY_LIMIT: i64 = 6;

/// The authenticated user a chat call acts for.
#[derive(Debug, Clone)]
pub struct UserScope {
    pub user_id: String,
    pub display_name: String,
}

impl UserScope {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Result of one chat turn. Exactly one of `response` and `error` is set.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub conversation_id: String,
    pub persona_name: String,
    pub response: Option<String>,
    /// Provider that answered, when one did.
    pub provider: Option<ProviderId>,
    pub fallback_used: bool,
    pub tokens_used: Option<u32>,
    pub error: Option<String>,
}

/// Orchestrates chat turns across personas.
#[derive(Clone)]
pub struct ChatService {
    conversations: ConversationRepository,
    replicas: ReplicaRepository,
    retriever: MemoryRetriever,
    router: Arc<FallbackRouter>,
    preferred: ProviderId,
}

impl ChatService {
    pub fn new(
        conversations: ConversationRepository,
        replicas: ReplicaRepository,
        retriever: MemoryRetriever,
        router: Arc<FallbackRouter>,
    ) -> Self {
        Self {
            conversations,
            replicas,
            retriever,
            router,
            preferred: ProviderId::OpenAi,
        }
    }

    pub fn with_preferred_provider(mut self, preferred: ProviderId) -> Self {
        self.preferred = preferred;
        self
    }

    /// One turn with the user's past self.
    #[instrument(skip(self, user, message), fields(user_id = %user.user_id))]
    pub async fn chat_with_self(
        &self,
        user: &UserScope,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome, anyhow::Error> {
        let conversation = match conversation_id {
            Some(id) => self
                .conversations
                .find_for_user(&user.user_id, id)
                .await?
                .ok_or_else(|| EchoError::NotFound(format!("conversation {id}")))?,
            None => {
                let title = format!("Chat with past self - {}", Utc::now().format("%Y-%m-%d %H:%M"));
                let conversation =
                    ConversationRecord::new(&user.user_id, ConversationKind::SelfReflection, title);
                self.conversations.save(&conversation).await?;
                info!(conversation_id = %conversation.id, "step: started self conversation");
                conversation
            }
        };

        let context = self.retriever.context_for(message, &user.user_id).await?;
        let system_prompt = self_reflection_prompt(&user.display_name, &context.text);
        let history = self.history(&conversation.id).await?;
        let request = GenerationRequest::new(system_prompt, history, message).with_temperature(0.7);

        let persona_name = format!("{}'s past self", user.display_name);
        self.finish(&conversation, persona_name, message, context.memory_ids, request)
            .await
    }

    /// One turn with a replica persona. The replica must exist and belong
    /// to the user.
    #[instrument(skip(self, user, message), fields(user_id = %user.user_id, replica_id = %replica_id))]
    pub async fn chat_with_replica(
        &self,
        user: &UserScope,
        replica_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome, anyhow::Error> {
        let replica = self
            .replicas
            .find_for_user(&user.user_id, replica_id)
            .await?
            .ok_or_else(|| EchoError::NotFound(format!("replica {replica_id}")))?;

        let conversation = match conversation_id {
            Some(id) => self
                .conversations
                .find_for_user_and_replica(&user.user_id, id, replica_id)
                .await?
                .ok_or_else(|| EchoError::NotFound(format!("conversation {id}")))?,
            None => {
                let title = format!(
                    "Chat with {} - {}",
                    replica.name,
                    Utc::now().format("%Y-%m-%d %H:%M")
                );
                let conversation =
                    ConversationRecord::new(&user.user_id, ConversationKind::Replica, title)
                        .with_replica(replica_id);
                self.conversations.save(&conversation).await?;
                info!(conversation_id = %conversation.id, "step: started replica conversation");
                conversation
            }
        };

        let context = self
            .retriever
            .replica_context_for(&replica.name, message, &user.user_id)
            .await?;
        let persona = ReplicaPersona {
            name: replica.name.clone(),
            relationship: replica
                .relationship
                .clone()
                .unwrap_or_else(|| "loved one".to_string()),
            lifecycle: match replica.status {
                ReplicaStatus::Living => ReplicaLifecycle::Living,
                ReplicaStatus::Deceased => ReplicaLifecycle::Deceased,
                ReplicaStatus::Unknown => ReplicaLifecycle::Unknown,
            },
            personality_traits: replica.personality_traits.clone(),
            speaking_style: replica.speaking_style.clone(),
        };
        let system_prompt = replica_prompt(&persona, &user.display_name, &context.text);
        let history = self.history(&conversation.id).await?;
        let request = GenerationRequest::new(system_prompt, history, message).with_temperature(0.8);

        let outcome = self
            .finish(&conversation, replica.name.clone(), message, context.memory_ids, request)
            .await?;
        if outcome.response.is_some() {
            self.replicas.record_interaction(replica_id, Utc::now()).await?;
        }
        Ok(outcome)
    }

    /// One turn with a companion service from the fixed catalog.
    #[instrument(skip(self, user, message), fields(user_id = %user.user_id, service_id = %service_id))]
    pub async fn chat_with_service(
        &self,
        user: &UserScope,
        service_id: &str,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome, anyhow::Error> {
        let service = CompanionService::find(service_id)
            .ok_or_else(|| EchoError::NotFound(format!("companion service {service_id}")))?;

        let conversation = match conversation_id {
            Some(id) => self
                .conversations
                .find_for_user(&user.user_id, id)
                .await?
                .ok_or_else(|| EchoError::NotFound(format!("conversation {id}")))?,
            None => {
                let title = format!(
                    "Chat with {} - {}",
                    service.name,
                    Utc::now().format("%Y-%m-%d %H:%M")
                );
                let conversation =
                    ConversationRecord::new(&user.user_id, ConversationKind::Service, title);
                self.conversations.save(&conversation).await?;
                info!(conversation_id = %conversation.id, "step: started service conversation");
                conversation
            }
        };

        let system_prompt = service_prompt(service, Some(&user.display_name));
        let history = self.history(&conversation.id).await?;
        let request = GenerationRequest::new(system_prompt, history, message).with_temperature(0.7);

        self.finish(&conversation, service.name.to_string(), message, Vec::new(), request)
            .await
    }

    /// Full message log of a conversation, oldest first.
    pub async fn conversation_history(
        &self,
        user: &UserScope,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, anyhow::Error> {
        self.conversations
            .find_for_user(&user.user_id, conversation_id)
            .await?
            .ok_or_else(|| EchoError::NotFound(format!("conversation {conversation_id}")))?;
        Ok(self.conversations.messages(conversation_id).await?)
    }

    /// The user's conversations, most recently active first.
    pub async fn list_conversations(
        &self,
        user: &UserScope,
    ) -> Result<Vec<ConversationRecord>, anyhow::Error> {
        Ok(self.conversations.list_by_user(&user.user_id).await?)
    }

    /// Recent turns mapped for the generation request, oldest first.
    async fn history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, anyhow::Error> {
        let mut recent = self
            .conversations
            .recent_messages(conversation_id, HISTORY_LIMIT)
            .await?;
        recent.reverse();
        Ok(recent
            .into_iter()
            .map(|m| match m.role {
                MessageRole::User => ChatMessage::user(m.content),
                MessageRole::Assistant => ChatMessage::assistant(m.content),
                MessageRole::System => ChatMessage::system(m.content),
            })
            .collect())
    }

    /// Routes the generation and persists the turn. A router failure is
    /// folded into the outcome; the failed turn leaves no messages.
    async fn finish(
        &self,
        conversation: &ConversationRecord,
        persona_name: String,
        user_message: &str,
        memory_ids: Vec<String>,
        request: GenerationRequest,
    ) -> Result<ChatOutcome, anyhow::Error> {
        match self.router.generate(self.preferred, &request).await {
            Ok(routed) => {
                let user_record =
                    MessageRecord::new(&conversation.id, MessageRole::User, user_message);
                self.conversations.save_message(&user_record).await?;

                let assistant_record = MessageRecord::new(
                    &conversation.id,
                    MessageRole::Assistant,
                    &routed.output.text,
                )
                .with_generation_meta(
                    routed.output.tokens_used.map(i64::from),
                    Some(routed.provider.as_str().to_string()),
                )
                .with_relevant_memories(memory_ids);
                self.conversations.save_message(&assistant_record).await?;
                self.conversations.touch(&conversation.id, Utc::now()).await?;

                info!(provider = %routed.provider, fallback = routed.fallback_used, "step: turn completed");
                Ok(ChatOutcome {
                    conversation_id: conversation.id.clone(),
                    persona_name,
                    response: Some(routed.output.text),
                    provider: Some(routed.provider),
                    fallback_used: routed.fallback_used,
                    tokens_used: routed.output.tokens_used,
                    error: None,
                })
            }
            Err(e) => {
                warn!(error = %e, "generation failed, turn not persisted");
                Ok(ChatOutcome {
                    conversation_id: conversation.id.clone(),
                    persona_name,
                    response: None,
                    provider: None,
                    fallback_used: false,
                    tokens_used: None,
                    error: Some(e.to_string()),
                })
            }
        }
    }
}
