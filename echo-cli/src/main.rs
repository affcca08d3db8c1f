//! echo CLI: ingest memories, manage and train replicas, and chat with
//! the three personas. Config from env (.env supported) and CLI args.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use echo_chat::{ChatOutcome, ChatService, UserScope};
use embedding::{EmbeddingConfig, EnvEmbeddingConfig};
use generation::providers::{
    GeminiBackend, GroqBackend, HuggingFaceBackend, OllamaBackend, OpenAiBackend,
};
use generation::{EnvGenerationConfig, FallbackRouter, ProviderId, ProviderTable};
use ingest::{Annotator, LocalFileStore, MemoryIngestor, TextMemoryInput};
use openai_embedding::OpenAIEmbedding;
use recall::{MemoryRetriever, ReplicaTrainer};
use storage::{
    ConversationRepository, MemoryRepository, ReplicaRecord, ReplicaRepository, ReplicaStatus,
    SqlitePoolManager,
};
use vector_index::SqliteVectorIndex;

#[derive(Parser)]
#[command(name = "echo")]
#[command(about = "Digital legacy backend CLI: ingest, train, chat", long_about = None)]
#[command(version)]
struct Cli {
    /// User id every command acts for.
    #[arg(long, default_value = "local", global = true)]
    user: String,
    /// Display name used in persona prompts.
    #[arg(long, default_value = "You", global = true)]
    name: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a text memory and index it for retrieval.
    IngestText {
        content: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Create a replica persona for a person.
    AddReplica {
        name: String,
        #[arg(short, long)]
        relationship: Option<String>,
        #[arg(long)]
        deceased: bool,
    },
    /// Train a replica: rebuild its memory namespace from memories that involve it.
    Train { replica_id: String },
    /// One chat turn with your past self.
    ChatSelf {
        message: String,
        #[arg(short, long)]
        conversation: Option<String>,
        /// Preferred provider (openai, gemini, groq, ollama, huggingface).
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// One chat turn with a replica.
    ChatReplica {
        replica_id: String,
        message: String,
        #[arg(short, long)]
        conversation: Option<String>,
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// List providers and whether each is configured.
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    echo_core::init_tracing(
        &std::env::var("LOG_FILE").unwrap_or_else(|_| "echo.log".to_string()),
    )?;

    let cli = Cli::parse();
    let user = UserScope::new(&cli.user, &cli.name);

    match cli.command {
        Commands::IngestText { content, title, source } => {
            handle_ingest_text(&user, content, title, source).await
        }
        Commands::AddReplica { name, relationship, deceased } => {
            handle_add_replica(&user, name, relationship, deceased).await
        }
        Commands::Train { replica_id } => handle_train(&user, replica_id).await,
        Commands::ChatSelf { message, conversation, provider } => {
            let service = chat_service(provider.as_deref()).await?;
            let outcome = service
                .chat_with_self(&user, &message, conversation.as_deref())
                .await?;
            print_outcome(&outcome);
            Ok(())
        }
        Commands::ChatReplica { replica_id, message, conversation, provider } => {
            let service = chat_service(provider.as_deref()).await?;
            let outcome = service
                .chat_with_replica(&user, &replica_id, &message, conversation.as_deref())
                .await?;
            print_outcome(&outcome);
            Ok(())
        }
        Commands::Providers => handle_providers(),
    }
}

fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "./echo.db".to_string())
}

fn vector_database_url() -> String {
    std::env::var("VECTOR_DATABASE_URL").unwrap_or_else(|_| "./echo_vectors.db".to_string())
}

fn embedder() -> Result<Arc<OpenAIEmbedding>> {
    let config = EnvEmbeddingConfig::from_env()?;
    config.validate()?;
    Ok(Arc::new(OpenAIEmbedding::new_with_base_url(
        config.api_key().to_string(),
        config.model().to_string(),
        config.base_url(),
    )))
}

/// Builds the fallback router from whatever keys the environment carries.
fn router(config: &EnvGenerationConfig) -> FallbackRouter {
    let mut router = FallbackRouter::new(ProviderTable::from_config(config));
    if let Some(key) = &config.openai_api_key {
        router = router.register(Arc::new(OpenAiBackend::new(
            key.clone(),
            config.openai_model.clone(),
        )));
    }
    if let Some(key) = &config.gemini_api_key {
        router = router.register(Arc::new(GeminiBackend::new(key.clone())));
    }
    if let Some(key) = &config.groq_api_key {
        router = router.register(Arc::new(GroqBackend::new(key.clone())));
    }
    if let Some(key) = &config.huggingface_api_key {
        router = router.register(Arc::new(HuggingFaceBackend::new(key.clone())));
    }
    router.register(Arc::new(OllamaBackend::new(
        config.ollama_base_url.clone(),
        config.ollama_model.clone(),
    )))
}

async fn chat_service(preferred: Option<&str>) -> Result<ChatService> {
    let pool = SqlitePoolManager::new(&database_url()).await?;
    let conversations = ConversationRepository::with_pool_manager(pool.clone()).await?;
    let replicas = ReplicaRepository::with_pool_manager(pool).await?;
    let index = Arc::new(SqliteVectorIndex::new(&vector_database_url()).await?);
    let retriever = MemoryRetriever::new(embedder()?, index);

    let config = EnvGenerationConfig::from_env();
    let mut service = ChatService::new(
        conversations,
        replicas,
        retriever,
        Arc::new(router(&config)),
    );
    if let Some(name) = preferred {
        let provider = ProviderId::parse(name)
            .with_context(|| format!("unknown provider '{name}'"))?;
        service = service.with_preferred_provider(provider);
    }
    Ok(service)
}

async fn handle_ingest_text(
    user: &UserScope,
    content: String,
    title: Option<String>,
    source: Option<String>,
) -> Result<()> {
    let memories = MemoryRepository::new(&database_url()).await?;
    let index = Arc::new(SqliteVectorIndex::new(&vector_database_url()).await?);
    let files = Arc::new(LocalFileStore::new(
        std::env::var("FILE_STORE_DIR").unwrap_or_else(|_| "./uploads".to_string()),
    ));

    let mut ingestor = MemoryIngestor::new(memories, index, embedder()?, files);
    let config = EnvGenerationConfig::from_env();
    if let Some(key) = &config.openai_api_key {
        ingestor = ingestor.with_annotator(Annotator::new(Arc::new(OpenAiBackend::new(
            key.clone(),
            config.openai_model.clone(),
        ))));
    }

    let record = ingestor
        .ingest_text(
            &user.user_id,
            &content,
            TextMemoryInput {
                title,
                source,
                occurred_at: None,
            },
        )
        .await?;

    println!(
        "Stored memory {} ({})",
        record.id,
        record.title.as_deref().unwrap_or("untitled")
    );
    Ok(())
}

async fn handle_add_replica(
    user: &UserScope,
    name: String,
    relationship: Option<String>,
    deceased: bool,
) -> Result<()> {
    let replicas = ReplicaRepository::new(&database_url()).await?;

    let mut replica = ReplicaRecord::new(&user.user_id, &name);
    if let Some(relationship) = relationship {
        replica = replica.with_relationship(relationship);
    }
    if deceased {
        replica = replica.with_status(ReplicaStatus::Deceased);
    }
    replicas.save(&replica).await?;

    println!("Created replica {} ({})", replica.id, replica.name);
    Ok(())
}

async fn handle_train(user: &UserScope, replica_id: String) -> Result<()> {
    let pool = SqlitePoolManager::new(&database_url()).await?;
    let replicas = ReplicaRepository::with_pool_manager(pool).await?;
    let index = Arc::new(SqliteVectorIndex::new(&vector_database_url()).await?);
    let embedder = embedder()?;
    let retriever = MemoryRetriever::new(embedder.clone(), index.clone());

    let trainer = ReplicaTrainer::new(retriever, embedder, index, replicas);
    let outcome = trainer.train(&user.user_id, &replica_id).await?;

    println!(
        "Trained replica {} on {} memories (namespace {})",
        outcome.replica_id, outcome.total_memories, outcome.memory_namespace
    );
    Ok(())
}

fn handle_providers() -> Result<()> {
    let table = ProviderTable::from_config(&EnvGenerationConfig::from_env());

    println!("{:<14} {:<18} {:<10} configured", "id", "name", "priority");
    println!("{}", "-".repeat(54));
    for entry in table.entries() {
        println!(
            "{:<14} {:<18} {:<10} {}",
            entry.id.as_str(),
            entry.id.display_name(),
            entry.priority,
            if entry.available { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn print_outcome(outcome: &ChatOutcome) {
    match (&outcome.response, &outcome.error) {
        (Some(response), _) => {
            println!("{}: {}", outcome.persona_name, response);
            if let Some(provider) = outcome.provider {
                let tag = if outcome.fallback_used { " (fallback)" } else { "" };
                println!("[{}{tag}, conversation {}]", provider.display_name(), outcome.conversation_id);
            }
        }
        (None, Some(error)) => {
            eprintln!("Generation failed: {error}");
            eprintln!("[conversation {}]", outcome.conversation_id);
        }
        (None, None) => {}
    }
}
