//! Knowledge base retrieval layer
//!
//! Stores pre-chunked documents in vector collections bound to an
//! embedding model, with:
//! - One collection per `(name, embedding model)` pair, checked against
//!   the model before every operation
//! - Metadata filtering and file-level removal
//! - Whole-document retrieval by merging the chunks of matched parents
//! - Background ingestion from document loaders

pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;
pub use crate::context::KnowledgeContext;

use std::sync::Arc;
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::domain::embedding::EmbeddingModel;
use crate::domain::DomainError;
use crate::infrastructure::embedding::{EmbeddingRegistry, HttpClient, OpenAiEmbeddingModel};
use crate::infrastructure::knowledge_base::VectorStoreFactory;
use tracing::info;

/// Create the knowledge context from configuration
///
/// Connects every configured embedding model, which embeds one probe text
/// per model, and opens the configured vector store.
pub async fn create_knowledge_context(config: &AppConfig) -> Result<KnowledgeContext, DomainError> {
    let store = VectorStoreFactory::create(&config.vector_store)?;
    info!("Vector store backend: {}", config.vector_store.backend);

    let embeddings = Arc::new(EmbeddingRegistry::new());
    register_embedding_models(&embeddings, &config.embedding).await?;

    Ok(KnowledgeContext::new(
        embeddings,
        store,
        config.retrieval.settings(),
    ))
}

/// Connect and register each model listed in `embedding.models`
pub async fn register_embedding_models(
    registry: &EmbeddingRegistry,
    config: &EmbeddingConfig,
) -> Result<(), DomainError> {
    let client = match config.timeout_secs {
        Some(secs) => HttpClient::with_timeout(Duration::from_secs(secs))?,
        None => HttpClient::new(),
    };

    for model_id in &config.models {
        let model = OpenAiEmbeddingModel::connect(
            client.clone(),
            &config.base_url,
            &config.api_key,
            model_id,
        )
        .await?;
        registry
            .register(model_id, Arc::new(model) as Arc<dyn EmbeddingModel>)
            .await?;
    }

    if config.models.is_empty() {
        tracing::warn!("No embedding models configured; every knowledge base will be unbound");
    } else {
        info!(
            models = ?config.models,
            base_url = %config.base_url,
            "Embedding models registered"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{VectorStoreBackend, VectorStoreConfig};
    use crate::domain::knowledge_base::Document;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn embedding_server(dimension: usize) -> MockServer {
        let server = MockServer::start().await;
        let embedding: Vec<f32> = (0..dimension).map(|i| (i + 1) as f32).collect();
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": embedding}]
            })))
            .mount(&server)
            .await;
        server
    }

    fn config(base_url: String, models: &[&str]) -> AppConfig {
        AppConfig {
            vector_store: VectorStoreConfig {
                backend: VectorStoreBackend::InMemory,
                ..Default::default()
            },
            embedding: EmbeddingConfig {
                base_url,
                models: models.iter().map(|m| m.to_string()).collect(),
                timeout_secs: Some(5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_context_registers_configured_models() {
        let server = embedding_server(4).await;
        let config = config(server.uri(), &["bge-m3", "e5-small"]);

        let context = create_knowledge_context(&config).await.unwrap();

        assert_eq!(context.embeddings().len().await, 2);
        assert_eq!(context.embeddings().lookup("bge-m3").await.unwrap().dimension(), 4);

        let kb = context.knowledge_base("docs;bge-m3").await.unwrap();
        kb.add(Document::new("hello")).await.unwrap();
        assert_eq!(kb.filter_by(None, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_model_ids_rejected() {
        let server = embedding_server(4).await;
        let config = config(server.uri(), &["bge-m3", "bge-m3"]);

        let result = create_knowledge_context(&config).await;

        assert!(matches!(
            result,
            Err(DomainError::ModelAlreadyRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_model_fails_startup() {
        let server = MockServer::start().await;
        let config = config(server.uri(), &["bge-m3"]);

        assert!(create_knowledge_context(&config).await.is_err());
    }
}
