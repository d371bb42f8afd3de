//! Vector store factory

use std::sync::Arc;

use crate::config::{VectorStoreBackend, VectorStoreConfig};
use crate::domain::knowledge_base::VectorStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryVectorStore;
use super::qdrant::QdrantVectorStore;

/// Factory for creating vector store adapters
#[derive(Debug)]
pub struct VectorStoreFactory;

impl VectorStoreFactory {
    /// Create a Qdrant adapter
    pub fn create_qdrant(
        url: &str,
        api_key: Option<String>,
    ) -> Result<Arc<dyn VectorStore>, DomainError> {
        Ok(Arc::new(QdrantVectorStore::connect(url, api_key)?))
    }

    /// Create a process-local store
    pub fn create_in_memory() -> Arc<dyn VectorStore> {
        Arc::new(InMemoryVectorStore::new())
    }

    /// Create the store selected by configuration
    pub fn create(config: &VectorStoreConfig) -> Result<Arc<dyn VectorStore>, DomainError> {
        tracing::info!(backend = %config.backend, "Creating vector store");

        match config.backend {
            VectorStoreBackend::Qdrant => {
                if config.url.trim().is_empty() {
                    return Err(DomainError::configuration(
                        "vector_store.url is required for the qdrant backend",
                    ));
                }
                Self::create_qdrant(&config.url, config.api_key.clone())
            }
            VectorStoreBackend::InMemory => Ok(Self::create_in_memory()),
        }
    }
}
