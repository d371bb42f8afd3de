//! Process-wide knowledge base state

use std::sync::Arc;

use crate::domain::knowledge_base::{KnowledgeBase, KnowledgeBaseId, VectorStore};
use crate::domain::DomainError;
use crate::infrastructure::embedding::EmbeddingRegistry;
use crate::infrastructure::knowledge_base::{DocRetriever, KnowledgeBaseRegistry, RetrievalSettings};

/// Embedding models, the vector store and the knowledge bases built over them
///
/// Built once at startup and shared by every service. Tests build their own
/// instance and may [`reset`](Self::reset) it between cases.
pub struct KnowledgeContext {
    embeddings: Arc<EmbeddingRegistry>,
    store: Arc<dyn VectorStore>,
    knowledge_bases: KnowledgeBaseRegistry,
}

impl std::fmt::Debug for KnowledgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeContext")
            .field("store", &self.store.backend_name())
            .field("knowledge_bases", &self.knowledge_bases)
            .finish()
    }
}

impl KnowledgeContext {
    pub fn new(
        embeddings: Arc<EmbeddingRegistry>,
        store: Arc<dyn VectorStore>,
        settings: RetrievalSettings,
    ) -> Self {
        let knowledge_bases = KnowledgeBaseRegistry::new(embeddings.clone(), store.clone(), settings);
        Self {
            embeddings,
            store,
            knowledge_bases,
        }
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingRegistry> {
        &self.embeddings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn knowledge_bases(&self) -> &KnowledgeBaseRegistry {
        &self.knowledge_bases
    }

    /// Parse `kb_id` and return its cached knowledge base
    pub async fn knowledge_base(&self, kb_id: &str) -> Result<Arc<dyn KnowledgeBase>, DomainError> {
        let id = parse_kb_id(kb_id)?;
        Ok(self.knowledge_bases.get_or_create(&id).await)
    }

    /// Parse `kb_id` and return its cached parent-document retriever
    pub async fn retriever(&self, kb_id: &str) -> Result<Arc<DocRetriever>, DomainError> {
        let id = parse_kb_id(kb_id)?;
        Ok(self.knowledge_bases.get_or_create_retriever(&id).await)
    }

    /// Forget every registered model and cached knowledge base
    ///
    /// Collections in the vector store are left untouched.
    pub async fn reset(&self) {
        self.knowledge_bases.clear().await;
        self.embeddings.clear().await;
        tracing::debug!("Knowledge context reset");
    }
}

fn parse_kb_id(kb_id: &str) -> Result<KnowledgeBaseId, DomainError> {
    KnowledgeBaseId::new(kb_id).map_err(DomainError::from)
}
