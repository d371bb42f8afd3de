//! Knowledge base registry - one live instance per knowledge base id

use std::sync::Arc;

use moka::future::Cache;

use super::doc_retriever::{DocRetriever, RetrievalSettings};
use super::vector_kb::VectorKnowledgeBase;
use crate::domain::knowledge_base::{KnowledgeBase, KnowledgeBaseId, VectorStore};
use crate::infrastructure::embedding::EmbeddingRegistry;

/// Suffix of the cache key under which a knowledge base's retriever lives
const RETRIEVER_KEY_SUFFIX: &str = ";doc";

/// Registry that lazily builds and caches knowledge bases
///
/// Entries never expire. Concurrent first lookups of the same id share a
/// single construction.
pub struct KnowledgeBaseRegistry {
    embeddings: Arc<EmbeddingRegistry>,
    store: Arc<dyn VectorStore>,
    settings: RetrievalSettings,
    knowledge_bases: Cache<String, Arc<dyn KnowledgeBase>>,
    retrievers: Cache<String, Arc<DocRetriever>>,
}

impl std::fmt::Debug for KnowledgeBaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseRegistry")
            .field("store", &self.store.backend_name())
            .field("settings", &self.settings)
            .field("knowledge_bases", &self.knowledge_bases.entry_count())
            .field("retrievers", &self.retrievers.entry_count())
            .finish()
    }
}

impl KnowledgeBaseRegistry {
    pub fn new(
        embeddings: Arc<EmbeddingRegistry>,
        store: Arc<dyn VectorStore>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            embeddings,
            store,
            settings,
            knowledge_bases: Cache::builder().build(),
            retrievers: Cache::builder().build(),
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// The cached knowledge base for `id`, built on first access
    pub async fn get_or_create(&self, id: &KnowledgeBaseId) -> Arc<dyn KnowledgeBase> {
        self.knowledge_bases
            .get_with(id.as_str().to_string(), async {
                tracing::info!(
                    kb_id = %id,
                    backend = self.store.backend_name(),
                    "Creating knowledge base"
                );
                let kb = VectorKnowledgeBase::resolve(
                    id.clone(),
                    self.embeddings.clone(),
                    self.store.clone(),
                )
                .await;
                Arc::new(kb) as Arc<dyn KnowledgeBase>
            })
            .await
    }

    /// The cached parent-document retriever over the knowledge base for `id`
    pub async fn get_or_create_retriever(&self, id: &KnowledgeBaseId) -> Arc<DocRetriever> {
        let key = format!("{}{}", id.as_str(), RETRIEVER_KEY_SUFFIX);
        self.retrievers
            .get_with(key, async {
                let kb = self.get_or_create(id).await;
                Arc::new(DocRetriever::new(kb, self.settings))
            })
            .await
    }

    /// Number of cached knowledge bases
    pub async fn len(&self) -> u64 {
        self.knowledge_bases.run_pending_tasks().await;
        self.knowledge_bases.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every cached knowledge base and retriever
    pub async fn clear(&self) {
        self.retrievers.invalidate_all();
        self.knowledge_bases.invalidate_all();
        self.retrievers.run_pending_tasks().await;
        self.knowledge_bases.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{EmbeddingModel, MockEmbeddingModel};
    use crate::domain::knowledge_base::Document;
    use crate::domain::DomainError;
    use crate::infrastructure::knowledge_base::InMemoryVectorStore;

    async fn registry() -> KnowledgeBaseRegistry {
        let embeddings = Arc::new(EmbeddingRegistry::new());
        let model: Arc<dyn EmbeddingModel> = Arc::new(MockEmbeddingModel::new("mock", 16));
        embeddings.register("mock", model).await.unwrap();

        KnowledgeBaseRegistry::new(
            embeddings,
            Arc::new(InMemoryVectorStore::new()),
            RetrievalSettings::default(),
        )
    }

    fn id(raw: &str) -> KnowledgeBaseId {
        KnowledgeBaseId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_caches() {
        let registry = registry().await;

        let first = registry.get_or_create(&id("docs;mock")).await;
        let second = registry.get_or_create(&id("docs;mock")).await;
        let other = registry.get_or_create(&id("faq;mock")).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(first.id().as_str(), "docs;mock");
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access_builds_one_instance() {
        let registry = Arc::new(registry().await);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get_or_create(&id("docs;mock")).await })
            })
            .collect();

        let mut instances = Vec::new();
        for handle in handles {
            instances.push(handle.await.unwrap());
        }

        assert!(instances.iter().all(|kb| Arc::ptr_eq(kb, &instances[0])));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_model_still_cached() {
        let registry = registry().await;

        let kb = registry.get_or_create(&id("docs;missing")).await;
        let again = registry.get_or_create(&id("docs;missing")).await;

        assert!(Arc::ptr_eq(&kb, &again));
        let err = kb.add(Document::new("x")).await.unwrap_err();
        assert!(
            matches!(err, DomainError::ModelNotFound { ref model_id, .. } if model_id == "missing")
        );
    }

    #[tokio::test]
    async fn test_cached_unbound_kb_heals_after_registration() {
        let registry = registry().await;
        let kb_id = id("docs;late");
        registry.get_or_create(&kb_id).await;

        let model: Arc<dyn EmbeddingModel> = Arc::new(MockEmbeddingModel::new("late", 8));
        registry.embeddings.register("late", model).await.unwrap();

        let kb = registry.get_or_create(&kb_id).await;
        assert!(kb.add(Document::new("x")).await.is_ok());
        assert_eq!(kb.filter_by(None, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retriever_shares_knowledge_base() {
        let registry = registry().await;
        let kb_id = id("docs;mock");

        let retriever = registry.get_or_create_retriever(&kb_id).await;
        let again = registry.get_or_create_retriever(&kb_id).await;
        assert!(Arc::ptr_eq(&retriever, &again));

        let kb = registry.get_or_create(&kb_id).await;
        kb.add(Document::new("alpha").with_parent("P", 0)).await.unwrap();

        let docs = retriever.retrieve("alpha", None, 1).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = registry().await;
        let first = registry.get_or_create(&id("docs;mock")).await;

        registry.clear().await;
        assert!(registry.is_empty().await);

        let rebuilt = registry.get_or_create(&id("docs;mock")).await;
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }
}
