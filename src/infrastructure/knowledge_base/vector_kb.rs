//! Knowledge base over a vector store collection

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::embedding::EmbeddingModel;
use crate::domain::knowledge_base::{
    metadata_keys, validate_limit, Document, FilterCondition, KnowledgeBase, KnowledgeBaseId,
    MetadataFilter, ScrollOffset, VectorPoint, VectorStore,
};
use crate::domain::DomainError;
use crate::infrastructure::embedding::EmbeddingRegistry;

/// Metadata keys that get a keyword payload index in every collection
pub const INDEXED_METADATA_KEYS: [&str; 2] = [metadata_keys::PARENT_ID, metadata_keys::FILE_ID];

/// Largest page requested from the store while walking scroll cursors
const SCROLL_PAGE_SIZE: usize = 256;

/// Embedding model a knowledge base is currently bound to
#[derive(Debug, Clone)]
pub enum ModelBinding {
    Bound(Arc<dyn EmbeddingModel>),
    /// The model id was unknown when last looked up; operations fail with
    /// `ModelNotFound` until it is registered
    Unbound { reason: String },
}

/// Knowledge base bound to one embedding model and one store collection
///
/// The collection is created on first use with the model's dimension and
/// is checked against the model before every operation. An unbound
/// knowledge base built by [`VectorKnowledgeBase::resolve`] retries the
/// registry lookup on each operation and binds once the model appears.
pub struct VectorKnowledgeBase {
    id: KnowledgeBaseId,
    binding: RwLock<ModelBinding>,
    embeddings: Option<Arc<EmbeddingRegistry>>,
    store: Arc<dyn VectorStore>,
    ensure_lock: Mutex<()>,
    indexed: AtomicBool,
}

impl std::fmt::Debug for VectorKnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorKnowledgeBase")
            .field("id", &self.id)
            .field("binding", &self.binding)
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl VectorKnowledgeBase {
    /// Create a knowledge base with a fixed binding
    pub fn new(id: KnowledgeBaseId, binding: ModelBinding, store: Arc<dyn VectorStore>) -> Self {
        Self {
            id,
            binding: RwLock::new(binding),
            embeddings: None,
            store,
            ensure_lock: Mutex::new(()),
            indexed: AtomicBool::new(false),
        }
    }

    /// Resolve the id's model in the registry
    ///
    /// An unknown model does not fail construction; the knowledge base is
    /// created unbound and its operations report the missing model until a
    /// later lookup succeeds.
    pub async fn resolve(
        id: KnowledgeBaseId,
        embeddings: Arc<EmbeddingRegistry>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let binding = match embeddings.lookup(id.embedding_model_id()).await {
            Ok(model) => ModelBinding::Bound(model),
            Err(e) => {
                tracing::warn!(
                    kb_id = %id,
                    model_id = %id.embedding_model_id(),
                    error = %e,
                    "Knowledge base created without an embedding model, \
                     register the model before using it"
                );
                ModelBinding::Unbound {
                    reason: e.to_string(),
                }
            }
        };

        let mut kb = Self::new(id, binding, store);
        kb.embeddings = Some(embeddings);
        kb
    }

    pub async fn is_bound(&self) -> bool {
        matches!(*self.binding.read().await, ModelBinding::Bound(_))
    }

    /// The bound model, looking it up again while unbound
    async fn model(&self) -> Result<Arc<dyn EmbeddingModel>, DomainError> {
        let bound = match &*self.binding.read().await {
            ModelBinding::Bound(model) => Some(model.clone()),
            ModelBinding::Unbound { .. } => None,
        };
        if let Some(model) = bound {
            return Ok(model);
        }

        if let Some(embeddings) = &self.embeddings {
            if let Ok(model) = embeddings.lookup(self.id.embedding_model_id()).await {
                tracing::info!(
                    kb_id = %self.id,
                    model_id = %self.id.embedding_model_id(),
                    "Knowledge base bound to late-registered embedding model"
                );
                *self.binding.write().await = ModelBinding::Bound(model.clone());
                return Ok(model);
            }
        }

        Err(DomainError::model_not_bound(
            self.id.embedding_model_id(),
            self.id.as_str(),
        ))
    }

    fn collection(&self) -> &str {
        self.id.collection_name()
    }

    fn build_filter(&self, filter: &FilterCondition) -> Result<MetadataFilter, DomainError> {
        MetadataFilter::from_condition(filter).inspect_err(|e| {
            tracing::warn!(kb_id = %self.id, error = %e, "Rejected filter");
        })
    }

    async fn create_collection(&self, dimension: u64) -> Result<(), DomainError> {
        tracing::info!(
            kb_id = %self.id,
            dimension = dimension,
            backend = self.store.backend_name(),
            "Creating collection"
        );

        self.store.create_collection(self.collection(), dimension).await
    }

    /// Create the keyword indexes until one attempt fully succeeds
    ///
    /// Also covers collections created elsewhere without indexes. Index
    /// creation is idempotent in every store.
    async fn ensure_indexes(&self) -> Result<(), DomainError> {
        if self.indexed.load(Ordering::Acquire) {
            return Ok(());
        }
        for key in INDEXED_METADATA_KEYS {
            self.store
                .create_keyword_index(self.collection(), &metadata_keys::payload_path(key))
                .await
                .inspect_err(|e| {
                    tracing::warn!(kb_id = %self.id, field = key, error = %e, "Failed to create payload index");
                })?;
        }
        self.indexed.store(true, Ordering::Release);
        Ok(())
    }

    /// Walk scroll pages, skipping `offset` matches, until `limit` are collected
    async fn scroll_window(
        &self,
        filter: Option<MetadataFilter>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>, DomainError> {
        let mut documents = Vec::new();
        let mut skipped = 0;
        let mut cursor: Option<ScrollOffset> = None;

        loop {
            let wanted = offset
                .saturating_sub(skipped)
                .saturating_add(limit - documents.len());
            let page = self
                .store
                .scroll(
                    self.collection(),
                    filter.clone(),
                    wanted.min(SCROLL_PAGE_SIZE) as u64,
                    cursor.take(),
                )
                .await?;

            for point in page.points {
                if skipped < offset {
                    skipped += 1;
                } else if documents.len() < limit {
                    documents.push(point.document);
                }
            }

            if documents.len() >= limit {
                break;
            }
            match page.next_offset {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl KnowledgeBase for VectorKnowledgeBase {
    fn id(&self) -> &KnowledgeBaseId {
        &self.id
    }

    async fn ensure_ready(&self) -> Result<(), DomainError> {
        let model = self.model().await?;
        let _guard = self.ensure_lock.lock().await;
        let collection = self.collection();

        if !self.store.collection_exists(collection).await? {
            self.create_collection(model.dimension()).await?;
        }
        self.ensure_indexes().await?;

        let info = self.store.collection_info(collection).await?;

        if info.dimension != model.dimension() {
            tracing::error!(
                kb_id = %self.id,
                expected = model.dimension(),
                actual = info.dimension,
                "Collection dimension does not match embedding model"
            );
            return Err(DomainError::configuration_mismatch(
                self.id.as_str(),
                model.dimension(),
                info.dimension,
            ));
        }

        if info.status.is_red() {
            tracing::error!(kb_id = %self.id, status = %info.status, "Collection is unhealthy");
            return Err(DomainError::unhealthy_collection(
                self.id.as_str(),
                info.status.to_string(),
            ));
        }

        Ok(())
    }

    async fn add(&self, document: Document) -> Result<String, DomainError> {
        self.ensure_ready().await?;

        let vector = self.model().await?.embed(&document.page_content).await?;
        let point = VectorPoint::new(vector, document);
        let point_id = point.id.clone();

        self.store.upsert(self.collection(), point).await?;

        tracing::debug!(kb_id = %self.id, point_id = %point_id, "Added document");
        Ok(point_id)
    }

    async fn query(
        &self,
        query: &str,
        filter: Option<FilterCondition>,
        limit: usize,
    ) -> Result<Vec<Document>, DomainError> {
        self.ensure_ready().await?;
        validate_limit(limit)?;

        let filter = match filter {
            Some(condition) if condition.is_empty() => return Ok(Vec::new()),
            Some(condition) => Some(self.build_filter(&condition)?),
            None => None,
        };

        let vector = self.model().await?.embed(query).await?;
        let hits = self
            .store
            .search(self.collection(), vector, filter, limit as u64)
            .await?;

        tracing::debug!(kb_id = %self.id, limit = limit, hits = hits.len(), "Query completed");
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    async fn filter_by(
        &self,
        filter: Option<FilterCondition>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>, DomainError> {
        self.ensure_ready().await?;
        validate_limit(limit)?;

        let filter = match filter {
            Some(condition) if condition.is_empty() => return Ok(Vec::new()),
            Some(condition) => Some(self.build_filter(&condition)?),
            None => None,
        };

        self.scroll_window(filter, limit, offset).await
    }

    async fn remove(&self, file_ids: Vec<String>) -> Result<bool, DomainError> {
        self.ensure_ready().await?;

        if file_ids.is_empty() {
            return Ok(true);
        }

        tracing::info!(kb_id = %self.id, file_ids = ?file_ids, "Removing documents");

        let filter = MetadataFilter::keyword_in(metadata_keys::FILE_ID, file_ids);
        self.store.delete(self.collection(), filter).await?;
        Ok(true)
    }

    /// An empty filter matches nothing
    async fn scroll_all(&self, filter: FilterCondition) -> Result<Vec<Document>, DomainError> {
        self.ensure_ready().await?;

        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let filter = self.build_filter(&filter)?;

        let mut documents = Vec::new();
        let mut cursor: Option<ScrollOffset> = None;
        loop {
            let page = self
                .store
                .scroll(
                    self.collection(),
                    Some(filter.clone()),
                    SCROLL_PAGE_SIZE as u64,
                    cursor.take(),
                )
                .await?;

            documents.extend(page.points.into_iter().map(|point| point.document));

            match page.next_offset {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }
}
