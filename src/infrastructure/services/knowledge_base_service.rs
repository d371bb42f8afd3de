//! Knowledge Base service - chunk storage and retrieval by knowledge base id

use std::sync::Arc;

use crate::context::KnowledgeContext;
use crate::domain::knowledge_base::{metadata_keys, Document, FilterCondition};
use crate::domain::DomainError;

/// Entry point for callers addressing knowledge bases by their string id
pub struct KnowledgeBaseService {
    context: Arc<KnowledgeContext>,
}

impl std::fmt::Debug for KnowledgeBaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseService").finish()
    }
}

impl KnowledgeBaseService {
    pub fn new(context: Arc<KnowledgeContext>) -> Self {
        Self { context }
    }

    /// Store one pre-split chunk
    pub async fn add_split(&self, kb_id: &str, document: Document) -> Result<String, DomainError> {
        self.context.knowledge_base(kb_id).await?.add(document).await
    }

    /// Chunks most similar to `text`
    pub async fn query(
        &self,
        kb_id: &str,
        text: &str,
        filter: Option<FilterCondition>,
        limit: usize,
    ) -> Result<Vec<Document>, DomainError> {
        self.context
            .knowledge_base(kb_id)
            .await?
            .query(text, filter, limit)
            .await
    }

    /// Chunks matching `filter`, skipping the first `offset`
    pub async fn filter_by(
        &self,
        kb_id: &str,
        filter: Option<FilterCondition>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>, DomainError> {
        self.context
            .knowledge_base(kb_id)
            .await?
            .filter_by(filter, limit, offset)
            .await
    }

    /// Delete every chunk of the given files
    pub async fn remove(&self, kb_id: &str, file_ids: Vec<String>) -> Result<bool, DomainError> {
        self.context.knowledge_base(kb_id).await?.remove(file_ids).await
    }

    /// Whole parent documents most relevant to `text`
    pub async fn query_relevant(
        &self,
        kb_id: &str,
        text: &str,
        filter: Option<FilterCondition>,
        limit: usize,
    ) -> Result<Vec<Document>, DomainError> {
        self.context
            .retriever(kb_id)
            .await?
            .retrieve(text, filter, limit)
            .await
    }

    /// Search restricted to a set of files
    ///
    /// An empty or missing `file_ids` searches the whole knowledge base.
    /// `relevant` returns reconstructed parent documents instead of chunks.
    pub async fn query_docs(
        &self,
        kb_id: &str,
        text: &str,
        limit: usize,
        file_ids: Option<Vec<String>>,
        relevant: bool,
    ) -> Result<Vec<Document>, DomainError> {
        let filter = file_ids
            .filter(|ids| !ids.is_empty())
            .map(|ids| FilterCondition::new().with(metadata_keys::FILE_ID, ids));

        tracing::debug!(
            kb_id = %kb_id,
            limit = limit,
            relevant = relevant,
            filtered = filter.is_some(),
            "Querying documents"
        );

        if relevant {
            self.query_relevant(kb_id, text, filter, limit).await
        } else {
            self.query(kb_id, text, filter, limit).await
        }
    }
}
