//! Knowledge base trait

use async_trait::async_trait;

use super::document::Document;
use super::entity::KnowledgeBaseId;
use super::filter::FilterCondition;
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// A named collection bound to one embedding model
///
/// Every operation first makes sure the backing collection exists and is
/// consistent with the bound model.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    fn id(&self) -> &KnowledgeBaseId;

    /// Create the collection if missing and check it against the model
    async fn ensure_ready(&self) -> Result<(), DomainError>;

    /// Embed and store one chunk, returning its point id
    async fn add(&self, document: Document) -> Result<String, DomainError>;

    /// Similarity search. `Some` of an empty filter matches nothing.
    async fn query(
        &self,
        query: &str,
        filter: Option<FilterCondition>,
        limit: usize,
    ) -> Result<Vec<Document>, DomainError>;

    /// Unranked enumeration, skipping `offset` matching points
    async fn filter_by(
        &self,
        filter: Option<FilterCondition>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>, DomainError>;

    /// Delete every chunk loaded from one of the given files
    async fn remove(&self, file_ids: Vec<String>) -> Result<bool, DomainError>;

    /// Every point matching the filter, following scroll cursors to the end
    async fn scroll_all(&self, filter: FilterCondition) -> Result<Vec<Document>, DomainError>;
}
