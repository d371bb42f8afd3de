//! Parent document reconstruction over chunked knowledge bases

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::{
    collect_parent_ids, metadata_keys, reconstruct_parents, Document, FilterCondition,
    KnowledgeBase, MergeOrdering,
};
use crate::domain::DomainError;

pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 3;

/// Tuning for parent reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Chunk hits fetched per requested document
    pub oversample_factor: usize,
    pub merge_ordering: MergeOrdering,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            merge_ordering: MergeOrdering::default(),
        }
    }
}

/// Returns whole parent documents for a query instead of single chunks
///
/// Similarity search runs against `base`; the full chunk set of every
/// matched parent is then read from `grouped`. Both are usually the same
/// knowledge base.
pub struct DocRetriever {
    base: Arc<dyn KnowledgeBase>,
    grouped: Arc<dyn KnowledgeBase>,
    settings: RetrievalSettings,
}

impl std::fmt::Debug for DocRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocRetriever")
            .field("base", &self.base.id())
            .field("grouped", &self.grouped.id())
            .field("settings", &self.settings)
            .finish()
    }
}

impl DocRetriever {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>, settings: RetrievalSettings) -> Self {
        Self {
            grouped: knowledge_base.clone(),
            base: knowledge_base,
            settings,
        }
    }

    /// Read parent groups from a different knowledge base than the one searched
    pub fn with_grouped(mut self, grouped: Arc<dyn KnowledgeBase>) -> Self {
        self.grouped = grouped;
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Up to `limit` reconstructed parent documents, best parent first
    pub async fn retrieve(
        &self,
        query: &str,
        filter: Option<FilterCondition>,
        limit: usize,
    ) -> Result<Vec<Document>, DomainError> {
        let oversampled = limit.saturating_mul(self.settings.oversample_factor.max(1));
        let hits = self.base.query(query, filter, oversampled).await?;

        let parents = collect_parent_ids(&hits);
        if parents.is_empty() {
            tracing::debug!(
                kb_id = %self.base.id(),
                hits = hits.len(),
                "No groupable chunks matched"
            );
            return Ok(Vec::new());
        }

        let group_filter =
            FilterCondition::new().with(metadata_keys::PARENT_ID, parents.clone());
        let children = self.grouped.scroll_all(group_filter).await?;

        let documents =
            reconstruct_parents(&parents, children, self.settings.merge_ordering, limit);

        tracing::debug!(
            kb_id = %self.base.id(),
            hits = hits.len(),
            parents = parents.len(),
            documents = documents.len(),
            "Reconstructed parent documents"
        );

        Ok(documents)
    }
}
