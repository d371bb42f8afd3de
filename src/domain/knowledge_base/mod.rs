//! Knowledge Base domain - Vector search and retrieval

mod document;
mod entity;
mod filter;
mod merge;
mod provider;
mod validation;
mod vector_store;

pub use document::{metadata_keys, Document};
pub use entity::KnowledgeBaseId;
pub use filter::{
    FieldCondition, FieldMatch, FilterCondition, FilterValue, MatchAny, MatchValue,
    MetadataFilter,
};
pub use merge::{collect_parent_ids, merge_common_prefix, reconstruct_parents, MergeOrdering};
pub use provider::KnowledgeBase;
pub use validation::{
    split_knowledge_base_id, validate_knowledge_base_id, validate_limit,
    KnowledgeBaseValidationError, KB_ID_SEPARATOR,
};
pub use vector_store::{
    CollectionInfo, CollectionStatus, ScrollOffset, ScrollPage, StoredPoint, VectorPoint,
    VectorStore,
};

#[cfg(test)]
pub use provider::MockKnowledgeBase;
#[cfg(test)]
pub use vector_store::MockVectorStore;
