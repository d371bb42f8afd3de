//! Domain layer - Core business logic and entities

pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge_base;

pub use embedding::{EmbeddingModel, PROBE_TEXT};
pub use error::DomainError;
pub use ingestion::{DocumentLoader, DocumentStream, IngestionReport, IngestionRequest};
pub use knowledge_base::{
    CollectionInfo, CollectionStatus, Document, FilterCondition, FilterValue, KnowledgeBase,
    KnowledgeBaseId, MergeOrdering, MetadataFilter, ScrollOffset, ScrollPage, StoredPoint,
    VectorPoint, VectorStore,
};
