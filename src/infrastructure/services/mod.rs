//! Infrastructure services

mod ingestion_service;
mod knowledge_base_service;

pub use ingestion_service::IngestionService;
pub use knowledge_base_service::KnowledgeBaseService;
