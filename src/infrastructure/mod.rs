//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod ingestion;
pub mod knowledge_base;
pub mod logging;
pub mod services;
