//! Embedding model trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Text embedded once at construction to discover a model's dimension
pub const PROBE_TEXT: &str = "Hello";

/// A text embedding model with a fixed output dimension
#[async_trait]
pub trait EmbeddingModel: Send + Sync + Debug {
    /// Model identifier, as used in knowledge base ids
    fn id(&self) -> &str;

    /// Length of every vector this model produces
    fn dimension(&self) -> u64;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;
}
