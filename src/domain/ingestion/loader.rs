//! Document loader trait

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::Debug;

use crate::domain::knowledge_base::Document;
use crate::domain::DomainError;

/// Lazy, finite stream of chunks. It can be consumed once.
pub type DocumentStream = BoxStream<'static, Result<Document, DomainError>>;

/// Source of already-chunked documents
#[async_trait]
pub trait DocumentLoader: Send + Sync + Debug {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Open the source and stream its chunks
    async fn load(&self) -> Result<DocumentStream, DomainError>;
}
