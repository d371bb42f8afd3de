//! Vector store adapter trait

use async_trait::async_trait;

use super::document::Document;
use super::filter::MetadataFilter;
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Health of a collection as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    Green,
    Yellow,
    Grey,
    Red,
}

impl CollectionStatus {
    pub fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Grey => write!(f, "grey"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// Collection description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Declared vector size
    pub dimension: u64,
    pub status: CollectionStatus,
}

/// Point to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Document,
}

impl VectorPoint {
    /// Create a point with a fresh UUIDv4 id
    pub fn new(vector: Vec<f32>, payload: Document) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            payload,
        }
    }
}

/// Point returned by search or scroll
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: String,
    pub document: Document,
    /// Similarity score, only set for search hits
    pub score: Option<f32>,
}

/// Opaque scroll cursor, the id of the first point of the next page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrollOffset(pub String);

/// One page of a scroll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPage {
    pub points: Vec<StoredPoint>,
    /// `None` once the scroll is exhausted
    pub next_offset: Option<ScrollOffset>,
}

/// Adapter over an external vector database
///
/// Collections are addressed by name. Filters are applied store-side;
/// payloads round-trip as `{"page_content": .., "metadata": {..}}`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logging
    fn backend_name(&self) -> &'static str;

    async fn collection_exists(&self, collection: &str) -> Result<bool, DomainError>;

    /// Create a cosine-distance collection. Creating an existing collection succeeds.
    async fn create_collection(&self, collection: &str, dimension: u64) -> Result<(), DomainError>;

    /// Create a keyword payload index on a payload path
    async fn create_keyword_index(&self, collection: &str, field: &str) -> Result<(), DomainError>;

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, DomainError>;

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<(), DomainError>;

    /// Nearest-neighbour search, best hit first
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        filter: Option<MetadataFilter>,
        limit: u64,
    ) -> Result<Vec<StoredPoint>, DomainError>;

    /// Enumerate points without ranking
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<MetadataFilter>,
        limit: u64,
        offset: Option<ScrollOffset>,
    ) -> Result<ScrollPage, DomainError>;

    /// Delete every point matching the filter
    async fn delete(&self, collection: &str, filter: MetadataFilter) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ids_are_unique_uuids() {
        let a = VectorPoint::new(vec![1.0], Document::new("a"));
        let b = VectorPoint::new(vec![1.0], Document::new("a"));

        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_collection_status() {
        assert!(CollectionStatus::Red.is_red());
        assert!(!CollectionStatus::Yellow.is_red());
        assert_eq!(CollectionStatus::Red.to_string(), "red");
    }
}
