//! In-memory vector store for development and testing

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::embedding::cosine_similarity;
use crate::domain::knowledge_base::{
    CollectionInfo, CollectionStatus, Document, FieldMatch, MetadataFilter, ScrollOffset,
    ScrollPage, StoredPoint, VectorPoint, VectorStore,
};
use crate::domain::DomainError;

/// Brute-force cosine search over collections held in process memory
///
/// Points are kept ordered by id so scroll cursors stay valid across pages.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Debug)]
struct Collection {
    dimension: u64,
    status: CollectionStatus,
    indexes: HashSet<String>,
    points: BTreeMap<String, StoredRecord>,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    vector: Vec<f32>,
    document: Document,
}

impl InMemoryVectorStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Override a collection's reported status
    pub async fn set_status(&self, collection: &str, status: CollectionStatus) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        entry.status = status;
        Ok(())
    }

    /// Payload paths with a keyword index on a collection
    pub async fn indexed_fields(&self, collection: &str) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut fields: Vec<String> = collections
            .get(collection)
            .map(|c| c.indexes.iter().cloned().collect())
            .unwrap_or_default();
        fields.sort();
        fields
    }

    /// Number of points in a collection
    pub async fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.points.len())
    }
}

fn collection_not_found(collection: &str) -> DomainError {
    DomainError::vector_store(format!("Collection '{}' not found", collection))
}

fn to_stored_point(id: &str, record: &StoredRecord, score: Option<f32>) -> StoredPoint {
    StoredPoint {
        id: id.to_string(),
        document: record.document.clone(),
        score,
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, DomainError> {
        Ok(self.collections.read().await.contains_key(collection))
    }

    async fn create_collection(&self, collection: &str, dimension: u64) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                dimension,
                status: CollectionStatus::Green,
                indexes: HashSet::new(),
                points: BTreeMap::new(),
            });
        Ok(())
    }

    async fn create_keyword_index(&self, collection: &str, field: &str) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;
        entry.indexes.insert(field.to_string());
        Ok(())
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, DomainError> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        Ok(CollectionInfo {
            dimension: entry.dimension,
            status: entry.status,
        })
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        if point.vector.len() as u64 != entry.dimension {
            return Err(DomainError::vector_store(format!(
                "Vector dimension error: expected dim: {}, got {}",
                entry.dimension,
                point.vector.len()
            )));
        }

        entry.points.insert(
            point.id,
            StoredRecord {
                vector: point.vector,
                document: point.payload,
            },
        );
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        filter: Option<MetadataFilter>,
        limit: u64,
    ) -> Result<Vec<StoredPoint>, DomainError> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        let mut scored: Vec<(f32, &String, &StoredRecord)> = entry
            .points
            .iter()
            .filter(|(_, record)| {
                filter
                    .as_ref()
                    .is_none_or(|f| matches_filter(&record.document, f))
            })
            .map(|(id, record)| (cosine_similarity(&vector, &record.vector), id, record))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit as usize)
            .map(|(score, id, record)| to_stored_point(id, record, Some(score)))
            .collect())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<MetadataFilter>,
        limit: u64,
        offset: Option<ScrollOffset>,
    ) -> Result<ScrollPage, DomainError> {
        let collections = self.collections.read().await;
        let entry = collections
            .get(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        let start = match &offset {
            Some(ScrollOffset(id)) => Bound::Included(id.clone()),
            None => Bound::Unbounded,
        };

        let mut matching = entry
            .points
            .range((start, Bound::Unbounded))
            .filter(|(_, record)| {
                filter
                    .as_ref()
                    .is_none_or(|f| matches_filter(&record.document, f))
            });

        let points: Vec<StoredPoint> = matching
            .by_ref()
            .take(limit as usize)
            .map(|(id, record)| to_stored_point(id, record, None))
            .collect();

        let next_offset = matching.next().map(|(id, _)| ScrollOffset(id.clone()));

        Ok(ScrollPage {
            points,
            next_offset,
        })
    }

    async fn delete(&self, collection: &str, filter: MetadataFilter) -> Result<(), DomainError> {
        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| collection_not_found(collection))?;

        entry
            .points
            .retain(|_, record| !matches_filter(&record.document, &filter));
        Ok(())
    }
}

/// Check if a document matches every condition of a filter
fn matches_filter(doc: &Document, filter: &MetadataFilter) -> bool {
    filter.must.iter().all(|condition| {
        doc.metadata
            .get(condition.metadata_key())
            .is_some_and(|value| matches_value(value, &condition.matcher))
    })
}

/// Array payloads match when any element does
fn matches_value(value: &serde_json::Value, matcher: &FieldMatch) -> bool {
    match value {
        serde_json::Value::Array(items) => items.iter().any(|item| matches_value(item, matcher)),
        scalar => match matcher {
            FieldMatch::Eq(expected) => expected.matches_json(scalar),
            FieldMatch::In(set) => set.matches_json(scalar),
        },
    }
}
