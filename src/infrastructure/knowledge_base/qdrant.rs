//! Qdrant vector store adapter

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config, CollectionStatus as QdrantStatus,
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, ListValue, PointId, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, Struct, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value as JsonValue;

use crate::domain::knowledge_base::{
    metadata_keys, CollectionInfo, CollectionStatus, Document, FieldMatch, MatchAny, MatchValue,
    MetadataFilter, ScrollOffset, ScrollPage, StoredPoint, VectorPoint, VectorStore,
};
use crate::domain::DomainError;

/// Vector store backed by a Qdrant server (gRPC)
pub struct QdrantVectorStore {
    client: Qdrant,
    url: String,
}

impl std::fmt::Debug for QdrantVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantVectorStore")
            .field("url", &self.url)
            .finish()
    }
}

impl QdrantVectorStore {
    /// Build a client for the server at `url`. No request is made.
    pub fn connect(url: impl Into<String>, api_key: Option<String>) -> Result<Self, DomainError> {
        let url = url.into();
        let mut builder = Qdrant::from_url(&url);
        if let Some(api_key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.api_key(api_key);
        }

        let client = builder.build().map_err(|e| {
            DomainError::configuration(format!("Failed to build Qdrant client for {}: {}", url, e))
        })?;

        Ok(Self { client, url })
    }
}

fn store_error(operation: &str, collection: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::vector_store(format!("{} on '{}' failed: {}", operation, collection, e))
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn backend_name(&self) -> &'static str {
        "qdrant"
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, DomainError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| store_error("collection_exists", collection, e))
    }

    async fn create_collection(&self, collection: &str, dimension: u64) -> Result<(), DomainError> {
        let result = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine)),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // Another process created it between our existence check and now
            Err(e) if is_already_exists(&e.to_string()) => {
                tracing::debug!(collection = %collection, "Collection already exists");
                Ok(())
            }
            Err(e) => Err(store_error("create_collection", collection, e)),
        }
    }

    async fn create_keyword_index(&self, collection: &str, field: &str) -> Result<(), DomainError> {
        let result = self
            .client
            .create_field_index(
                CreateFieldIndexCollectionBuilder::new(collection, field, FieldType::Keyword)
                    .wait(true),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e.to_string()) => Ok(()),
            Err(e) => Err(store_error("create_field_index", collection, e)),
        }
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, DomainError> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| store_error("collection_info", collection, e))?;

        let info = response.result.ok_or_else(|| {
            DomainError::vector_store(format!("Collection '{}' returned no info", collection))
        })?;

        let dimension = info
            .config
            .as_ref()
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
            .and_then(|config| match config {
                Config::Params(params) => Some(params.size),
                Config::ParamsMap(_) => None,
            })
            .ok_or_else(|| {
                DomainError::vector_store(format!(
                    "Collection '{}' has no single unnamed vector configuration",
                    collection
                ))
            })?;

        Ok(CollectionInfo {
            dimension,
            status: map_status(info.status()),
        })
    }

    async fn upsert(&self, collection: &str, point: VectorPoint) -> Result<(), DomainError> {
        let payload = document_to_payload(&point.payload)?;
        let point = PointStruct::new(point.id, point.vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point]).wait(true))
            .await
            .map_err(|e| store_error("upsert", collection, e))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        filter: Option<MetadataFilter>,
        limit: u64,
    ) -> Result<Vec<StoredPoint>, DomainError> {
        let mut request = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(&filter));
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| store_error("search", collection, e))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| StoredPoint {
                id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                document: payload_to_document(&point.payload),
                score: Some(point.score),
            })
            .collect())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<MetadataFilter>,
        limit: u64,
        offset: Option<ScrollOffset>,
    ) -> Result<ScrollPage, DomainError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let mut request = ScrollPointsBuilder::new(collection)
            .limit(limit)
            .with_payload(true)
            .with_vectors(false);
        if let Some(filter) = filter {
            request = request.filter(to_qdrant_filter(&filter));
        }
        if let Some(offset) = offset {
            request = request.offset(offset_to_point_id(&offset));
        }

        let response = self
            .client
            .scroll(request)
            .await
            .map_err(|e| store_error("scroll", collection, e))?;

        let points = response
            .result
            .into_iter()
            .map(|point| StoredPoint {
                id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                document: payload_to_document(&point.payload),
                score: None,
            })
            .collect();

        Ok(ScrollPage {
            points,
            next_offset: response
                .next_page_offset
                .as_ref()
                .map(|id| ScrollOffset(point_id_to_string(id))),
        })
    }

    async fn delete(&self, collection: &str, filter: MetadataFilter) -> Result<(), DomainError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(to_qdrant_filter(&filter))
                    .wait(true),
            )
            .await
            .map_err(|e| store_error("delete", collection, e))?;
        Ok(())
    }
}

fn is_already_exists(message: &str) -> bool {
    message.to_ascii_lowercase().contains("already exists")
}

fn map_status(status: QdrantStatus) -> CollectionStatus {
    match status {
        QdrantStatus::Green => CollectionStatus::Green,
        QdrantStatus::Yellow => CollectionStatus::Yellow,
        QdrantStatus::Red => CollectionStatus::Red,
        QdrantStatus::Grey | QdrantStatus::UnknownCollectionStatus => CollectionStatus::Grey,
    }
}

/// Build the store-side conjunction
fn to_qdrant_filter(filter: &MetadataFilter) -> Filter {
    Filter::must(filter.must.iter().map(|condition| {
        let path = condition.path.clone();
        match &condition.matcher {
            FieldMatch::Eq(MatchValue::Keyword(s)) => Condition::matches(path, s.clone()),
            FieldMatch::Eq(MatchValue::Integer(n)) => Condition::matches(path, *n),
            FieldMatch::Eq(MatchValue::Boolean(b)) => Condition::matches(path, *b),
            FieldMatch::In(MatchAny::Keywords(values)) => Condition::matches(path, values.clone()),
            FieldMatch::In(MatchAny::Integers(values)) => Condition::matches(path, values.clone()),
        }
    }))
}

fn point_id_to_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

fn offset_to_point_id(offset: &ScrollOffset) -> PointId {
    match offset.0.parse::<u64>() {
        Ok(num) => PointId::from(num),
        Err(_) => PointId::from(offset.0.clone()),
    }
}

/// Payload shape: `{"page_content": .., "metadata": {..}}`
fn document_to_payload(doc: &Document) -> Result<HashMap<String, QdrantValue>, DomainError> {
    let json = serde_json::to_value(doc)
        .map_err(|e| DomainError::internal(format!("Failed to serialize document: {}", e)))?;

    match json_to_qdrant(&json).kind {
        Some(Kind::StructValue(payload)) => Ok(payload.fields),
        _ => Err(DomainError::internal("Document did not serialize to an object")),
    }
}

fn payload_to_document(payload: &HashMap<String, QdrantValue>) -> Document {
    let page_content = payload
        .get(metadata_keys::PAGE_CONTENT)
        .and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let metadata = payload
        .get(metadata_keys::METADATA)
        .map(|v| match qdrant_to_json(v) {
            JsonValue::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        })
        .unwrap_or_default();

    Document {
        page_content,
        metadata,
    }
}

fn json_to_qdrant(json: &JsonValue) -> QdrantValue {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_qdrant).collect(),
        }),
        JsonValue::Object(map) => Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: &QdrantValue) -> JsonValue {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::IntegerValue(i)) => JsonValue::from(*i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(st)) => JsonValue::Object(
            st.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
                .collect(),
        ),
    }
}
