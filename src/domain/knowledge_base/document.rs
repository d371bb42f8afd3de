//! Knowledge base document (chunk) entity

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known metadata keys carried by stored chunks
pub mod metadata_keys {
    /// Payload field holding the metadata map
    pub const METADATA: &str = "metadata";
    /// Payload field holding the chunk text
    pub const PAGE_CONTENT: &str = "page_content";
    /// Id of the logical parent document the chunk was split from
    pub const PARENT_ID: &str = "parent_id";
    /// Position of the chunk within its parent's chunk set
    pub const ORDER_INDEX: &str = "order_index";
    /// Id of the uploaded file the chunk was loaded from, unique per upload
    pub const FILE_ID: &str = "file_id";
    /// Original filename, not unique
    pub const DOC_FILENAME: &str = "doc_filename";

    /// Payload path of a metadata key, as used by store-side filters and indexes
    pub fn payload_path(key: &str) -> String {
        format!("{}.{}", METADATA, key)
    }
}

/// A chunk of text with its metadata, stored as one point in a collection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set all metadata
    pub fn with_all_metadata(mut self, metadata: HashMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>, order_index: i64) -> Self {
        self.metadata.insert(
            metadata_keys::PARENT_ID.to_string(),
            serde_json::Value::String(parent_id.into()),
        );
        self.metadata.insert(
            metadata_keys::ORDER_INDEX.to_string(),
            serde_json::Value::from(order_index),
        );
        self
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.set_file_id(file_id);
        self
    }

    pub fn set_file_id(&mut self, file_id: impl Into<String>) {
        self.metadata.insert(
            metadata_keys::FILE_ID.to_string(),
            serde_json::Value::String(file_id.into()),
        );
    }

    pub fn set_doc_filename(&mut self, filename: impl Into<String>) {
        self.metadata.insert(
            metadata_keys::DOC_FILENAME.to_string(),
            serde_json::Value::String(filename.into()),
        );
    }

    /// Parent id, if present and a string
    pub fn parent_id(&self) -> Option<&str> {
        self.metadata
            .get(metadata_keys::PARENT_ID)
            .and_then(|v| v.as_str())
    }

    /// Order index within the parent, if present and an integer
    pub fn order_index(&self) -> Option<i64> {
        self.metadata
            .get(metadata_keys::ORDER_INDEX)
            .and_then(|v| v.as_i64())
    }

    pub fn file_id(&self) -> Option<&str> {
        self.metadata
            .get(metadata_keys::FILE_ID)
            .and_then(|v| v.as_str())
    }

    pub fn doc_filename(&self) -> Option<&str> {
        self.metadata
            .get(metadata_keys::DOC_FILENAME)
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_document() {
        let doc = Document::new("Test content")
            .with_parent("P", 2)
            .with_file_id("F1")
            .with_metadata("author", serde_json::json!("alice"));

        assert_eq!(doc.page_content, "Test content");
        assert_eq!(doc.parent_id(), Some("P"));
        assert_eq!(doc.order_index(), Some(2));
        assert_eq!(doc.file_id(), Some("F1"));
        assert_eq!(doc.doc_filename(), None);
        assert_eq!(doc.metadata["author"], "alice");
    }

    #[test]
    fn test_null_parent_id() {
        let doc = Document::new("orphan").with_metadata(metadata_keys::PARENT_ID, serde_json::Value::Null);
        assert_eq!(doc.parent_id(), None);
    }

    #[test]
    fn test_payload_shape() {
        let doc = Document::new("hello").with_file_id("F1");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["page_content"], "hello");
        assert_eq!(json["metadata"]["file_id"], "F1");

        let missing_metadata: Document =
            serde_json::from_value(serde_json::json!({"page_content": "x"})).unwrap();
        assert!(missing_metadata.metadata.is_empty());
    }

    #[test]
    fn test_payload_path() {
        assert_eq!(metadata_keys::payload_path("file_id"), "metadata.file_id");
    }
}
