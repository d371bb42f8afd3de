//! Ingestion request and report types

use serde::{Deserialize, Serialize};

use crate::domain::knowledge_base::KnowledgeBaseId;

/// One uploaded file's worth of chunks headed for a knowledge base
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRequest {
    pub kb_id: KnowledgeBaseId,
    /// Unique id of the upload, stamped on every chunk as `metadata.file_id`
    pub file_id: String,
    /// Original filename, stamped as `metadata.doc_filename` when set
    pub filename: Option<String>,
}

impl IngestionRequest {
    pub fn new(kb_id: KnowledgeBaseId, file_id: impl Into<String>) -> Self {
        Self {
            kb_id,
            file_id: file_id.into(),
            filename: None,
        }
    }

    /// Create a request with a fresh UUIDv4 file id
    pub fn with_generated_file_id(kb_id: KnowledgeBaseId) -> Self {
        Self::new(kb_id, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionReport {
    pub kb_id: String,
    pub file_id: String,
    /// Number of chunks stored before the run ended
    pub chunks_added: usize,
    /// First error, which stopped the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestionReport {
    pub fn new(request: &IngestionRequest) -> Self {
        Self {
            kb_id: request.kb_id.to_string(),
            file_id: request.file_id.clone(),
            chunks_added: 0,
            error: None,
        }
    }

    /// Whether every streamed chunk was stored
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }
}
