//! Embedding request wire type (OpenAI-compatible `/v1/embeddings`)

use serde::{Deserialize, Serialize};

/// Request to embed one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    model: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding_format: Option<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            encoding_format: Some("float".to_string()),
        }
    }

    /// Drop the encoding format for servers that reject it
    pub fn without_encoding_format(mut self) -> Self {
        self.encoding_format = None;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn encoding_format(&self) -> Option<&str> {
        self.encoding_format.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let request = EmbeddingRequest::new("bge-m3", "Hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"model": "bge-m3", "input": "Hello", "encoding_format": "float"})
        );
    }

    #[test]
    fn test_request_without_encoding_format() {
        let request = EmbeddingRequest::new("bge-m3", "Hello").without_encoding_format();
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("encoding_format").is_none());
        assert_eq!(request.model(), "bge-m3");
        assert_eq!(request.input(), "Hello");
    }
}
