//! Embedding response wire types

use serde::Deserialize;

/// One entry of the `data` array
#[derive(Debug, Clone, Deserialize)]
pub struct Embedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Body of an OpenAI-compatible `/v1/embeddings` response
///
/// Only `data` is read; `model`, `usage` and `object` are ignored since
/// several compatible servers omit them.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    data: Vec<Embedding>,
}

impl EmbeddingResponse {
    /// Vector of the embedding at batch index 0
    pub fn into_first_vector(self) -> Option<Vec<f32>> {
        self.data
            .into_iter()
            .find(|e| e.index == 0)
            .map(|e| e.embedding)
    }
}

/// Cosine similarity between two vectors, 0.0 for empty or mismatched inputs
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_vector_picks_index_zero() {
        let body = r#"{"data": [
            {"index": 1, "embedding": [0.3, 0.4]},
            {"index": 0, "embedding": [0.1, 0.2]}
        ]}"#;
        let response: EmbeddingResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.into_first_vector(), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_parse_openai_compatible_body() {
        let body = r#"{
            "object": "list",
            "model": "bge-m3",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.5, -0.5, 0.25]}],
            "usage": {"prompt_tokens": 1, "total_tokens": 1}
        }"#;
        let response: EmbeddingResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.into_first_vector().map(|v| v.len()), Some(3));
    }

    #[test]
    fn test_empty_data() {
        let response: EmbeddingResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();

        assert_eq!(response.into_first_vector(), None);
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];

        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_and_opposite() {
        let x = vec![1.0, 0.0];
        let y = vec![0.0, 1.0];
        let neg_x = vec![-1.0, 0.0];

        assert!(cosine_similarity(&x, &y).abs() < 0.0001);
        assert!((cosine_similarity(&x, &neg_x) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
