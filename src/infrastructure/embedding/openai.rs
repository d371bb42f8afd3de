//! OpenAI-compatible embedding model implementation

use async_trait::async_trait;

use super::HttpClientTrait;
use crate::domain::embedding::{EmbeddingModel, EmbeddingRequest, EmbeddingResponse, PROBE_TEXT};
use crate::domain::DomainError;

/// Embedding model served by an OpenAI-compatible `/v1/embeddings` endpoint
///
/// Works with OpenAI and with self-hosted servers speaking the same protocol
/// (Xinference, vLLM, ...). The vector dimension is discovered once, at
/// construction, by embedding a probe text.
#[derive(Debug)]
pub struct OpenAiEmbeddingModel<C: HttpClientTrait> {
    client: C,
    model_id: String,
    auth_header: Option<String>,
    base_url: String,
    dimension: u64,
}

impl<C: HttpClientTrait> OpenAiEmbeddingModel<C> {
    /// Connect to a model and discover its dimension
    ///
    /// Performs one embedding call. An empty `api_key` sends no
    /// `Authorization` header.
    pub async fn connect(
        client: C,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let api_key = api_key.into();
        let auth_header = (!api_key.is_empty()).then(|| format!("Bearer {}", api_key));
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut model = Self {
            client,
            model_id: model_id.into(),
            auth_header,
            base_url,
            dimension: 0,
        };

        let probe = model.request_embedding(PROBE_TEXT).await?;
        if probe.is_empty() {
            return Err(DomainError::provider(
                &model.model_id,
                "Probe embedding returned an empty vector",
            ));
        }
        model.dimension = probe.len() as u64;

        tracing::info!(
            model_id = %model.model_id,
            dimension = model.dimension,
            base_url = %model.base_url,
            "Connected embedding model"
        );

        Ok(model)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let request = EmbeddingRequest::new(&self.model_id, text);
        let body = serde_json::to_value(&request).map_err(|e| {
            DomainError::internal(format!("Failed to serialize embedding request: {}", e))
        })?;

        let json = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        let response: EmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(
                &self.model_id,
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        response.into_first_vector().ok_or_else(|| {
            DomainError::provider(&self.model_id, "Embedding response contained no data")
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingModel for OpenAiEmbeddingModel<C> {
    fn id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> u64 {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let vector = self.request_embedding(text).await?;

        if vector.len() as u64 != self.dimension {
            return Err(DomainError::provider(
                &self.model_id,
                format!(
                    "Embedding has {} dimensions, expected {}",
                    vector.len(),
                    self.dimension
                ),
            ));
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::embedding::{HttpClient, MockHttpClient};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "http://xinference:9997/v1/embeddings";

    fn create_mock_response(dimensions: usize) -> serde_json::Value {
        let embedding: Vec<f32> = (0..dimensions).map(|j| j as f32 * 0.001).collect();
        serde_json::json!({
            "object": "list",
            "model": "bge-m3",
            "data": [{"index": 0, "embedding": embedding, "object": "embedding"}],
            "usage": {"prompt_tokens": 1, "total_tokens": 1}
        })
    }

    #[tokio::test]
    async fn test_connect_probes_dimension() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(1024));

        let model = OpenAiEmbeddingModel::connect(client, "http://xinference:9997/", "", "bge-m3")
            .await
            .unwrap();

        assert_eq!(model.id(), "bge-m3");
        assert_eq!(model.dimension(), 1024);
        assert_eq!(model.client.calls(), 1);
        assert_eq!(model.client.bodies()[0]["input"], PROBE_TEXT);
        assert_eq!(model.client.bodies()[0]["model"], "bge-m3");
    }

    #[tokio::test]
    async fn test_connect_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "connection refused");

        let result =
            OpenAiEmbeddingModel::connect(client, "http://xinference:9997", "", "bge-m3").await;

        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_probe() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(0));

        let result =
            OpenAiEmbeddingModel::connect(client, "http://xinference:9997", "", "bge-m3").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_embed_after_connect() {
        let client = MockHttpClient::new().with_response(TEST_URL, create_mock_response(8));
        let model = OpenAiEmbeddingModel::connect(client, "http://xinference:9997", "", "bge-m3")
            .await
            .unwrap();

        let vector = model.embed("What is ownership?").await.unwrap();

        assert_eq!(vector.len(), 8);
        assert_eq!(model.client.calls(), 2);
        assert_eq!(model.client.bodies()[1]["input"], "What is ownership?");
    }

    #[tokio::test]
    async fn test_connect_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": "Hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(create_mock_response(16)))
            .expect(1)
            .mount(&server)
            .await;

        let model = OpenAiEmbeddingModel::connect(
            HttpClient::new(),
            server.uri(),
            "test-key",
            "text-embedding-3-small",
        )
        .await
        .unwrap();

        assert_eq!(model.dimension(), 16);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = OpenAiEmbeddingModel::connect(HttpClient::new(), server.uri(), "", "missing")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("404"));
    }
}
