//! Embedding model implementations

mod http_client;
mod openai;
mod registry;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiEmbeddingModel;
pub use registry::EmbeddingRegistry;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
