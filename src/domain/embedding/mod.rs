//! Embedding model domain models and traits

mod model;
mod request;
mod response;

pub use model::{EmbeddingModel, PROBE_TEXT};
pub use request::EmbeddingRequest;
pub use response::{cosine_similarity, EmbeddingResponse};

#[cfg(test)]
pub use model::mock::MockEmbeddingModel;
