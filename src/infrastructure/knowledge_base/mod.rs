//! Knowledge base and vector store implementations

mod doc_retriever;
mod factory;
mod in_memory;
mod qdrant;
mod registry;
mod vector_kb;

pub use doc_retriever::{DocRetriever, RetrievalSettings, DEFAULT_OVERSAMPLE_FACTOR};
pub use factory::VectorStoreFactory;
pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;
pub use registry::KnowledgeBaseRegistry;
pub use vector_kb::{ModelBinding, VectorKnowledgeBase, INDEXED_METADATA_KEYS};
