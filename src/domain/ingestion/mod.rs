//! Document ingestion domain types and traits
//!
//! Ingestion stores already-chunked documents. Splitting raw files into
//! chunks happens upstream of this crate.

pub mod loader;
pub mod pipeline;

pub use loader::{DocumentLoader, DocumentStream};
pub use pipeline::{IngestionReport, IngestionRequest};
