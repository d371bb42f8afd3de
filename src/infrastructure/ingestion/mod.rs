//! Document loader implementations

mod jsonl;

pub use jsonl::JsonLinesLoader;
