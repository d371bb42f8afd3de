use serde::Deserialize;

use crate::domain::knowledge_base::MergeOrdering;
use crate::infrastructure::knowledge_base::{RetrievalSettings, DEFAULT_OVERSAMPLE_FACTOR};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub vector_store: VectorStoreConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreBackend {
    #[default]
    Qdrant,
    InMemory,
}

impl std::fmt::Display for VectorStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qdrant => write!(f, "qdrant"),
            Self::InMemory => write!(f, "in_memory"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorStoreBackend,
    /// gRPC endpoint of the Qdrant server
    pub url: String,
    pub api_key: Option<String>,
}

/// OpenAI-compatible embedding endpoint and the models served by it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    /// Sent as a bearer token; empty sends no `Authorization` header
    pub api_key: String,
    /// Model ids connected and registered at startup
    pub models: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub oversample_factor: usize,
    pub merge_ordering: MergeOrdering,
    /// Result count used by the CLI when none is given
    pub default_limit: usize,
    pub default_filter_limit: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::default(),
            url: "http://localhost:6334".to_string(),
            api_key: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9997".to_string(),
            api_key: String::new(),
            models: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            oversample_factor: DEFAULT_OVERSAMPLE_FACTOR,
            merge_ordering: MergeOrdering::default(),
            default_limit: 5,
            default_filter_limit: 100,
        }
    }
}

impl RetrievalConfig {
    pub fn settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            oversample_factor: self.oversample_factor,
            merge_ordering: self.merge_ordering,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::builder().build()?.try_deserialize()
    }

    /// Layered sources: `config/default`, `config/local`, then `APP__*` env vars
    ///
    /// `APP__EMBEDDING__MODELS` takes a comma separated list.
    fn builder() -> config::ConfigBuilder<config::builder::DefaultState> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("embedding.models")
                    .try_parsing(true),
            )
    }
}
