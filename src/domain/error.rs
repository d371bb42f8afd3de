use thiserror::Error;

fn for_knowledge_base(kb_id: &Option<String>) -> String {
    kb_id
        .as_ref()
        .map(|id| format!(" for knowledge base '{}'", id))
        .unwrap_or_default()
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid knowledge base id '{id}': {reason}")]
    InvalidKnowledgeBaseId { id: String, reason: String },

    #[error(
        "Embedding model '{model_id}' was not found{}, please check the model name",
        for_knowledge_base(.kb_id)
    )]
    ModelNotFound {
        model_id: String,
        kb_id: Option<String>,
    },

    #[error("Embedding model '{model_id}' is already registered")]
    ModelAlreadyRegistered { model_id: String },

    #[error(
        "Configuration mismatch for knowledge base '{kb_id}': collection dimension is {actual}, \
         embedding model dimension is {expected}"
    )]
    ConfigurationMismatch {
        kb_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Collection for knowledge base '{kb_id}' is unhealthy (status: {status})")]
    UnhealthyCollection { kb_id: String, status: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_kb_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKnowledgeBaseId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn model_not_found(model_id: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model_id: model_id.into(),
            kb_id: None,
        }
    }

    /// Model missing for an operation on a knowledge base bound to it
    pub fn model_not_bound(model_id: impl Into<String>, kb_id: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model_id: model_id.into(),
            kb_id: Some(kb_id.into()),
        }
    }

    pub fn model_already_registered(model_id: impl Into<String>) -> Self {
        Self::ModelAlreadyRegistered {
            model_id: model_id.into(),
        }
    }

    pub fn configuration_mismatch(kb_id: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::ConfigurationMismatch {
            kb_id: kb_id.into(),
            expected,
            actual,
        }
    }

    pub fn unhealthy_collection(kb_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self::UnhealthyCollection {
            kb_id: kb_id.into(),
            status: status.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means the collection must not be used any further
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMismatch { .. } | Self::UnhealthyCollection { .. }
        )
    }
}
