//! Knowledge base validation utilities

use std::fmt;

use crate::domain::DomainError;

/// Separator between the knowledge base name and the embedding model id
pub const KB_ID_SEPARATOR: char = ';';

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    /// ID is empty
    EmptyId,
    /// ID has no name/model separator
    MissingSeparator { id: String },
    /// Name part before the separator is empty
    EmptyName { id: String },
    /// Embedding model part after the separator is empty
    EmptyModelId { id: String },
    /// Invalid result limit
    InvalidLimit { value: usize },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Knowledge base ID cannot be empty"),
            Self::MissingSeparator { id } => write!(
                f,
                "Knowledge base ID '{}' must have the form '{{name}}{}{{embedding_model_id}}'",
                id, KB_ID_SEPARATOR
            ),
            Self::EmptyName { id } => {
                write!(f, "Knowledge base ID '{}' has an empty name", id)
            }
            Self::EmptyModelId { id } => {
                write!(f, "Knowledge base ID '{}' has an empty embedding model id", id)
            }
            Self::InvalidLimit { value } => {
                write!(f, "Invalid limit {}: must be at least 1", value)
            }
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

impl KnowledgeBaseValidationError {
    fn offending_id(&self) -> &str {
        match self {
            Self::MissingSeparator { id } | Self::EmptyName { id } | Self::EmptyModelId { id } => {
                id
            }
            Self::EmptyId | Self::InvalidLimit { .. } => "",
        }
    }
}

impl From<KnowledgeBaseValidationError> for DomainError {
    fn from(err: KnowledgeBaseValidationError) -> Self {
        match err {
            KnowledgeBaseValidationError::InvalidLimit { .. } => {
                DomainError::validation(err.to_string())
            }
            _ => DomainError::invalid_kb_id(err.offending_id(), err.to_string()),
        }
    }
}

/// Split a composite knowledge base id at the first separator
pub fn split_knowledge_base_id(id: &str) -> Result<(&str, &str), KnowledgeBaseValidationError> {
    if id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyId);
    }

    let (name, model_id) = id.split_once(KB_ID_SEPARATOR).ok_or_else(|| {
        KnowledgeBaseValidationError::MissingSeparator { id: id.to_string() }
    })?;

    if name.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyName { id: id.to_string() });
    }

    if model_id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyModelId { id: id.to_string() });
    }

    Ok((name, model_id))
}

/// Validate a composite knowledge base id
pub fn validate_knowledge_base_id(id: &str) -> Result<(), KnowledgeBaseValidationError> {
    split_knowledge_base_id(id).map(|_| ())
}

/// Validate a result limit
pub fn validate_limit(limit: usize) -> Result<(), KnowledgeBaseValidationError> {
    if limit == 0 {
        return Err(KnowledgeBaseValidationError::InvalidLimit { value: limit });
    }

    Ok(())
}
