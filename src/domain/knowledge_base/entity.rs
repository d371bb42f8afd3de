//! Knowledge base identifier

use serde::{Deserialize, Serialize};

use super::validation::{
    split_knowledge_base_id, KnowledgeBaseValidationError, KB_ID_SEPARATOR,
};

/// Composite knowledge base identifier - `{name};{embedding_model_id}`
///
/// The id binds a named collection to the embedding model used to vectorize
/// its payloads. It is split at the first separator, so the model part may
/// itself contain `;`. The full id string doubles as the collection name in
/// the vector store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KnowledgeBaseId {
    id: String,
    separator_at: usize,
}

impl KnowledgeBaseId {
    /// Parse a composite id
    pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let id = id.into();
        let (name, _) = split_knowledge_base_id(&id)?;
        let separator_at = name.len();
        Ok(Self { id, separator_at })
    }

    /// Build an id from its name and embedding model id
    pub fn from_parts(
        name: impl AsRef<str>,
        embedding_model_id: impl AsRef<str>,
    ) -> Result<Self, KnowledgeBaseValidationError> {
        Self::new(format!(
            "{}{}{}",
            name.as_ref(),
            KB_ID_SEPARATOR,
            embedding_model_id.as_ref()
        ))
    }

    /// Get the full id string
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Knowledge base name
    pub fn name(&self) -> &str {
        &self.id[..self.separator_at]
    }

    /// Embedding model id bound to this knowledge base
    pub fn embedding_model_id(&self) -> &str {
        &self.id[self.separator_at + KB_ID_SEPARATOR.len_utf8()..]
    }

    /// Name of the backing vector store collection
    pub fn collection_name(&self) -> &str {
        &self.id
    }
}

impl TryFrom<String> for KnowledgeBaseId {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for KnowledgeBaseId {
    type Err = KnowledgeBaseValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<KnowledgeBaseId> for String {
    fn from(id: KnowledgeBaseId) -> Self {
        id.id
    }
}

impl std::fmt::Display for KnowledgeBaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
