//! Embedding model registry - maps model ids to connected models

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::embedding::EmbeddingModel;
use crate::domain::DomainError;

/// Registry of embedding models by id
///
/// Bindings are write-once: a registered id cannot be rebound.
#[derive(Debug, Default)]
pub struct EmbeddingRegistry {
    models: RwLock<HashMap<String, Arc<dyn EmbeddingModel>>>,
}

impl EmbeddingRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a model id to a model
    pub async fn register(
        &self,
        model_id: impl Into<String>,
        model: Arc<dyn EmbeddingModel>,
    ) -> Result<(), DomainError> {
        let model_id = model_id.into();
        let mut models = self.models.write().await;

        if models.contains_key(&model_id) {
            return Err(DomainError::model_already_registered(model_id));
        }

        tracing::debug!(model_id = %model_id, dimension = model.dimension(), "Registered embedding model");
        models.insert(model_id, model);
        Ok(())
    }

    /// Get the model bound to an id
    pub async fn lookup(&self, model_id: &str) -> Result<Arc<dyn EmbeddingModel>, DomainError> {
        self.models
            .read()
            .await
            .get(model_id)
            .cloned()
            .ok_or_else(|| DomainError::model_not_found(model_id))
    }

    /// Snapshot of every binding; later registrations do not show up in it
    pub async fn list_all(&self) -> HashMap<String, Arc<dyn EmbeddingModel>> {
        self.models.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.models.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.models.read().await.is_empty()
    }

    /// Drop every binding
    pub async fn clear(&self) {
        self.models.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingModel;

    fn model(id: &str, dimension: u64) -> Arc<dyn EmbeddingModel> {
        Arc::new(MockEmbeddingModel::new(id, dimension))
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = EmbeddingRegistry::new();
        registry.register("bge-m3", model("bge-m3", 1024)).await.unwrap();

        let found = registry.lookup("bge-m3").await.unwrap();
        assert_eq!(found.dimension(), 1024);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let registry = EmbeddingRegistry::new();
        registry.register("bge-m3", model("bge-m3", 1024)).await.unwrap();

        let err = registry
            .register("bge-m3", model("bge-m3", 768))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::ModelAlreadyRegistered { .. }));
        assert_eq!(registry.lookup("bge-m3").await.unwrap().dimension(), 1024);
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let registry = EmbeddingRegistry::new();

        let err = registry.lookup("unknown").await.unwrap_err();

        match err {
            DomainError::ModelNotFound { model_id, kb_id } => {
                assert_eq!(model_id, "unknown");
                assert!(kb_id.is_none());
            }
            other => panic!("Expected ModelNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_all_is_a_snapshot() {
        let registry = EmbeddingRegistry::new();
        registry.register("a", model("a", 4)).await.unwrap();

        let snapshot = registry.list_all().await;
        registry.register("b", model("b", 4)).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("a"));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let registry = EmbeddingRegistry::new();
        registry.register("a", model("a", 4)).await.unwrap();

        registry.clear().await;

        assert!(registry.is_empty().await);
        assert!(registry.register("a", model("a", 4)).await.is_ok());
    }
}
