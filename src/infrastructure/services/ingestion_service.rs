//! Document ingestion service for knowledge bases

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::context::KnowledgeContext;
use crate::domain::ingestion::{DocumentLoader, IngestionReport, IngestionRequest};

/// Streams loader output into a knowledge base, one chunk at a time
#[derive(Debug, Clone)]
pub struct IngestionService {
    context: Arc<KnowledgeContext>,
}

impl IngestionService {
    pub fn new(context: Arc<KnowledgeContext>) -> Self {
        Self { context }
    }

    /// Run ingestion on a detached task
    ///
    /// The caller may drop the handle; the outcome is logged either way.
    pub fn spawn_ingest(
        &self,
        request: IngestionRequest,
        loader: Arc<dyn DocumentLoader>,
    ) -> JoinHandle<IngestionReport> {
        let service = self.clone();
        tokio::spawn(async move { service.ingest(request, loader.as_ref()).await })
    }

    /// Add every streamed chunk, stamped with the request's file id
    ///
    /// Chunks are added in stream order. The first failure stops the run;
    /// chunks stored before it are kept.
    pub async fn ingest(
        &self,
        request: IngestionRequest,
        loader: &dyn DocumentLoader,
    ) -> IngestionReport {
        let mut report = IngestionReport::new(&request);

        tracing::info!(
            kb_id = %request.kb_id,
            file_id = %request.file_id,
            loader = loader.name(),
            "Starting ingestion"
        );

        let kb = self
            .context
            .knowledge_bases()
            .get_or_create(&request.kb_id)
            .await;

        let mut stream = match loader.load().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(kb_id = %request.kb_id, file_id = %request.file_id, error = %e, "Failed to open loader");
                report.fail(e.to_string());
                return report;
            }
        };

        while let Some(item) = stream.next().await {
            let mut document = match item {
                Ok(document) => document,
                Err(e) => {
                    tracing::error!(kb_id = %request.kb_id, file_id = %request.file_id, error = %e, "Failed to load chunk");
                    report.fail(e.to_string());
                    break;
                }
            };

            document.set_file_id(&request.file_id);
            if let Some(filename) = &request.filename {
                document.set_doc_filename(filename);
            }

            if let Err(e) = kb.add(document).await {
                tracing::error!(
                    kb_id = %request.kb_id,
                    file_id = %request.file_id,
                    chunks_added = report.chunks_added,
                    error = %e,
                    "Failed to add chunk"
                );
                report.fail(e.to_string());
                break;
            }
            report.chunks_added += 1;
        }

        if report.is_success() {
            tracing::info!(
                kb_id = %request.kb_id,
                file_id = %request.file_id,
                chunks_added = report.chunks_added,
                "Ingestion completed"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{EmbeddingModel, MockEmbeddingModel};
    use crate::domain::ingestion::loader::mock::VecDocumentLoader;
    use crate::domain::knowledge_base::{Document, FilterCondition, KnowledgeBaseId};
    use crate::infrastructure::embedding::EmbeddingRegistry;
    use crate::infrastructure::ingestion::JsonLinesLoader;
    use crate::infrastructure::knowledge_base::{InMemoryVectorStore, RetrievalSettings};
    use std::io::Write;

    async fn context() -> Arc<KnowledgeContext> {
        let embeddings = Arc::new(EmbeddingRegistry::new());
        let model: Arc<dyn EmbeddingModel> = Arc::new(MockEmbeddingModel::new("mock", 16));
        embeddings.register("mock", model).await.unwrap();

        Arc::new(KnowledgeContext::new(
            embeddings,
            Arc::new(InMemoryVectorStore::new()),
            RetrievalSettings::default(),
        ))
    }

    fn request(kb: &str) -> IngestionRequest {
        IngestionRequest::new(KnowledgeBaseId::new(kb).unwrap(), "F1").with_filename("guide.md")
    }

    #[tokio::test]
    async fn test_ingest_stamps_file_metadata() {
        let context = context().await;
        let service = IngestionService::new(context.clone());
        let loader = VecDocumentLoader::new(vec![
            Document::new("first").with_file_id("overwritten"),
            Document::new("second"),
        ]);

        let report = service.ingest(request("guide;mock"), &loader).await;

        assert!(report.is_success());
        assert_eq!(report.chunks_added, 2);

        let kb = context.knowledge_base("guide;mock").await.unwrap();
        let docs = kb
            .filter_by(Some(FilterCondition::new().with("file_id", "F1")), 10, 0)
            .await
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.doc_filename() == Some("guide.md")));
    }

    #[tokio::test]
    async fn test_ingest_stops_at_first_failure() {
        let context = context().await;
        let service = IngestionService::new(context.clone());
        let loader = VecDocumentLoader::new(vec![Document::new("kept")])
            .with_failure("corrupt chunk")
            .with_document(Document::new("never stored"));

        let report = service.ingest(request("guide;mock"), &loader).await;

        assert_eq!(report.chunks_added, 1);
        assert!(report.error.unwrap().contains("corrupt chunk"));

        let kb = context.knowledge_base("guide;mock").await.unwrap();
        assert_eq!(kb.filter_by(None, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_unknown_model_fails_on_first_chunk() {
        let service = IngestionService::new(context().await);
        let loader = VecDocumentLoader::new(vec![Document::new("a")]);

        let report = service.ingest(request("guide;missing"), &loader).await;

        assert_eq!(report.chunks_added, 0);
        assert!(report.error.unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_spawn_ingest_from_jsonl() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"page_content": "Part one", "metadata": {{"parent_id": "P", "order_index": 0}}}}"#).unwrap();
        writeln!(file, r#"{{"page_content": "Part two", "metadata": {{"parent_id": "P", "order_index": 1}}}}"#).unwrap();

        let context = context().await;
        let service = IngestionService::new(context.clone());
        let loader: Arc<dyn DocumentLoader> = Arc::new(JsonLinesLoader::new(file.path()));

        let report = service
            .spawn_ingest(request("guide;mock"), loader)
            .await
            .unwrap();

        assert_eq!(report.chunks_added, 2);

        let retriever = context.retriever("guide;mock").await.unwrap();
        let docs = retriever.retrieve("Part two", None, 1).await.unwrap();
        assert_eq!(docs[0].page_content, "Part one\ntwo");
        assert_eq!(docs[0].file_id(), Some("F1"));
    }
}
