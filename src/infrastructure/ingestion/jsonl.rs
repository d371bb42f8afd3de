//! JSON Lines document loader

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

use crate::domain::ingestion::{DocumentLoader, DocumentStream};
use crate::domain::knowledge_base::Document;
use crate::domain::DomainError;

/// Reads one serialized [`Document`] per line
///
/// Each line is `{"page_content": "...", "metadata": {...}}`; `metadata`
/// may be omitted. Blank lines are skipped. The file is read lazily as the
/// stream is polled.
#[derive(Debug, Clone)]
pub struct JsonLinesLoader {
    path: PathBuf,
    name: String,
}

impl JsonLinesLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

#[async_trait]
impl DocumentLoader for JsonLinesLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<DocumentStream, DomainError> {
        let file = File::open(&self.path).await.map_err(|e| {
            DomainError::validation(format!("Cannot open '{}': {}", self.name, e))
        })?;

        let name = self.name.clone();
        let mut line_number = 0usize;

        let stream = LinesStream::new(BufReader::new(file).lines()).filter_map(move |line| {
            line_number += 1;
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<Document>(&line).map_err(|e| {
                    DomainError::validation(format!(
                        "Invalid document at {}:{}: {}",
                        name, line_number, e
                    ))
                })),
                Err(e) => Some(Err(DomainError::internal(format!(
                    "Failed to read {}:{}: {}",
                    name, line_number, e
                )))),
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    async fn collect(loader: &JsonLinesLoader) -> Vec<Result<Document, DomainError>> {
        loader.load().await.unwrap().collect().await
    }

    #[tokio::test]
    async fn test_reads_documents_and_skips_blank_lines() {
        let file = write_lines(&[
            r#"{"page_content": "Intro", "metadata": {"parent_id": "P", "order_index": 0}}"#,
            "",
            "   ",
            r#"{"page_content": "No metadata"}"#,
        ]);
        let loader = JsonLinesLoader::new(file.path());

        let docs: Vec<Document> = collect(&loader)
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].parent_id(), Some("P"));
        assert_eq!(docs[0].order_index(), Some(0));
        assert!(docs[1].metadata.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_line_reports_position() {
        let file = write_lines(&[r#"{"page_content": "ok"}"#, "", "not json"]);
        let loader = JsonLinesLoader::new(file.path());

        let items = collect(&loader).await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(DomainError::Validation { message }) => assert!(message.contains(":3:")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let loader = JsonLinesLoader::new("/nonexistent/chunks.jsonl");

        assert!(matches!(
            loader.load().await,
            Err(DomainError::Validation { .. })
        ));
    }
}
