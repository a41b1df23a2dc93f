//! PDF processor
//!
//! Core logic for the PDF pipeline: download, extraction, chunking and
//! chunk embedding, tracked as a `pdf` processing job.

use futures::stream::{self, StreamExt};
use scriptorium_common::blob::BlobStore;
use scriptorium_common::embeddings::Embedder;
use scriptorium_common::errors::{AppError, Result};
use scriptorium_common::metrics;
use scriptorium_common::models::{ArticleUpdate, EmbeddingKey, JobKind, JobOutcome};
use scriptorium_common::Store;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::chunker::{chunk_text, ChunkingConfig, TextChunk};
use crate::errors::IngestionError;
use crate::pdf::extract_text;

/// Per-chunk embedding tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddingReport {
    pub embedded: usize,
    pub failed: usize,
}

/// PDF pipeline processor
pub struct PdfProcessor {
    store: Store,
    blobs: Arc<dyn BlobStore>,
    embedder: Arc<dyn Embedder>,
    chunking_config: ChunkingConfig,
    concurrency: usize,
}

impl PdfProcessor {
    pub fn new(
        store: Store,
        blobs: Arc<dyn BlobStore>,
        embedder: Arc<dyn Embedder>,
        chunking_config: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            embedder,
            chunking_config,
            concurrency: 4,
        }
    }

    /// Number of chunks embedded at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run the PDF pipeline for an article.
    ///
    /// The article must exist and carry a PDF; both are checked before a job
    /// is created. Pipeline failures are recorded on the job, not returned.
    #[instrument(skip(self))]
    pub async fn process_pdf(&self, article_id: Uuid) -> Result<JobOutcome> {
        let article = self.store.get_article(article_id).await?;
        let pdf_key = article
            .pdf_key
            .ok_or(IngestionError::MissingPdf { article_id })?;

        info!(pdf_key = %pdf_key, "Processing PDF");

        self.store
            .run_job(JobKind::Pdf, |job_id| async move {
                self.ingest(article_id, &pdf_key, job_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    async fn ingest(
        &self,
        article_id: Uuid,
        pdf_key: &str,
        job_id: Uuid,
    ) -> std::result::Result<serde_json::Value, IngestionError> {
        let bytes = self.blobs.get(pdf_key).await?;

        // lopdf parsing is CPU bound
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes)).await??;
        info!(job_id = %job_id, text_length = text.len(), "Text extracted");

        self.store
            .update_article(
                article_id,
                ArticleUpdate {
                    pdf_text: Some(text.clone()),
                    ..ArticleUpdate::default()
                },
            )
            .await?;

        let chunks = chunk_text(&text, &self.chunking_config)?;
        let report = self.generate_embeddings(article_id, &chunks).await?;

        info!(
            job_id = %job_id,
            chunks = chunks.len(),
            embedded = report.embedded,
            failed = report.failed,
            "PDF processed"
        );

        Ok(serde_json::json!({
            "text_length": text.len(),
            "chunks": chunks.len(),
            "chunks_embedded": report.embedded,
            "chunks_failed": report.failed,
        }))
    }

    /// Embed every chunk and store the vectors under the article's keys.
    ///
    /// A chunk that fails to embed is logged and counted; the rest still land.
    /// An article deleted mid-run fails the whole batch.
    pub async fn generate_embeddings(
        &self,
        article_id: Uuid,
        chunks: &[TextChunk],
    ) -> Result<EmbeddingReport> {
        let results: Vec<_> = stream::iter(chunks.iter().cloned())
            .map(|chunk| {
                let embedder = Arc::clone(&self.embedder);
                async move {
                    let result = embedder.embed(&chunk.content).await;
                    (chunk, result)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = EmbeddingReport::default();
        for (chunk, result) in results {
            match result {
                Ok(vector) => {
                    let key = EmbeddingKey::article_chunk(article_id, chunk.index);
                    self.store.store_embedding(key, vector, chunk.content).await?;
                    report.embedded += 1;
                }
                Err(e) => {
                    warn!(
                        article_id = %article_id,
                        chunk = chunk.index,
                        error = %e,
                        "Failed to embed chunk, skipping"
                    );
                    report.failed += 1;
                }
            }
        }

        metrics::record_chunks_embedded(report.embedded);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tests::sample_pdf;
    use async_trait::async_trait;
    use scriptorium_common::blob::MemoryBlobStore;
    use scriptorium_common::embeddings::MockEmbedder;
    use scriptorium_common::models::{JobStatus, NewArticle};

    /// Fails on any text containing "poison"
    struct FailingEmbedder(MockEmbedder);

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(AppError::EmbeddingError { message: "rejected".into() });
            }
            self.0.embed(text).await
        }

        fn model_name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }
    }

    /// Deletes its target article on the first call, then embeds normally
    struct DeletingEmbedder {
        inner: MockEmbedder,
        store: Store,
        target: std::sync::Mutex<Option<Uuid>>,
    }

    #[async_trait]
    impl Embedder for DeletingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let target = self.target.lock().unwrap().take();
            if let Some(id) = target {
                self.store.delete_article(id).await?;
            }
            self.inner.embed(text).await
        }

        fn model_name(&self) -> &str {
            "deleting"
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    async fn setup(embedder: Arc<dyn Embedder>) -> (PdfProcessor, Store, MemoryBlobStore) {
        let store = Store::new();
        let blobs = MemoryBlobStore::new();
        let processor = PdfProcessor::new(
            store.clone(),
            Arc::new(blobs.clone()),
            embedder,
            ChunkingConfig {
                chunk_size: 40,
                chunk_overlap: 0,
            },
        );
        (processor, store, blobs)
    }

    async fn article_with_pdf(store: &Store, blobs: &MemoryBlobStore, pdf: Vec<u8>) -> Uuid {
        let locator = blobs.put("pdfs/test.pdf", pdf, "application/pdf").await.unwrap();
        store
            .create_article(NewArticle {
                title: "Paper".into(),
                url: None,
                pdf_key: Some(locator),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_pipeline_extracts_and_embeds() {
        let (processor, store, blobs) = setup(Arc::new(MockEmbedder::new(32))).await;
        let pdf = sample_pdf(&["Graph neural networks for molecules", "Results and discussion"]);
        let article_id = article_with_pdf(&store, &blobs, pdf).await;

        let outcome = processor.process_pdf(article_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);

        let result = outcome.result.unwrap();
        let chunks = result["chunks"].as_u64().unwrap() as usize;
        assert!(chunks >= 1);
        assert_eq!(result["chunks_embedded"].as_u64().unwrap() as usize, chunks);
        assert_eq!(result["chunks_failed"], 0);

        let article = store.get_article(article_id).await.unwrap();
        assert!(article.pdf_text.unwrap().contains("Graph neural networks"));
        assert_eq!(store.embedding_count().await, chunks);
        assert!(store
            .get_embedding(&EmbeddingKey::article_chunk(article_id, 0))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_missing_article_and_missing_pdf() {
        let (processor, store, _) = setup(Arc::new(MockEmbedder::new(8))).await;

        let err = tokio_test::assert_err!(processor.process_pdf(Uuid::now_v7()).await);
        assert!(matches!(err, AppError::ArticleNotFound { .. }));

        let article = store.create_article(NewArticle::titled("No PDF")).await.unwrap();
        let err = processor.process_pdf(article.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_fails_job() {
        let (processor, store, blobs) = setup(Arc::new(MockEmbedder::new(8))).await;
        let article_id = article_with_pdf(&store, &blobs, b"not a pdf".to_vec()).await;

        let outcome = processor.process_pdf(article_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.error.unwrap().contains("PDF"));

        let job = store.get_job(outcome.job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(store.get_article(article_id).await.unwrap().pdf_text.is_none());
    }

    #[tokio::test]
    async fn test_failed_chunks_are_counted_not_fatal() {
        let embedder = Arc::new(FailingEmbedder(MockEmbedder::new(8)));
        let (processor, store, _) = setup(embedder).await;
        let article = store.create_article(NewArticle::titled("Mixed")).await.unwrap();

        let chunks = vec![
            TextChunk { content: "healthy chunk".into(), index: 0, start_pos: 0, end_pos: 13 },
            TextChunk { content: "poison chunk".into(), index: 1, start_pos: 14, end_pos: 26 },
            TextChunk { content: "another healthy".into(), index: 2, start_pos: 27, end_pos: 42 },
        ];

        let report = processor.generate_embeddings(article.id, &chunks).await.unwrap();
        assert_eq!(report, EmbeddingReport { embedded: 2, failed: 1 });
        assert!(store
            .get_embedding(&EmbeddingKey::article_chunk(article.id, 1))
            .await
            .is_none());
        assert!(store
            .get_embedding(&EmbeddingKey::article_chunk(article.id, 2))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_pipeline_runs_on_spawned_task() {
        let (processor, store, blobs) = setup(Arc::new(MockEmbedder::new(16))).await;
        let pdf = sample_pdf(&["Sparse attention", "Long context benchmarks"]);
        let article_id = article_with_pdf(&store, &blobs, pdf).await;

        let processor = Arc::new(processor);
        let handle = tokio::spawn({
            let processor = Arc::clone(&processor);
            async move { processor.process_pdf(article_id).await }
        });

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert!(store.embedding_count().await >= 1);
    }

    #[tokio::test]
    async fn test_article_deleted_mid_run_leaves_no_embeddings() {
        let store = Store::new();
        let blobs = MemoryBlobStore::new();
        let embedder = Arc::new(DeletingEmbedder {
            inner: MockEmbedder::new(8),
            store: store.clone(),
            target: std::sync::Mutex::new(None),
        });
        let processor = PdfProcessor::new(
            store.clone(),
            Arc::new(blobs.clone()),
            embedder.clone(),
            ChunkingConfig {
                chunk_size: 40,
                chunk_overlap: 0,
            },
        );

        let pdf = sample_pdf(&["First page of findings", "Second page of findings"]);
        let article_id = article_with_pdf(&store, &blobs, pdf).await;
        *embedder.target.lock().unwrap() = Some(article_id);

        let outcome = processor.process_pdf(article_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(store.get_article(article_id).await.is_err());
        assert_eq!(store.embedding_count().await, 0);
    }
}
