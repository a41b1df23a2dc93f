//! Export pipeline
//!
//! Lays out the selected articles and dialog as a Word document, tracked as
//! an `export` job.

use scriptorium_common::blob::{keys, BlobStore};
use scriptorium_common::errors::{AppError, Result};
use scriptorium_common::models::{JobKind, JobOutcome};
use scriptorium_common::Store;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::docx::{DocxBuilder, DOCX_CONTENT_TYPE};
use crate::errors::ExportError;

pub const DEFAULT_EXPORT_TITLE: &str = "Research Summary";

/// Characters of extracted PDF text quoted per article
const PDF_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRequest {
    pub title: Option<String>,
    pub dialog_id: Option<Uuid>,
    pub article_ids: Option<Vec<Uuid>>,
}

pub struct ExportProcessor {
    store: Store,
    blobs: Arc<dyn BlobStore>,
    url_ttl: Duration,
}

impl ExportProcessor {
    pub fn new(store: Store, blobs: Arc<dyn BlobStore>, url_ttl: Duration) -> Self {
        Self { store, blobs, url_ttl }
    }

    /// Render, upload and link the document as an `export` job.
    ///
    /// Unknown article or dialog ids are skipped rather than failing the job.
    #[instrument(skip(self, request), fields(dialog_id = ?request.dialog_id))]
    pub async fn generate_document(&self, request: ExportRequest) -> Result<JobOutcome> {
        self.store
            .run_job(JobKind::Export, |job_id| async move {
                self.export(request, job_id).await.map_err(AppError::from)
            })
            .await
    }

    async fn export(
        &self,
        request: ExportRequest,
        job_id: Uuid,
    ) -> std::result::Result<serde_json::Value, ExportError> {
        let builder = self.layout(&request).await?;
        let bytes = builder.build()?;
        let size = bytes.len();

        let document_key = self
            .blobs
            .put(&keys::export(job_id), bytes, DOCX_CONTENT_TYPE)
            .await?;
        let download_url = self.blobs.url(&document_key, self.url_ttl).await?;

        info!(job_id = %job_id, document_key = %document_key, size, "Export document uploaded");
        Ok(serde_json::json!({
            "document_key": document_key,
            "download_url": download_url,
        }))
    }

    async fn layout(&self, request: &ExportRequest) -> Result<DocxBuilder> {
        let mut doc = DocxBuilder::new();
        let title = request
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_EXPORT_TITLE);
        doc.heading(title, 0);

        if let Some(article_ids) = request.article_ids.as_ref().filter(|ids| !ids.is_empty()) {
            doc.heading("Articles", 1);
            for id in article_ids {
                let article = match self.store.get_article(*id).await {
                    Ok(article) => article,
                    Err(AppError::ArticleNotFound { .. }) => {
                        debug!(article_id = %id, "Skipping unknown article");
                        continue;
                    }
                    Err(e) => return Err(e),
                };

                doc.heading(&article.title, 2);
                if let Some(url) = &article.url {
                    doc.paragraph(format!("URL: {}", url));
                }
                if let Some(text) = &article.pdf_text {
                    let preview: String = text.chars().take(PDF_PREVIEW_CHARS).collect();
                    doc.paragraph(format!("{}...", preview));
                }

                if !article.comments.is_empty() {
                    doc.heading("Comments:", 3);
                    for comment in &article.comments {
                        if let Some(text) = &comment.text {
                            doc.paragraph(text);
                        }
                        if let Some(transcript) = &comment.audio_transcription {
                            doc.paragraph(format!("[Audio transcription]: {}", transcript));
                        }
                    }
                }
            }
        }

        if let Some(dialog_id) = request.dialog_id {
            match self.store.get_dialog(dialog_id).await {
                Ok(dialog) => {
                    doc.heading(format!("Dialog: {}", dialog.title), 1);
                    for message in self.store.list_messages(dialog_id).await? {
                        if let Some(text) = &message.text {
                            doc.paragraph(text);
                        }
                        if let Some(transcript) = &message.audio_transcription {
                            doc.paragraph(format!("[Audio]: {}", transcript));
                        }
                        if !message.image_keys.is_empty() {
                            doc.paragraph(format!("[{} image(s) attached]", message.image_keys.len()));
                        }
                    }
                }
                Err(AppError::DialogNotFound { .. }) => {
                    debug!(dialog_id = %dialog_id, "Skipping unknown dialog");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(doc)
    }
}
