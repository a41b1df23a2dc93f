//! Ingestion pipeline error types

use scriptorium_common::errors::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error: {message}")]
    PdfParse { message: String },

    #[error("No text content extracted from PDF")]
    NoText,

    #[error("Chunking error: {0}")]
    Chunking(String),

    #[error("Article {article_id} has no PDF")]
    MissingPdf { article_id: Uuid },

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::App(inner) => inner,
            IngestionError::MissingPdf { .. } => AppError::Validation {
                message: "Article has no PDF".to_string(),
                field: Some("pdf_key".to_string()),
            },
            IngestionError::PdfParse { .. } | IngestionError::NoText => AppError::InvalidFormat {
                message: e.to_string(),
            },
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}
