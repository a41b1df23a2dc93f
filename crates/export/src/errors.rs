//! Export error types

use scriptorium_common::errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write document: {0}")]
    Docx(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::App(inner) => inner,
            other => AppError::Internal {
                message: other.to_string(),
            },
        }
    }
}
