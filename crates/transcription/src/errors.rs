//! Transcription error types

use scriptorium_common::errors::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),

    #[error("audio file is empty")]
    EmptyAudio,

    #[error("Message {message_id} has no audio")]
    MissingAudio { message_id: Uuid },

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<TranscriptionError> for AppError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::App(inner) => inner,
            TranscriptionError::MissingAudio { .. } => AppError::Validation {
                message: "Message has no audio".to_string(),
                field: Some("audio_key".to_string()),
            },
            TranscriptionError::EmptyAudio => AppError::Validation {
                message: e.to_string(),
                field: Some("audio".to_string()),
            },
            TranscriptionError::ApiRequestFailed(message) => AppError::TranscriptionError { message },
        }
    }
}
