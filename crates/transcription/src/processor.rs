//! Audio pipeline
//!
//! Lenient transcription for fresh uploads, and a tracked `audio` job that
//! transcribes a message's stored audio.

use scriptorium_common::blob::BlobStore;
use scriptorium_common::errors::{AppError, Result};
use scriptorium_common::metrics;
use scriptorium_common::models::{JobKind, JobOutcome, MessageUpdate};
use scriptorium_common::Store;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::engine::TranscriptionEngine;
use crate::errors::TranscriptionError;

pub struct AudioProcessor {
    store: Store,
    blobs: Arc<dyn BlobStore>,
    engine: Arc<dyn TranscriptionEngine>,
}

impl AudioProcessor {
    pub fn new(store: Store, blobs: Arc<dyn BlobStore>, engine: Arc<dyn TranscriptionEngine>) -> Self {
        Self { store, blobs, engine }
    }

    /// Transcribe freshly uploaded audio; failures are logged and yield `None`
    pub async fn transcribe_upload(&self, audio_data: &[u8], file_name: &str) -> Option<String> {
        match self.engine.transcribe(audio_data, file_name).await {
            Ok(transcript) => {
                metrics::record_transcription(self.engine.name(), true);
                Some(transcript)
            }
            Err(e) => {
                metrics::record_transcription(self.engine.name(), false);
                warn!(file_name = %file_name, engine = self.engine.name(), error = %e, "Transcription failed, continuing without transcript");
                None
            }
        }
    }

    /// Transcribe a message's stored audio as an `audio` job.
    ///
    /// The message must exist and carry audio; both are checked before a job
    /// is created.
    #[instrument(skip(self))]
    pub async fn process_message_audio(&self, message_id: Uuid) -> Result<JobOutcome> {
        let message = self.store.get_message(message_id).await?;
        let audio_key = message
            .audio_key
            .ok_or(TranscriptionError::MissingAudio { message_id })?;

        self.store
            .run_job(JobKind::Audio, |job_id| async move {
                self.transcribe_message(message_id, &audio_key, job_id)
                    .await
                    .map_err(AppError::from)
            })
            .await
    }

    async fn transcribe_message(
        &self,
        message_id: Uuid,
        audio_key: &str,
        job_id: Uuid,
    ) -> std::result::Result<serde_json::Value, TranscriptionError> {
        let audio = self.blobs.get(audio_key).await?;
        let file_name = audio_key.rsplit('/').next().unwrap_or(audio_key);

        let transcription = match self.engine.transcribe(&audio, file_name).await {
            Ok(text) => {
                metrics::record_transcription(self.engine.name(), true);
                text
            }
            Err(e) => {
                metrics::record_transcription(self.engine.name(), false);
                return Err(e);
            }
        };

        self.store
            .update_message(
                message_id,
                MessageUpdate {
                    audio_transcription: Some(transcription.clone()),
                    ..MessageUpdate::default()
                },
            )
            .await?;

        info!(job_id = %job_id, chars = transcription.len(), "Message audio transcribed");
        Ok(serde_json::json!({ "transcription": transcription }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockTranscriptionEngine;
    use scriptorium_common::blob::MemoryBlobStore;
    use scriptorium_common::models::{JobStatus, NewMessage};

    fn processor(engine: MockTranscriptionEngine) -> (AudioProcessor, Store, MemoryBlobStore) {
        let store = Store::new();
        let blobs = MemoryBlobStore::new();
        let processor = AudioProcessor::new(store.clone(), Arc::new(blobs.clone()), Arc::new(engine));
        (processor, store, blobs)
    }

    async fn message_with_audio(store: &Store, blobs: &MemoryBlobStore) -> Uuid {
        let locator = blobs
            .put("audio/messages/voice.wav", b"RIFF....WAVE".to_vec(), "audio/wav")
            .await
            .unwrap();
        let dialog = store.create_dialog("Voice").await.unwrap();
        store
            .create_message(
                dialog.id,
                NewMessage {
                    audio_key: Some(locator),
                    ..NewMessage::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_transcribe_upload_is_lenient() {
        let (ok, _, _) = processor(MockTranscriptionEngine::new("a spoken note"));
        assert_eq!(ok.transcribe_upload(b"abc", "n.mp3").await.as_deref(), Some("a spoken note"));

        let (failing, _, _) = processor(MockTranscriptionEngine::failing());
        assert!(failing.transcribe_upload(b"abc", "n.mp3").await.is_none());
    }

    #[tokio::test]
    async fn test_message_audio_job_records_transcript() {
        let (processor, store, blobs) = processor(MockTranscriptionEngine::new("meeting notes"));
        let message_id = message_with_audio(&store, &blobs).await;

        let outcome = processor.process_message_audio(message_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.result.unwrap()["transcription"], "meeting notes");

        let message = store.get_message(message_id).await.unwrap();
        assert_eq!(message.audio_transcription.as_deref(), Some("meeting notes"));
    }

    #[tokio::test]
    async fn test_engine_failure_fails_job() {
        let (processor, store, blobs) = processor(MockTranscriptionEngine::failing());
        let message_id = message_with_audio(&store, &blobs).await;

        let outcome = processor.process_message_audio(message_id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(store.get_message(message_id).await.unwrap().audio_transcription.is_none());
    }

    #[tokio::test]
    async fn test_preconditions_checked_before_job() {
        let (processor, store, _) = processor(MockTranscriptionEngine::new("x"));

        let err = processor.process_message_audio(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::MessageNotFound { .. }));

        let dialog = store.create_dialog("Text only").await.unwrap();
        let message = store.create_message(dialog.id, NewMessage::text("hi")).await.unwrap();
        let err = processor.process_message_audio(message.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_missing_audio_object_fails_job() {
        let (processor, store, _) = processor(MockTranscriptionEngine::new("x"));
        let dialog = store.create_dialog("Dangling").await.unwrap();
        let message = store
            .create_message(
                dialog.id,
                NewMessage {
                    audio_key: Some("memory://audio/messages/missing.wav".into()),
                    ..NewMessage::default()
                },
            )
            .await
            .unwrap();

        let outcome = processor.process_message_audio(message.id).await.unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.error.unwrap().contains("File not found"));
    }
}
