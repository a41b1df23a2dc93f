//! Scriptorium audio transcription
//!
//! Speech-to-text engines behind [`TranscriptionEngine`] and the audio
//! pipeline that records transcripts on comments and messages.

pub mod engine;
pub mod errors;
pub mod processor;

pub use engine::{create_engine, MockTranscriptionEngine, OpenAiWhisperEngine, TranscriptionEngine};
pub use errors::TranscriptionError;
pub use processor::AudioProcessor;
