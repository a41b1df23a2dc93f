//! Scriptorium PDF ingestion
//!
//! Turns an uploaded PDF into searchable data:
//! 1. Downloads the PDF from object storage
//! 2. Extracts and normalises its text
//! 3. Stores the text on the article
//! 4. Chunks the text and embeds every chunk

pub mod chunker;
pub mod errors;
pub mod pdf;
pub mod processor;

pub use chunker::{chunk_text, ChunkingConfig, TextChunk};
pub use errors::IngestionError;
pub use processor::{EmbeddingReport, PdfProcessor};
