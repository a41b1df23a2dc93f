//! Text chunking module
//!
//! Splits extracted PDF text into chunks for embedding.

use scriptorium_common::config::ChunkingSettings;
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

use crate::errors::IngestionError;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// A text chunk with its position in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    /// Index among the kept chunks; becomes the embedding key's chunk number
    pub index: usize,
    /// Byte offsets in the original text
    pub start_pos: usize,
    pub end_pos: usize,
}

/// Split text into chunks, dropping whitespace-only pieces
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<TextChunk>, IngestionError> {
    let chunk_config = ChunkConfig::new(config.chunk_size.max(1))
        .with_overlap(config.chunk_overlap)
        .map_err(|e| IngestionError::Chunking(e.to_string()))?;
    let splitter = TextSplitter::new(chunk_config);

    let chunks: Vec<TextChunk> = splitter
        .chunk_indices(text)
        .filter(|(_, chunk)| !chunk.trim().is_empty())
        .enumerate()
        .map(|(index, (start_pos, chunk))| TextChunk {
            content: chunk.to_string(),
            index,
            start_pos,
            end_pos: start_pos + chunk.len(),
        })
        .collect();

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Text chunked"
    );

    Ok(chunks)
}
