//! Retrieval modes
//!
//! - Semantic: embed the query and scan every stored chunk vector
//! - Keyword: case-insensitive substring match over articles and messages
//! - Title: case-insensitive substring match over article titles

mod keyword;
mod vector;

pub use keyword::{keyword_search, title_search, KeywordResults};
pub use vector::{ContextKind, RagResponse, RagService, RetrievedContext};

/// Results returned when the caller gives no limit
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound on any requested limit
pub const MAX_LIMIT: usize = 100;

/// Apply the default and clamp into `1..=MAX_LIMIT`
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}
