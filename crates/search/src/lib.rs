//! Scriptorium search
//!
//! Semantic retrieval over stored chunk embeddings plus plain substring
//! search over articles and messages.

pub mod retrieval;

pub use retrieval::{
    clamp_limit, keyword_search, title_search, ContextKind, KeywordResults, RagResponse, RagService,
    RetrievedContext, DEFAULT_LIMIT, MAX_LIMIT,
};
