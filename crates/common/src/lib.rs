//! Scriptorium Common Library
//!
//! Shared code for all Scriptorium crates including:
//! - Entity models (articles, comments, citations, dialogs, messages, jobs)
//! - The in-memory store with cascading deletes and job bookkeeping
//! - Object storage abstraction (S3 or in-memory)
//! - Embedding client abstraction
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod blob;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use blob::BlobStore;
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use store::Store;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
