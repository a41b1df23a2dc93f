//! Semantic retrieval over stored chunk embeddings
//!
//! Brute-force: the query vector is scored against every stored vector.

use scriptorium_common::embeddings::Embedder;
use scriptorium_common::errors::{AppError, Result};
use scriptorium_common::metrics;
use scriptorium_common::Store;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Characters of chunk text returned with each context
const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Article,
}

/// One retrieved chunk, resolved to its owning article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    pub id: Uuid,
    pub title: String,
    pub chunk: usize,
    pub score: f32,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub query: String,
    pub contexts: Vec<RetrievedContext>,
}

pub struct RagService {
    store: Store,
    embedder: Arc<dyn Embedder>,
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

impl RagService {
    pub fn new(store: Store, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Embed `query` and return the `limit` closest chunks.
    ///
    /// Hits whose article has since been deleted are dropped.
    #[instrument(skip(self))]
    pub async fn query(&self, query: &str, limit: usize) -> Result<RagResponse> {
        if query.trim().is_empty() {
            return Err(AppError::Validation {
                message: "query must not be empty".to_string(),
                field: Some("query".to_string()),
            });
        }

        let start = Instant::now();
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.search_similar(&query_embedding, limit).await;
        debug!(hits = hits.len(), "Similarity scan complete");

        let mut contexts = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(article_id) = hit.key.article_id() else {
                continue;
            };
            match self.store.get_article(article_id).await {
                Ok(article) => contexts.push(RetrievedContext {
                    kind: ContextKind::Article,
                    id: article_id,
                    title: article.title,
                    chunk: hit.key.chunk,
                    score: hit.score,
                    excerpt: excerpt(&hit.text),
                }),
                Err(AppError::ArticleNotFound { .. }) => {
                    debug!(key = %hit.key, "Skipping embedding of deleted article");
                }
                Err(e) => return Err(e),
            }
        }

        metrics::record_search(start.elapsed().as_secs_f64(), "semantic", contexts.len());
        info!(results = contexts.len(), "RAG query complete");

        Ok(RagResponse {
            query: query.to_string(),
            contexts,
        })
    }
}
