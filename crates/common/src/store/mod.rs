//! In-memory store for every Scriptorium entity
//!
//! Provides a single repository over articles, comments, citations, dialogs,
//! messages, processing jobs and embeddings with:
//! - identity generation (time-ordered UUIDs, so map order is creation order)
//! - referential checks on every attach operation
//! - cascading deletes
//! - job status bookkeeping with enforced transitions
//! - a linear cosine-similarity scan over stored embeddings
//!
//! Every operation takes the lock exactly once, which makes each call atomic
//! with respect to concurrent handlers.

use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::metrics;
use crate::models::*;

/// Article fields as stored; comments and citations live in their own maps
#[derive(Clone, Debug)]
struct ArticleRecord {
    id: Uuid,
    title: String,
    url: Option<String>,
    pdf_key: Option<String>,
    pdf_text: Option<String>,
    status: ArticleStatus,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Clone, Debug)]
struct StoredEmbedding {
    vector: Vec<f32>,
    text: String,
}

#[derive(Default)]
struct StoreState {
    articles: BTreeMap<Uuid, ArticleRecord>,
    comments: BTreeMap<Uuid, Comment>,
    citations: BTreeMap<Uuid, Citation>,
    dialogs: BTreeMap<Uuid, Dialog>,
    messages: BTreeMap<Uuid, Message>,
    jobs: BTreeMap<Uuid, ProcessingJob>,
    embeddings: BTreeMap<EmbeddingKey, StoredEmbedding>,
}

impl StoreState {
    fn article_view(&self, record: &ArticleRecord) -> Article {
        let comments = self
            .comments
            .values()
            .filter(|c| c.article_id == record.id)
            .cloned()
            .collect();
        let citations = self
            .citations
            .values()
            .filter(|c| c.source_article_id == record.id)
            .cloned()
            .collect();

        Article {
            id: record.id,
            title: record.title.clone(),
            url: record.url.clone(),
            pdf_key: record.pdf_key.clone(),
            pdf_text: record.pdf_text.clone(),
            status: record.status,
            comments,
            citations,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn require_article(&self, id: Uuid) -> Result<&ArticleRecord> {
        self.articles
            .get(&id)
            .ok_or_else(|| AppError::ArticleNotFound { id: id.to_string() })
    }
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation {
            message: "title must not be empty".to_string(),
            field: Some("title".to_string()),
        });
    }
    Ok(())
}

/// Shared handle to the in-memory store
#[derive(Clone, Default)]
pub struct Store {
    state: Arc<RwLock<StoreState>>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Register a new article
    pub async fn create_article(&self, new: NewArticle) -> Result<Article> {
        require_title(&new.title)?;

        let now = Utc::now();
        let record = ArticleRecord {
            id: Uuid::now_v7(),
            title: new.title,
            url: new.url,
            pdf_key: new.pdf_key,
            pdf_text: None,
            status: ArticleStatus::ToRead,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().await;
        let view = state.article_view(&record);
        state.articles.insert(record.id, record);

        debug!(article_id = %view.id, "Article created");
        Ok(view)
    }

    /// Find article by ID, with comments and outgoing citations
    pub async fn get_article(&self, id: Uuid) -> Result<Article> {
        let state = self.state.read().await;
        let record = state.require_article(id)?;
        Ok(state.article_view(record))
    }

    /// List every article in creation order
    pub async fn list_articles(&self) -> Vec<Article> {
        let state = self.state.read().await;
        state
            .articles
            .values()
            .map(|record| state.article_view(record))
            .collect()
    }

    /// Apply a partial update
    pub async fn update_article(&self, id: Uuid, update: ArticleUpdate) -> Result<Article> {
        if let Some(ref title) = update.title {
            require_title(title)?;
        }

        let mut state = self.state.write().await;
        let record = state
            .articles
            .get_mut(&id)
            .ok_or_else(|| AppError::ArticleNotFound { id: id.to_string() })?;

        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(url) = update.url {
            record.url = Some(url);
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(pdf_text) = update.pdf_text {
            record.pdf_text = Some(pdf_text);
        }
        record.updated_at = Utc::now();

        let record = record.clone();
        Ok(state.article_view(&record))
    }

    /// Delete an article together with its comments, citations and embeddings
    pub async fn delete_article(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.articles.remove(&id).is_none() {
            return Err(AppError::ArticleNotFound { id: id.to_string() });
        }

        let comments_before = state.comments.len();
        state.comments.retain(|_, c| c.article_id != id);
        let citations_before = state.citations.len();
        state
            .citations
            .retain(|_, c| c.source_article_id != id && c.target_article_id != id);
        let embeddings_before = state.embeddings.len();
        state.embeddings.retain(|key, _| key.article_id() != Some(id));

        info!(
            article_id = %id,
            comments = comments_before - state.comments.len(),
            citations = citations_before - state.citations.len(),
            embeddings = embeddings_before - state.embeddings.len(),
            "Article deleted"
        );
        Ok(())
    }

    // ========================================================================
    // Comment & Citation Operations
    // ========================================================================

    /// Attach a comment to an existing article
    pub async fn add_comment(&self, article_id: Uuid, new: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        state.require_article(article_id)?;

        let comment = Comment {
            id: Uuid::now_v7(),
            article_id,
            text: new.text,
            audio_key: new.audio_key,
            audio_transcription: new.audio_transcription,
            created_at: Utc::now(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    /// Record that `source` cites `target`; both articles must exist
    pub async fn add_citation(&self, source: Uuid, target: Uuid) -> Result<Citation> {
        let mut state = self.state.write().await;
        state.require_article(source)?;
        state.require_article(target)?;

        let citation = Citation {
            id: Uuid::now_v7(),
            source_article_id: source,
            target_article_id: target,
            created_at: Utc::now(),
        };
        state.citations.insert(citation.id, citation.clone());
        Ok(citation)
    }

    /// Outgoing and incoming citations of an article
    pub async fn citations_for(&self, article_id: Uuid) -> Result<(Vec<Citation>, Vec<Citation>)> {
        let state = self.state.read().await;
        state.require_article(article_id)?;

        let (outgoing, incoming) = state
            .citations
            .values()
            .filter(|c| c.source_article_id == article_id || c.target_article_id == article_id)
            .cloned()
            .partition(|c| c.source_article_id == article_id);
        Ok((outgoing, incoming))
    }

    /// Titles of the given articles; ids that no longer exist are left out
    pub async fn article_titles(&self, ids: &[Uuid]) -> BTreeMap<Uuid, String> {
        let state = self.state.read().await;
        ids.iter()
            .filter_map(|id| state.articles.get(id).map(|record| (*id, record.title.clone())))
            .collect()
    }

    // ========================================================================
    // Dialog Operations
    // ========================================================================

    /// Open a new dialog
    pub async fn create_dialog(&self, title: impl Into<String>) -> Result<Dialog> {
        let title = title.into();
        require_title(&title)?;

        let now = Utc::now();
        let dialog = Dialog {
            id: Uuid::now_v7(),
            title,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.dialogs.insert(dialog.id, dialog.clone());
        Ok(dialog)
    }

    pub async fn get_dialog(&self, id: Uuid) -> Result<Dialog> {
        self.state
            .read()
            .await
            .dialogs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::DialogNotFound { id: id.to_string() })
    }

    pub async fn list_dialogs(&self) -> Vec<Dialog> {
        self.state.read().await.dialogs.values().cloned().collect()
    }

    /// Delete a dialog and all of its messages
    pub async fn delete_dialog(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.dialogs.remove(&id).is_none() {
            return Err(AppError::DialogNotFound { id: id.to_string() });
        }

        let before = state.messages.len();
        state.messages.retain(|_, m| m.dialog_id != id);
        info!(dialog_id = %id, messages = before - state.messages.len(), "Dialog deleted");
        Ok(())
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append a message to an existing dialog
    pub async fn create_message(&self, dialog_id: Uuid, new: NewMessage) -> Result<Message> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let dialog = state
            .dialogs
            .get_mut(&dialog_id)
            .ok_or_else(|| AppError::DialogNotFound { id: dialog_id.to_string() })?;
        dialog.updated_at = now;

        let message = Message {
            id: Uuid::now_v7(),
            dialog_id,
            text: new.text,
            image_keys: new.image_keys,
            audio_key: new.audio_key,
            audio_transcription: new.audio_transcription,
            created_at: now,
        };
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    pub async fn get_message(&self, id: Uuid) -> Result<Message> {
        self.state
            .read()
            .await
            .messages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::MessageNotFound { id: id.to_string() })
    }

    /// Messages of one dialog in creation order
    pub async fn list_messages(&self, dialog_id: Uuid) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        if !state.dialogs.contains_key(&dialog_id) {
            return Err(AppError::DialogNotFound { id: dialog_id.to_string() });
        }
        Ok(state
            .messages
            .values()
            .filter(|m| m.dialog_id == dialog_id)
            .cloned()
            .collect())
    }

    /// Every message across all dialogs
    pub async fn all_messages(&self) -> Vec<Message> {
        self.state.read().await.messages.values().cloned().collect()
    }

    pub async fn update_message(&self, id: Uuid, update: MessageUpdate) -> Result<Message> {
        let mut state = self.state.write().await;
        let message = state
            .messages
            .get_mut(&id)
            .ok_or_else(|| AppError::MessageNotFound { id: id.to_string() })?;

        if let Some(text) = update.text {
            message.text = Some(text);
        }
        if let Some(transcription) = update.audio_transcription {
            message.audio_transcription = Some(transcription);
        }
        Ok(message.clone())
    }

    pub async fn delete_message(&self, id: Uuid) -> Result<()> {
        self.state
            .write()
            .await
            .messages
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::MessageNotFound { id: id.to_string() })
    }

    // ========================================================================
    // Processing Job Operations
    // ========================================================================

    /// Create a pending job
    pub async fn create_job(&self, kind: JobKind) -> Result<ProcessingJob> {
        let job = ProcessingJob::new(kind);
        self.state.write().await.jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, kind = %kind, "Job created");
        Ok(job)
    }

    pub async fn get_job(&self, id: Uuid) -> Result<ProcessingJob> {
        self.state
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::JobNotFound { id: id.to_string() })
    }

    /// Move a job to a new status, rejecting illegal transitions
    pub async fn update_job(&self, id: Uuid, update: JobUpdate) -> Result<ProcessingJob> {
        let mut state = self.state.write().await;
        let job = state
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::JobNotFound { id: id.to_string() })?;

        if !job.status.can_transition_to(update.status) {
            return Err(AppError::InvalidJobTransition {
                id: id.to_string(),
                from: job.status,
                to: update.status,
            });
        }

        job.status = update.status;
        if update.result.is_some() {
            job.result = update.result;
        }
        if update.error.is_some() {
            job.error = update.error;
        }
        job.updated_at = Utc::now();

        debug!(job_id = %id, status = %job.status, "Job updated");
        Ok(job.clone())
    }

    /// Track `work` as a job of the given kind.
    ///
    /// The job is created pending, moved to processing, then completed with the
    /// returned result or failed with the error message.
    pub async fn run_job<F, Fut>(&self, kind: JobKind, work: F) -> Result<JobOutcome>
    where
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = Result<serde_json::Value>>,
    {
        let started = Instant::now();
        let job = self.create_job(kind).await?;
        self.update_job(job.id, JobUpdate::status(JobStatus::Processing)).await?;

        let update = match work(job.id).await {
            Ok(result) => JobUpdate::completed(result),
            Err(e) => {
                warn!(job_id = %job.id, kind = %kind, error = %e, "Job failed");
                JobUpdate::failed(e.to_string())
            }
        };

        let job = self.update_job(job.id, update).await?;
        metrics::record_job(kind.as_str(), job.status.as_str(), started.elapsed().as_secs_f64());

        info!(job_id = %job.id, kind = %kind, status = %job.status, "Job finished");
        Ok(job.outcome())
    }

    // ========================================================================
    // Embedding Operations
    // ========================================================================

    /// Store (or replace) the vector for a key.
    ///
    /// The owning article must still exist; the check and the insert share
    /// one write lock so a concurrent delete cannot leave the vector behind.
    pub async fn store_embedding(
        &self,
        key: EmbeddingKey,
        vector: Vec<f32>,
        text: impl Into<String>,
    ) -> Result<()> {
        let text = text.into();
        let mut state = self.state.write().await;
        if let Some(article_id) = key.article_id() {
            if !state.articles.contains_key(&article_id) {
                return Err(AppError::ArticleNotFound {
                    id: article_id.to_string(),
                });
            }
        }
        state.embeddings.insert(key, StoredEmbedding { vector, text });
        Ok(())
    }

    pub async fn get_embedding(&self, key: &EmbeddingKey) -> Option<Vec<f32>> {
        self.state
            .read()
            .await
            .embeddings
            .get(key)
            .map(|e| e.vector.clone())
    }

    pub async fn embedding_count(&self) -> usize {
        self.state.read().await.embeddings.len()
    }

    /// Score every stored embedding against `query` and keep the best `limit`.
    ///
    /// Vectors of a different dimension than the query are skipped.
    pub async fn search_similar(&self, query: &[f32], limit: usize) -> Vec<SimilarEmbedding> {
        let state = self.state.read().await;

        let mut scored: Vec<SimilarEmbedding> = state
            .embeddings
            .iter()
            .filter_map(|(key, stored)| match cosine_similarity(query, &stored.vector) {
                Some(score) => Some(SimilarEmbedding {
                    key: *key,
                    score,
                    text: stored.text.clone(),
                }),
                None => {
                    debug!(key = %key, "Skipping embedding with mismatched dimension");
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn store_with_article(title: &str) -> (Store, Article) {
        let store = Store::new();
        let article = store.create_article(NewArticle::titled(title)).await.unwrap();
        (store, article)
    }

    #[tokio::test]
    async fn test_create_and_get_article() {
        let (store, article) = store_with_article("Attention Is All You Need").await;
        assert_eq!(article.status, ArticleStatus::ToRead);
        assert!(article.comments.is_empty());

        let fetched = store.get_article(article.id).await.unwrap();
        assert_eq!(fetched, article);
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let store = Store::new();
        let err = store.create_article(NewArticle::titled("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(store.create_dialog("").await.is_err());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_absent_fields() {
        let store = Store::new();
        let article = store
            .create_article(NewArticle {
                title: "Original".into(),
                url: Some("https://example.org/paper".into()),
                pdf_key: None,
            })
            .await
            .unwrap();

        let updated = store
            .update_article(
                article.id,
                ArticleUpdate {
                    status: Some(ArticleStatus::Read),
                    ..ArticleUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Original");
        assert_eq!(updated.url.as_deref(), Some("https://example.org/paper"));
        assert_eq!(updated.status, ArticleStatus::Read);
        assert!(updated.updated_at >= article.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_article() {
        let store = Store::new();
        let err = store
            .update_article(Uuid::now_v7(), ArticleUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_comment_requires_article() {
        let store = Store::new();
        let err = store
            .add_comment(Uuid::now_v7(), NewComment::text("orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_comments_and_citations_appear_on_article() {
        let (store, source) = store_with_article("Source").await;
        let target = store.create_article(NewArticle::titled("Target")).await.unwrap();

        assert_ok!(store.add_comment(source.id, NewComment::text("great read")).await);
        let citation = store.add_citation(source.id, target.id).await.unwrap();

        let view = store.get_article(source.id).await.unwrap();
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].text.as_deref(), Some("great read"));
        assert_eq!(view.citations, vec![citation.clone()]);

        let (outgoing, incoming) = store.citations_for(target.id).await.unwrap();
        assert!(outgoing.is_empty());
        assert_eq!(incoming, vec![citation]);
    }

    #[tokio::test]
    async fn test_citation_requires_both_articles() {
        let (store, source) = store_with_article("Source").await;
        let err = store.add_citation(source.id, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
        let err = store.add_citation(Uuid::now_v7(), source.id).await.unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_article_cascades() {
        let (store, doomed) = store_with_article("Doomed").await;
        let other = store.create_article(NewArticle::titled("Other")).await.unwrap();

        store.add_comment(doomed.id, NewComment::text("bye")).await.unwrap();
        store.add_citation(other.id, doomed.id).await.unwrap();
        store.add_citation(doomed.id, other.id).await.unwrap();
        store
            .store_embedding(EmbeddingKey::article_chunk(doomed.id, 0), vec![1.0, 0.0], "chunk")
            .await
            .unwrap();
        store
            .store_embedding(EmbeddingKey::article_chunk(other.id, 0), vec![0.0, 1.0], "chunk")
            .await
            .unwrap();

        store.delete_article(doomed.id).await.unwrap();

        assert!(store.get_article(doomed.id).await.is_err());
        let other_view = store.get_article(other.id).await.unwrap();
        assert!(other_view.citations.is_empty());
        let (_, incoming) = store.citations_for(other.id).await.unwrap();
        assert!(incoming.is_empty());
        assert_eq!(store.embedding_count().await, 1);

        let err = store.delete_article(doomed.id).await.unwrap_err();
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_messages_require_dialog() {
        let store = Store::new();
        let err = store
            .create_message(Uuid::now_v7(), NewMessage::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DialogNotFound { .. }));
    }

    #[tokio::test]
    async fn test_message_bumps_dialog_and_lists_in_order() {
        let store = Store::new();
        let dialog = store.create_dialog("Reading group").await.unwrap();

        let first = store.create_message(dialog.id, NewMessage::text("one")).await.unwrap();
        let second = store.create_message(dialog.id, NewMessage::text("two")).await.unwrap();

        let messages = store.list_messages(dialog.id).await.unwrap();
        assert_eq!(messages, vec![first, second]);

        let refreshed = store.get_dialog(dialog.id).await.unwrap();
        assert!(refreshed.updated_at >= dialog.updated_at);
    }

    #[tokio::test]
    async fn test_delete_dialog_cascades_messages() {
        let store = Store::new();
        let dialog = store.create_dialog("Ephemeral").await.unwrap();
        let keep = store.create_dialog("Keep").await.unwrap();
        let message = store.create_message(dialog.id, NewMessage::text("gone")).await.unwrap();
        store.create_message(keep.id, NewMessage::text("stays")).await.unwrap();

        store.delete_dialog(dialog.id).await.unwrap();

        assert!(store.get_message(message.id).await.is_err());
        assert_eq!(store.all_messages().await.len(), 1);
        assert!(store.list_messages(dialog.id).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete_message() {
        let store = Store::new();
        let dialog = store.create_dialog("Voice notes").await.unwrap();
        let message = store.create_message(dialog.id, NewMessage::default()).await.unwrap();

        let updated = store
            .update_message(
                message.id,
                MessageUpdate {
                    audio_transcription: Some("transcribed".into()),
                    ..MessageUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.audio_transcription.as_deref(), Some("transcribed"));
        assert!(updated.text.is_none());

        store.delete_message(message.id).await.unwrap();
        let err = store.delete_message(message.id).await.unwrap_err();
        assert!(matches!(err, AppError::MessageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_job_transitions_enforced() {
        let store = Store::new();
        let job = store.create_job(JobKind::Pdf).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let err = store
            .update_job(job.id, JobUpdate::completed(serde_json::json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidJobTransition { .. }));

        store.update_job(job.id, JobUpdate::status(JobStatus::Processing)).await.unwrap();
        let done = store
            .update_job(job.id, JobUpdate::completed(serde_json::json!({"ok": true})))
            .await
            .unwrap();
        assert!(done.is_terminal());
        assert_eq!(done.result, Some(serde_json::json!({"ok": true})));

        let err = store.update_job(job.id, JobUpdate::failed("late")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidJobTransition { .. }));
    }

    #[tokio::test]
    async fn test_run_job_records_success_and_failure() {
        let store = Store::new();

        let outcome = store
            .run_job(JobKind::Export, |job_id| async move {
                Ok(serde_json::json!({ "job": job_id.to_string() }))
            })
            .await
            .unwrap();
        assert!(outcome.succeeded());
        let job = store.get_job(outcome.job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result.unwrap()["job"], outcome.job_id.to_string());

        let outcome = store
            .run_job(JobKind::Audio, |_| async {
                Err(AppError::TranscriptionError { message: "engine down".into() })
            })
            .await
            .unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert!(outcome.error.unwrap().contains("engine down"));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let store = Store::new();
        let err = store.get_job(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn test_search_similar_orders_by_score() {
        let (store, article) = store_with_article("Vectors").await;
        let near = EmbeddingKey::article_chunk(article.id, 0);
        let far = EmbeddingKey::article_chunk(article.id, 1);
        let odd = EmbeddingKey::article_chunk(article.id, 2);

        store.store_embedding(near, vec![0.9, 0.1], "near").await.unwrap();
        store.store_embedding(far, vec![-1.0, 0.2], "far").await.unwrap();
        store.store_embedding(odd, vec![1.0, 0.0, 0.0], "wrong dimension").await.unwrap();

        let hits = store.search_similar(&[1.0, 0.0], 10).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].key, near);
        assert_eq!(hits[0].text, "near");
        assert_eq!(hits[1].key, far);
        assert!(hits[0].score > hits[1].score);

        let top = store.search_similar(&[1.0, 0.0], 1).await;
        assert_eq!(top.len(), 1);
    }

    #[tokio::test]
    async fn test_search_similar_on_empty_store() {
        let store = Store::new();
        assert!(store.search_similar(&[1.0, 2.0], 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_store_embedding_replaces_existing_key() {
        let (store, article) = store_with_article("Replace").await;
        let key = EmbeddingKey::article_chunk(article.id, 0);
        store.store_embedding(key, vec![1.0], "old").await.unwrap();
        store.store_embedding(key, vec![2.0], "new").await.unwrap();
        assert_eq!(store.embedding_count().await, 1);
        assert_eq!(store.get_embedding(&key).await, Some(vec![2.0]));
    }

    #[tokio::test]
    async fn test_article_titles_skip_missing_ids() {
        let (store, kept) = store_with_article("Kept").await;
        let gone = store.create_article(NewArticle::titled("Gone")).await.unwrap();
        store.delete_article(gone.id).await.unwrap();

        let titles = store.article_titles(&[kept.id, gone.id]).await;
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.get(&kept.id).map(String::as_str), Some("Kept"));
    }

    #[tokio::test]
    async fn test_store_embedding_rejects_deleted_article() {
        let (store, article) = store_with_article("Gone").await;
        store.delete_article(article.id).await.unwrap();

        let key = EmbeddingKey::article_chunk(article.id, 0);
        let err = tokio_test::assert_err!(store.store_embedding(key, vec![1.0], "late").await);
        assert!(matches!(err, AppError::ArticleNotFound { .. }));
        assert_eq!(store.embedding_count().await, 0);
    }
}
