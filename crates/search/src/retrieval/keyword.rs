//! Case-insensitive substring search over articles and messages

use scriptorium_common::metrics;
use scriptorium_common::models::{Article, Message};
use scriptorium_common::Store;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordResults {
    pub articles: Vec<Article>,
    pub messages: Vec<Message>,
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Match articles on title or extracted text, messages on text or transcript.
///
/// Each list is capped at `limit`.
pub async fn keyword_search(store: &Store, query: &str, limit: usize) -> KeywordResults {
    let start = Instant::now();
    let needle = query.to_lowercase();

    let articles: Vec<Article> = store
        .list_articles()
        .await
        .into_iter()
        .filter(|a| contains(Some(&a.title), &needle) || contains(a.pdf_text.as_deref(), &needle))
        .take(limit)
        .collect();

    let messages: Vec<Message> = store
        .all_messages()
        .await
        .into_iter()
        .filter(|m| {
            contains(m.text.as_deref(), &needle) || contains(m.audio_transcription.as_deref(), &needle)
        })
        .take(limit)
        .collect();

    metrics::record_search(
        start.elapsed().as_secs_f64(),
        "keyword",
        articles.len() + messages.len(),
    );
    KeywordResults { articles, messages }
}

/// Articles whose title contains `query`
pub async fn title_search(store: &Store, query: &str) -> Vec<Article> {
    let start = Instant::now();
    let needle = query.to_lowercase();

    let articles: Vec<Article> = store
        .list_articles()
        .await
        .into_iter()
        .filter(|a| contains(Some(&a.title), &needle))
        .collect();

    metrics::record_search(start.elapsed().as_secs_f64(), "title", articles.len());
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_common::models::{ArticleUpdate, MessageUpdate, NewArticle, NewMessage};

    async fn seeded() -> Store {
        let store = Store::new();
        store.create_article(NewArticle::titled("Transformers in Vision")).await.unwrap();
        let other = store.create_article(NewArticle::titled("Sparse attention")).await.unwrap();
        store
            .update_article(
                other.id,
                ArticleUpdate {
                    pdf_text: Some("We revisit TRANSFORMERS for long documents.".into()),
                    ..ArticleUpdate::default()
                },
            )
            .await
            .unwrap();

        let dialog = store.create_dialog("Notes").await.unwrap();
        store
            .create_message(dialog.id, NewMessage::text("compare with transformers"))
            .await
            .unwrap();
        let voice = store.create_message(dialog.id, NewMessage::default()).await.unwrap();
        store
            .update_message(
                voice.id,
                MessageUpdate {
                    audio_transcription: Some("transformers again".into()),
                    ..MessageUpdate::default()
                },
            )
            .await
            .unwrap();
        store.create_message(dialog.id, NewMessage::text("unrelated")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_keyword_search_matches_text_and_transcripts() {
        let store = seeded().await;
        let results = keyword_search(&store, "Transformers", 10).await;
        assert_eq!(results.articles.len(), 2);
        assert_eq!(results.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_keyword_search_limit() {
        let store = seeded().await;
        let results = keyword_search(&store, "transformers", 1).await;
        assert_eq!(results.articles.len(), 1);
        assert_eq!(results.messages.len(), 1);
        assert_eq!(results.articles[0].title, "Transformers in Vision");
    }

    #[tokio::test]
    async fn test_title_search_ignores_pdf_text() {
        let store = seeded().await;
        let articles = title_search(&store, "transformers").await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Transformers in Vision");
        assert!(title_search(&store, "nothing like this").await.is_empty());
    }
}
