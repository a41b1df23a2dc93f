//! Article, comment and citation entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reading state of an article
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[default]
    ToRead,
    Read,
}

/// Article as returned to callers, with its comments and outgoing citations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    /// Object-storage locator of the uploaded PDF
    pub pdf_key: Option<String>,
    pub pdf_text: Option<String>,
    pub status: ArticleStatus,
    pub comments: Vec<Comment>,
    pub citations: Vec<Citation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub article_id: Uuid,
    pub text: Option<String>,
    pub audio_key: Option<String>,
    pub audio_transcription: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Directed citation: `source_article_id` cites `target_article_id`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: Uuid,
    pub source_article_id: Uuid,
    pub target_article_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when registering an article
#[derive(Clone, Debug, Default)]
pub struct NewArticle {
    pub title: String,
    pub url: Option<String>,
    pub pdf_key: Option<String>,
}

impl NewArticle {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub status: Option<ArticleStatus>,
    #[serde(skip)]
    pub pdf_text: Option<String>,
}

impl ArticleUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.status.is_none() && self.pdf_text.is_none()
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewComment {
    pub text: Option<String>,
    pub audio_key: Option<String>,
    pub audio_transcription: Option<String>,
}

impl NewComment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}
