//! Entity models
//!
//! Plain records owned by the [`Store`](crate::store::Store). Read views are
//! assembled on demand so relationships never have to be kept in two places.

mod article;
mod dialog;
mod embedding;
mod job;

pub use article::{
    Article, ArticleStatus, ArticleUpdate, Citation, Comment, NewArticle, NewComment,
};
pub use dialog::{Dialog, Message, MessageUpdate, NewMessage};
pub use embedding::{cosine_similarity, EmbeddingKey, EmbeddingOwner, SimilarEmbedding};
pub use job::{JobKind, JobOutcome, JobStatus, JobUpdate, ProcessingJob};
