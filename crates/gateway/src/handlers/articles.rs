//! Article, comment and citation handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::multipart::Form;
use crate::AppState;
use scriptorium_common::{
    blob::keys,
    errors::Result,
    models::{
        Article, ArticleStatus, ArticleUpdate, Citation, Comment, JobOutcome, NewArticle,
        NewComment,
    },
};
use scriptorium_search::title_search;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: Option<String>,

    pub status: Option<ArticleStatus>,

    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 50000))]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CitationRequest {
    pub target_article_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TitleQuery {
    #[validate(length(min = 1, max = 1000))]
    pub q: String,
}

/// Article created from an uploaded PDF, with the ingestion outcome
#[derive(Serialize)]
pub struct PdfUploadResponse {
    pub article: Article,
    pub job: JobOutcome,
}

/// A citation seen from one side, naming the article on the other side
#[derive(Serialize)]
pub struct CitationView {
    pub citation_id: Uuid,
    pub article_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct CitationsResponse {
    pub outgoing: Vec<CitationView>,
    pub incoming: Vec<CitationView>,
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>)> {
    request.validate()?;

    let article = state
        .store
        .create_article(NewArticle {
            title: request.title,
            url: request.url,
            pdf_key: None,
        })
        .await?;

    tracing::info!(article_id = %article.id, title = %article.title, "Article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// Store the PDF, create the article and run ingestion inline
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PdfUploadResponse>)> {
    let mut form = Form::read(multipart).await?;
    let title = form.require_text("title")?;
    let pdf = form.require_file("pdf")?;

    CreateArticleRequest {
        title: title.clone(),
        url: None,
    }
    .validate()?;

    let size = pdf.bytes.len();
    let pdf_key = state
        .blobs
        .put(&keys::pdf(), pdf.bytes, "application/pdf")
        .await?;
    let article = state
        .store
        .create_article(NewArticle {
            title,
            url: None,
            pdf_key: Some(pdf_key),
        })
        .await?;

    tracing::info!(article_id = %article.id, size, "PDF uploaded");

    let job = state.pdf.process_pdf(article.id).await?;
    let article = state.store.get_article(article.id).await?;

    Ok((StatusCode::CREATED, Json(PdfUploadResponse { article, job })))
}

pub async fn list_articles(State(state): State<AppState>) -> Json<Vec<Article>> {
    Json(state.store.list_articles().await)
}

pub async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<Article>>> {
    query.validate()?;
    Ok(Json(title_search(&state.store, &query.q).await))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Article>> {
    Ok(Json(state.store.get_article(article_id).await?))
}

pub async fn update_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<Article>> {
    request.validate()?;

    let article = state
        .store
        .update_article(
            article_id,
            ArticleUpdate {
                title: request.title,
                url: request.url,
                status: request.status,
                pdf_text: None,
            },
        )
        .await?;

    tracing::info!(article_id = %article_id, status = ?article.status, "Article updated");
    Ok(Json(article))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.delete_article(article_id).await?;
    tracing::info!(article_id = %article_id, "Article deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    request.validate()?;
    let comment = state
        .store
        .add_comment(article_id, NewComment::text(request.text))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Audio comment; the transcript is best effort
pub async fn add_audio_comment(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Comment>)> {
    // Fail before uploading anything for an unknown article
    state.store.get_article(article_id).await?;

    let mut form = Form::read(multipart).await?;
    let audio = form.require_file("audio")?;
    let key = keys::comment_audio(audio.file_name.as_deref());
    let content_type = audio.content_type_or("application/octet-stream").to_string();

    let transcription = state
        .audio
        .transcribe_upload(&audio.bytes, audio.display_name())
        .await;
    let audio_key = state.blobs.put(&key, audio.bytes, &content_type).await?;

    let comment = state
        .store
        .add_comment(
            article_id,
            NewComment {
                text: form.text("text"),
                audio_key: Some(audio_key),
                audio_transcription: transcription,
            },
        )
        .await?;

    tracing::info!(
        article_id = %article_id,
        comment_id = %comment.id,
        transcribed = comment.audio_transcription.is_some(),
        "Audio comment added"
    );
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn add_citation(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<CitationRequest>,
) -> Result<(StatusCode, Json<Citation>)> {
    let citation = state
        .store
        .add_citation(article_id, request.target_article_id)
        .await?;
    Ok((StatusCode::CREATED, Json(citation)))
}

pub async fn get_citations(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<CitationsResponse>> {
    let (outgoing, incoming) = state.store.citations_for(article_id).await?;

    let others: Vec<Uuid> = outgoing
        .iter()
        .map(|c| c.target_article_id)
        .chain(incoming.iter().map(|c| c.source_article_id))
        .collect();
    let titles = state.store.article_titles(&others).await;

    // An article deleted since the citation lookup drops out of the view
    let view = |citation: &Citation, other: Uuid| {
        titles.get(&other).map(|title| CitationView {
            citation_id: citation.id,
            article_id: other,
            title: title.clone(),
            created_at: citation.created_at,
        })
    };

    Ok(Json(CitationsResponse {
        outgoing: outgoing
            .iter()
            .filter_map(|c| view(c, c.target_article_id))
            .collect(),
        incoming: incoming
            .iter()
            .filter_map(|c| view(c, c.source_article_id))
            .collect(),
    }))
}
