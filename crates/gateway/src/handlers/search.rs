//! Keyword and semantic search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use scriptorium_common::errors::Result;
use scriptorium_search::{clamp_limit, keyword_search, KeywordResults, RagResponse};

#[derive(Debug, Deserialize, Validate)]
pub struct KeywordQuery {
    #[validate(length(min = 1, max = 1000))]
    pub q: String,

    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RagRequest {
    #[validate(length(min = 1, max = 1000))]
    pub query: String,

    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn keyword(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<KeywordResults>> {
    query.validate()?;
    let limit = clamp_limit(query.limit);
    Ok(Json(keyword_search(&state.store, &query.q, limit).await))
}

pub async fn rag_query(
    State(state): State<AppState>,
    Json(request): Json<RagRequest>,
) -> Result<Json<RagResponse>> {
    request.validate()?;
    let limit = clamp_limit(request.limit);

    let response = state.rag.query(&request.query, limit).await?;
    tracing::info!(results = response.contexts.len(), limit, "RAG query served");
    Ok(Json(response))
}
