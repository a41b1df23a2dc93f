//! Standalone file uploads and download links

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use super::multipart::Form;
use crate::AppState;
use scriptorium_common::{blob::keys, errors::Result};

#[derive(Serialize)]
pub struct UploadResponse {
    /// Locator to hand back to `/api/files/{key}`
    pub key: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct FileUrlResponse {
    pub url: String,
}

pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    upload(state, multipart, "audio", keys::audio).await
}

pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    upload(state, multipart, "image", keys::image).await
}

async fn upload(
    state: AppState,
    multipart: Multipart,
    field: &str,
    make_key: fn(Option<&str>) -> String,
) -> Result<Json<UploadResponse>> {
    let mut form = Form::read(multipart).await?;
    let file = form.require_file(field)?;

    let key = make_key(file.file_name.as_deref());
    let content_type = file.content_type_or("application/octet-stream").to_string();
    let size = file.bytes.len();

    let locator = state.blobs.put(&key, file.bytes, &content_type).await?;
    let url = state.blobs.url(&locator, state.config.url_ttl()).await?;

    tracing::info!(key = %locator, size, backend = state.blobs.name(), "File uploaded");
    Ok(Json(UploadResponse { key: locator, url }))
}

/// Fresh download link for a stored locator or bare key
pub async fn file_url(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FileUrlResponse>> {
    let url = state.blobs.url(&key, state.config.url_ttl()).await?;
    Ok(Json(FileUrlResponse { url }))
}
