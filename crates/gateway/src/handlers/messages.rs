//! Message handlers, including multimodal uploads

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::multipart::Form;
use crate::AppState;
use scriptorium_common::{
    blob::keys,
    errors::{AppError, Result},
    models::{Message, NewMessage},
};

/// Bounds shared by JSON and multipart message text
#[derive(Debug, Deserialize, Validate)]
pub struct MessageRequest {
    #[validate(length(min = 1, max = 50000))]
    pub text: String,
}

pub async fn create_message(
    State(state): State<AppState>,
    Path(dialog_id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    request.validate()?;
    let message = state
        .store
        .create_message(dialog_id, NewMessage::text(request.text))
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Message with optional text, one optional audio clip and any number of images.
///
/// Audio is transcribed on a best-effort basis.
pub async fn create_multimodal_message(
    State(state): State<AppState>,
    Path(dialog_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Message>)> {
    state.store.get_dialog(dialog_id).await?;

    let mut form = Form::read(multipart).await?;
    let text = form.text("text");
    if let Some(text) = &text {
        MessageRequest { text: text.clone() }.validate()?;
    }
    let audio = form.file("audio");
    let images = form.files("images");

    if text.is_none() && audio.is_none() && images.is_empty() {
        return Err(AppError::Validation {
            message: "Message needs text, audio or at least one image".to_string(),
            field: None,
        });
    }

    let mut new = NewMessage {
        text,
        ..NewMessage::default()
    };

    if let Some(audio) = audio {
        let key = keys::message_audio(audio.file_name.as_deref());
        let content_type = audio.content_type_or("application/octet-stream").to_string();
        new.audio_transcription = state
            .audio
            .transcribe_upload(&audio.bytes, audio.display_name())
            .await;
        new.audio_key = Some(state.blobs.put(&key, audio.bytes, &content_type).await?);
    }

    for image in images {
        let key = keys::message_image(image.file_name.as_deref());
        let content_type = image.content_type_or("application/octet-stream").to_string();
        new.image_keys
            .push(state.blobs.put(&key, image.bytes, &content_type).await?);
    }

    let message = state.store.create_message(dialog_id, new).await?;

    tracing::info!(
        dialog_id = %dialog_id,
        message_id = %message.id,
        images = message.image_keys.len(),
        audio = message.audio_key.is_some(),
        "Multimodal message created"
    );
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<Message>> {
    Ok(Json(state.store.get_message(message_id).await?))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.delete_message(message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
