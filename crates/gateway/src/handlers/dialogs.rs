//! Dialog handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use scriptorium_common::{
    errors::Result,
    models::{Dialog, Message},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDialogRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,
}

/// A dialog with its messages in creation order
#[derive(Serialize)]
pub struct DialogResponse {
    pub dialog: Dialog,
    pub messages: Vec<Message>,
}

pub async fn create_dialog(
    State(state): State<AppState>,
    Json(request): Json<CreateDialogRequest>,
) -> Result<(StatusCode, Json<Dialog>)> {
    request.validate()?;
    let dialog = state.store.create_dialog(request.title).await?;

    tracing::info!(dialog_id = %dialog.id, "Dialog created");
    Ok((StatusCode::CREATED, Json(dialog)))
}

pub async fn list_dialogs(State(state): State<AppState>) -> Json<Vec<Dialog>> {
    Json(state.store.list_dialogs().await)
}

pub async fn get_dialog(
    State(state): State<AppState>,
    Path(dialog_id): Path<Uuid>,
) -> Result<Json<DialogResponse>> {
    let dialog = state.store.get_dialog(dialog_id).await?;
    let messages = state.store.list_messages(dialog_id).await?;
    Ok(Json(DialogResponse { dialog, messages }))
}

pub async fn delete_dialog(
    State(state): State<AppState>,
    Path(dialog_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.store.delete_dialog(dialog_id).await?;
    tracing::info!(dialog_id = %dialog_id, "Dialog deleted");
    Ok(StatusCode::NO_CONTENT)
}
