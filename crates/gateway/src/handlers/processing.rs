//! Pipeline triggers and job status

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::AppState;
use scriptorium_common::{
    errors::Result,
    models::{JobOutcome, ProcessingJob},
};

/// Run the PDF pipeline for an article that already has a PDF
pub async fn process_pdf(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<JobOutcome>> {
    let outcome = state.pdf.process_pdf(article_id).await?;
    tracing::info!(article_id = %article_id, job_id = %outcome.job_id, status = %outcome.status, "PDF processed");
    Ok(Json(outcome))
}

/// Transcribe the stored audio of a message
pub async fn process_audio(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<Json<JobOutcome>> {
    let outcome = state.audio.process_message_audio(message_id).await?;
    tracing::info!(message_id = %message_id, job_id = %outcome.job_id, status = %outcome.status, "Audio processed");
    Ok(Json(outcome))
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ProcessingJob>> {
    Ok(Json(state.store.get_job(job_id).await?))
}
