//! Word export handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use scriptorium_common::{
    errors::{AppError, Result},
    models::{JobKind, JobOutcome, ProcessingJob},
};
use scriptorium_export::ExportRequest;

#[derive(Debug, Validate)]
struct ExportTitle {
    #[validate(length(max = 1000))]
    title: String,
}

pub async fn export_word(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<JobOutcome>> {
    if let Some(title) = &request.title {
        ExportTitle {
            title: title.clone(),
        }
        .validate()?;
    }

    let outcome = state.export.generate_document(request).await?;
    tracing::info!(job_id = %outcome.job_id, status = %outcome.status, "Export finished");
    Ok(Json(outcome))
}

/// Export jobs only; other job kinds are not visible here
pub async fn export_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ProcessingJob>> {
    let job = state.store.get_job(job_id).await?;
    if job.kind != JobKind::Export {
        return Err(AppError::JobNotFound {
            id: job_id.to_string(),
        });
    }
    Ok(Json(job))
}
