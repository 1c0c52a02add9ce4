use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use ebookify_core::models::StatusResponse;
use ebookify_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/conversion/status/{job_id}",
    tag = "conversion",
    params(
        ("job_id" = Uuid, Path, description = "Job ID returned by the upload endpoint")
    ),
    responses(
        (status = 200, description = "Current job state", body = StatusResponse),
        (status = 404, description = "Unknown or expired job", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(job_id = %job_id))]
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, HttpAppError> {
    // An expired record reads as absent: expiry must not be observable as a
    // distinct outcome, and the read path cannot rely on the collector's
    // cadence
    let job = state
        .store
        .get(job_id)
        .await
        .filter(|job| !job.is_expired(Utc::now()))
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    Ok(Json(StatusResponse::from(job)))
}
