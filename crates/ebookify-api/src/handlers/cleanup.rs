use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use ebookify_core::models::CleanupResponse;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/conversion/cleanup",
    tag = "conversion",
    responses(
        (status = 200, description = "Reclamation report", body = CleanupResponse)
    )
)]
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CleanupResponse>, HttpAppError> {
    let report = state.cleanup.run_once(Utc::now()).await;

    Ok(Json(CleanupResponse {
        files_deleted: report.files_deleted,
        jobs_deleted: report.jobs_deleted,
        jobs_remaining: report.jobs_remaining,
    }))
}
