use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Response, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use ebookify_core::filename::download_filename;
use ebookify_core::models::JobStatus;
use ebookify_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// View mode: serve inline for the built-in reader instead of as an
    /// attachment
    #[serde(default)]
    pub view: bool,
}

#[utoipa::path(
    get,
    path = "/conversion/download/{job_id}",
    tag = "conversion",
    params(
        ("job_id" = Uuid, Path, description = "Job ID returned by the upload endpoint"),
        ("view" = Option<bool>, Query, description = "Serve inline instead of as an attachment")
    ),
    responses(
        (status = 200, description = "Converted plain text", content_type = "text/plain"),
        (status = 404, description = "Job absent, not complete, or asset missing", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(job_id = %job_id, view = query.view))]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let not_available = || AppError::NotFound("Download not available".to_string());

    let job = state
        .store
        .get(job_id)
        .await
        .filter(|job| !job.is_expired(Utc::now()))
        .filter(|job| job.status == JobStatus::Complete)
        .ok_or_else(not_available)?;

    let output_path = job.output_path.as_ref().ok_or_else(not_available)?;

    let content = match tokio::fs::read(output_path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                error = %e,
                job_id = %job_id,
                path = %output_path.display(),
                "Output asset missing for complete job"
            );
            return Err(not_available().into());
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8");

    if !query.view {
        let name = download_filename(&job.original_filename);
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        );
    }

    // Download requests arm the delete-after-serve timer; view requests only
    // when configured to
    if !query.view || state.config.delete_after_view {
        state.cleanup.schedule_delete_after_serve(job_id);
    }

    tracing::info!(
        job_id = %job_id,
        size_bytes = content.len(),
        view = query.view,
        "Serving conversion result"
    );

    builder
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
