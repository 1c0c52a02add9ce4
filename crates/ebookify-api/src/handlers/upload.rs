use crate::error::{ErrorResponse, HttpAppError};
use crate::multipart::extract_multipart_file;
use crate::state::AppState;
use crate::validation::{
    validate_content_type, validate_extension_content_type_match, validate_file_extension,
    validate_file_size,
};
use axum::{
    extract::{Multipart, State},
    Json,
};
use ebookify_core::filename::sanitize_filename;
use ebookify_core::models::{Job, UploadResponse};
use ebookify_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/conversion/upload",
    tag = "conversion",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion job accepted", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let (data, original_filename, content_type) = extract_multipart_file(multipart).await?;

    // Input errors surface synchronously; no job is created for them
    if data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()).into());
    }
    validate_file_size(data.len(), state.config.max_file_size_bytes)?;

    let safe_filename = sanitize_filename(&original_filename)?;
    let extension = validate_file_extension(&safe_filename, &state.config.allowed_extensions)?;
    validate_content_type(&content_type, &state.config.allowed_content_types)?;
    validate_extension_content_type_match(&safe_filename, &content_type)?;

    let id = Uuid::new_v4();
    let input_path = state
        .assets
        .save_input(id, &extension, &data)
        .await
        .map_err(HttpAppError::from)?;

    let job = Job::new(id, safe_filename.clone(), input_path, state.config.job_ttl());
    if let Err(e) = state.store.put(job.clone()).await {
        // The record never existed; drop the just-written asset instead of
        // leaving an orphan for the sweep
        state.assets.delete_for_id(id).await;
        return Err(HttpAppError::from(e));
    }

    // Fire-and-forget: the client polls the status endpoint from here on
    state.pipeline.spawn(job);

    tracing::info!(
        job_id = %id,
        filename = %safe_filename,
        content_type = %content_type,
        size_bytes = data.len(),
        "Conversion job accepted"
    );

    Ok(Json(UploadResponse { job_id: id }))
}
