//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use ebookify_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "eBookify API",
        version = "0.1.0",
        description = "Upload a PDF or image, convert it to plain text, and download or view the result. Jobs and their files expire one hour after creation."
    ),
    paths(
        handlers::upload::upload,
        handlers::status::status,
        handlers::download::download,
        handlers::cleanup::cleanup,
    ),
    components(schemas(
        models::UploadResponse,
        models::StatusResponse,
        models::CleanupResponse,
        models::JobStatus,
        error::ErrorResponse,
    )),
    tags(
        (name = "conversion", description = "Conversion job lifecycle")
    )
)]
pub struct ApiDoc;
