//! Application wiring: state construction, routes, and server startup.

pub mod routes;
pub mod server;

use anyhow::Result;
use axum::Router;
use std::sync::Arc;

use ebookify_core::Config;
use ebookify_services::{
    CleanupService, ConversionPipeline, EbookConvertCli, ExtensionRouter, OcrSpaceConverter,
    PdfTextExtractor, TextConverter,
};
use ebookify_store::{AssetArea, JobStore};

use crate::state::AppState;

/// Build the real converter stack from configuration: PDF text layer with a
/// Calibre fallback, and OCR.space for images when a key is configured.
pub fn build_converter(config: &Config) -> Result<Arc<dyn TextConverter>> {
    let pdf: Arc<dyn TextConverter> = Arc::new(PdfTextExtractor::new());
    let pdf_fallback: Arc<dyn TextConverter> =
        Arc::new(EbookConvertCli::new(config.ebook_convert_path.clone()));

    let image: Option<Arc<dyn TextConverter>> = match &config.ocr_space_api_key {
        Some(api_key) => Some(Arc::new(OcrSpaceConverter::new(
            api_key.clone(),
            config.ocr_space_endpoint.clone(),
        )?)),
        None => {
            tracing::info!("OCR_SPACE_API_KEY not set; image uploads will be rejected at conversion time");
            None
        }
    };

    Ok(Arc::new(ExtensionRouter::new(
        pdf,
        Some(pdf_fallback),
        image,
    )))
}

/// Initialize the application: open the store and asset area, wire the
/// services, and build the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let store = JobStore::open(&config.work_dir).await?;
    let assets = AssetArea::new(&config.work_dir).await?;

    let converter = build_converter(&config)?;
    let pipeline = ConversionPipeline::new(
        store.clone(),
        assets.clone(),
        converter,
        config.progress_tick(),
    );
    let cleanup = Arc::new(CleanupService::new(
        store.clone(),
        assets.clone(),
        config.job_ttl_std(),
        config.download_grace(),
    ));

    let state = Arc::new(AppState {
        store,
        assets,
        pipeline,
        cleanup,
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}
