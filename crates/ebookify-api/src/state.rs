//! Application state shared across handlers.

use std::sync::Arc;

use ebookify_core::Config;
use ebookify_services::{CleanupService, ConversionPipeline};
use ebookify_store::{AssetArea, JobStore};

/// Main application state: the store, the asset area, and the services
/// driving them. Cloned cheaply into every handler via `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub assets: AssetArea,
    pub pipeline: ConversionPipeline,
    pub cleanup: Arc<CleanupService>,
    pub config: Config,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
