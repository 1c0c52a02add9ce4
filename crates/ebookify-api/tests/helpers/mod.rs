//! Test helpers: build AppState and router for integration tests.
//!
//! No external services are needed; the store is a file in a tempdir and
//! the converter is a scripted double injected at the pipeline seam.

use async_trait::async_trait;
use axum_test::TestServer;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use ebookify_api::setup::routes;
use ebookify_api::state::AppState;
use ebookify_core::Config;
use ebookify_services::{
    CleanupService, ConversionPipeline, ConvertError, ConvertResult, TextConverter,
};
use ebookify_store::{AssetArea, JobStore};

/// Scripted converter behaviors for driving the pipeline from tests.
#[derive(Clone)]
pub enum ConverterScript {
    /// Write fixed text to the output path
    Succeed(&'static str),
    /// Copy the input bytes to the output path (distinguishes jobs)
    Echo,
    /// Fail with the given message
    Fail(&'static str),
    /// Sleep, then write fixed text
    Delay(Duration, &'static str),
}

pub struct ScriptedConverter {
    script: ConverterScript,
}

#[async_trait]
impl TextConverter for ScriptedConverter {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        match &self.script {
            ConverterScript::Succeed(text) => {
                tokio::fs::write(output, text).await?;
                Ok(())
            }
            ConverterScript::Echo => {
                let data = tokio::fs::read(input).await?;
                tokio::fs::write(output, data).await?;
                Ok(())
            }
            ConverterScript::Fail(message) => Err(ConvertError::Failed(message.to_string())),
            ConverterScript::Delay(delay, text) => {
                tokio::time::sleep(*delay).await;
                tokio::fs::write(output, text).await?;
                Ok(())
            }
        }
    }
}

/// Test application: server plus direct handles on the underlying state.
pub struct TestApp {
    pub server: TestServer,
    pub store: JobStore,
    pub assets: AssetArea,
    pub config: Config,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config(work_dir: &Path) -> Config {
    Config {
        server_port: 3000,
        work_dir: work_dir.to_path_buf(),
        max_file_size_bytes: 5 * 1024 * 1024,
        allowed_extensions: ["pdf", "jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        allowed_content_types: [
            "application/pdf",
            "image/jpeg",
            "image/png",
            "image/tiff",
            "image/bmp",
            "image/webp",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        job_ttl_secs: 3600,
        cleanup_interval_secs: 3600,
        // Fast ticks so progress moves during short test conversions
        progress_tick_ms: 20,
        download_grace_secs: 0,
        delete_after_view: false,
        ebook_convert_path: "ebook-convert".to_string(),
        ocr_space_api_key: None,
        ocr_space_endpoint: "https://api.ocr.space/parse/image".to_string(),
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
    }
}

/// Setup a test app with the given converter script and a grace delay in
/// milliseconds for delete-after-serve.
pub async fn setup_test_app_with(script: ConverterScript, grace_ms: u64) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = test_config(temp_dir.path());

    let store = JobStore::open(&config.work_dir)
        .await
        .expect("Failed to open job store");
    let assets = AssetArea::new(&config.work_dir)
        .await
        .expect("Failed to create asset area");

    let converter: Arc<dyn TextConverter> = Arc::new(ScriptedConverter { script });
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
        Duration::from_millis(grace_ms),
    ));

    let state = Arc::new(AppState {
        store: store.clone(),
        assets: assets.clone(),
        pipeline,
        cleanup,
        config: config.clone(),
    });

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        assets,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ConverterScript::Succeed("Extracted text content"), 50).await
}

/// Poll the status endpoint until the job reaches a terminal state.
pub async fn poll_until_terminal(app: &TestApp, job_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = app
            .client()
            .get(&format!("/conversion/status/{}", job_id))
            .await;
        assert_eq!(response.status_code(), 200);
        let body: serde_json::Value = response.json();
        let status = body.get("status").and_then(|s| s.as_str()).unwrap();
        if status == "complete" || status == "error" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("Job {} never reached a terminal state", job_id);
}
