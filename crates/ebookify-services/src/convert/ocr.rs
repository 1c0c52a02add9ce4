//! OCR.space backend for image inputs.
//!
//! Images carry no text layer, so they go through the hosted OCR API. The
//! whole exchange is one multipart POST; the parsed text is written to the
//! output path like any other backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::{ConvertError, ConvertResult, TextConverter};

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct OcrSpaceConverter {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// String or array of strings depending on the failure
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrSpaceConverter {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client for OCR.space: {}", e))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    fn mime_for(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
            .as_str()
        {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "tif" | "tiff" => "image/tiff",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }

    fn flatten_error(value: Option<serde_json::Value>) -> String {
        match value {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unspecified OCR error".to_string(),
        }
    }
}

#[async_trait]
impl TextConverter for OcrSpaceConverter {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        let start = std::time::Instant::now();

        let data = tokio::fs::read(input).await?;
        let file_name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name)
            .mime_str(Self::mime_for(input))
            .map_err(|e| ConvertError::Failed(format!("Invalid MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", "eng")
            .text("isOverlayRequired", "false")
            .text("scale", "true");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::Failed(format!("OCR request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::Failed(format!(
                "OCR service returned HTTP {}",
                status
            )));
        }

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| ConvertError::Failed(format!("Invalid OCR response: {}", e)))?;

        if body.is_errored_on_processing {
            return Err(ConvertError::Failed(format!(
                "OCR processing failed: {}",
                Self::flatten_error(body.error_message)
            )));
        }

        let text = body
            .parsed_results
            .iter()
            .map(|r| r.parsed_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ConvertError::Failed(
                "OCR recognized no text in the image".to_string(),
            ));
        }

        let mut file = tokio::fs::File::create(output).await?;
        file.write_all(text.as_bytes()).await?;
        file.sync_all().await?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            text_bytes = text.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "OCR succeeded"
        );

        Ok(())
    }
}
