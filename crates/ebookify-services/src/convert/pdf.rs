//! PDF text-layer extraction backend.
//!
//! Pulls the embedded text layer straight out of the PDF. Fast and
//! dependency-free at runtime, but useless for scanned documents, which is
//! why the router keeps a CLI fallback behind it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{ConvertError, ConvertResult, TextConverter};

#[derive(Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextConverter for PdfTextExtractor {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        let start = std::time::Instant::now();
        let input_owned: PathBuf = input.to_path_buf();

        // pdf-extract is synchronous and can chew CPU on large documents
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&input_owned))
            .await
            .map_err(|e| ConvertError::Failed(format!("Extraction task failed: {}", e)))?
            .map_err(|e| ConvertError::Failed(format!("PDF text extraction failed: {}", e)))?;

        if text.trim().is_empty() {
            return Err(ConvertError::Failed(
                "PDF has no extractable text layer".to_string(),
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
            "PDF text layer extracted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_invalid_pdf_reports_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bogus.pdf");
        std::fs::write(&input, b"this is not a pdf").unwrap();

        let result = PdfTextExtractor::new()
            .convert(&input, &dir.path().join("out.txt"))
            .await;
        assert!(matches!(result, Err(ConvertError::Failed(_))));
    }

    #[tokio::test]
    async fn test_missing_input_reports_failure() {
        let dir = tempdir().unwrap();
        let result = PdfTextExtractor::new()
            .convert(&dir.path().join("absent.pdf"), &dir.path().join("out.txt"))
            .await;
        assert!(result.is_err());
    }
}
