//! Calibre `ebook-convert` backend.
//!
//! Shells out to the Calibre CLI, which infers the target format from the
//! output extension. Used as the fallback for PDFs whose text layer yields
//! nothing (typically scans wrapped in a PDF container).

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{ConvertError, ConvertResult, TextConverter};

/// Heuristic flags tuned for book-like sources.
const CONVERT_ARGS: &[&str] = &[
    "--enable-heuristics",
    "--chapter-mark=pagebreak",
    "--page-breaks-before=/",
    "--max-toc-links=0",
    "--pretty-print",
];

/// Cap on stderr carried into the job's error message.
const MAX_STDERR_LEN: usize = 512;

pub struct EbookConvertCli {
    binary: String,
}

impl EbookConvertCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl TextConverter for EbookConvertCli {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        let start = std::time::Instant::now();

        let cmd_output = Command::new(&self.binary)
            .arg(input)
            .arg(output)
            .args(CONVERT_ARGS)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ConvertError::Failed(format!("Failed to execute {}: {}", self.binary, e))
            })?;

        if !cmd_output.status.success() {
            let stderr = String::from_utf8_lossy(&cmd_output.stderr);
            let mut message = stderr.trim().to_string();
            if message.len() > MAX_STDERR_LEN {
                let mut end = MAX_STDERR_LEN;
                while !message.is_char_boundary(end) {
                    end -= 1;
                }
                message.truncate(end);
            }
            return Err(ConvertError::Failed(format!(
                "{} exited with {}: {}",
                self.binary, cmd_output.status, message
            )));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(ConvertError::MissingOutput);
        }

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ebook-convert succeeded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_binary_reports_failure() {
        let converter = EbookConvertCli::new("ebookify-test-no-such-binary");
        let result = converter
            .convert(
                &PathBuf::from("/tmp/in.pdf"),
                &PathBuf::from("/tmp/out.txt"),
            )
            .await;
        match result {
            Err(ConvertError::Failed(msg)) => {
                assert!(msg.contains("ebookify-test-no-such-binary"));
            }
            other => panic!("Expected Failed, got {:?}", other.map(|_| ())),
        }
    }
}
