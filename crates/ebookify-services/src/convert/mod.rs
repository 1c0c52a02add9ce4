//! Conversion boundary.
//!
//! The lifecycle pipeline only ever sees [`TextConverter`]: one call per
//! job, opaque beyond success or failure. The concrete backends live in the
//! submodules; [`ExtensionRouter`] picks one by input extension and is also
//! the seam where tests inject doubles.

mod calibre;
mod ocr;
mod pdf;

pub use calibre::EbookConvertCli;
pub use ocr::OcrSpaceConverter;
pub use pdf::PdfTextExtractor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Conversion operation errors
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Conversion failed: {0}")]
    Failed(String),

    #[error("Converter reported success but produced no output file")]
    MissingOutput,

    #[error("Unsupported input format: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for conversion operations
pub type ConvertResult<T> = Result<T, ConvertError>;

/// The single call contract between the job manager and the extraction
/// engine: read `input`, write plain text to `output`, report success or
/// failure. Elapsed time and logging are the implementation's business.
#[async_trait]
pub trait TextConverter: Send + Sync {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()>;
}

/// Routes a conversion to a backend by input extension.
///
/// PDFs go to the text-layer extractor first and fall back to the CLI
/// converter (scanned PDFs have no text layer); images need an OCR backend
/// and are rejected when none is configured.
pub struct ExtensionRouter {
    pdf: Arc<dyn TextConverter>,
    pdf_fallback: Option<Arc<dyn TextConverter>>,
    image: Option<Arc<dyn TextConverter>>,
}

impl ExtensionRouter {
    pub fn new(
        pdf: Arc<dyn TextConverter>,
        pdf_fallback: Option<Arc<dyn TextConverter>>,
        image: Option<Arc<dyn TextConverter>>,
    ) -> Self {
        Self {
            pdf,
            pdf_fallback,
            image,
        }
    }
}

#[async_trait]
impl TextConverter for ExtensionRouter {
    async fn convert(&self, input: &Path, output: &Path) -> ConvertResult<()> {
        let extension = input
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => match self.pdf.convert(input, output).await {
                Ok(()) => Ok(()),
                Err(primary_err) => match &self.pdf_fallback {
                    Some(fallback) => {
                        tracing::info!(
                            error = %primary_err,
                            input = %input.display(),
                            "Text-layer extraction failed, falling back to CLI converter"
                        );
                        fallback.convert(input, output).await
                    }
                    None => Err(primary_err),
                },
            },
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "bmp" | "webp" => match &self.image {
                Some(converter) => converter.convert(input, output).await,
                None => Err(ConvertError::Unsupported(
                    "image input requires an OCR backend (set OCR_SPACE_API_KEY)".to_string(),
                )),
            },
            other => Err(ConvertError::Unsupported(other.to_string())),
        }
    }
}
