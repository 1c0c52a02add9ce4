//! eBookify Services Layer
//!
//! This crate is the **business service layer**: the conversion boundary
//! (a trait plus the real text-extraction backends), the per-job lifecycle
//! pipeline that drives a job through its state machine, and the retention
//! collector that bounds storage growth. Keep coordination here; keep thin
//! HTTP handling in ebookify-api.

pub mod cleanup;
pub mod convert;
pub mod pipeline;

// Re-export commonly used types
pub use cleanup::{CleanupReport, CleanupService};
pub use convert::{
    ConvertError, ConvertResult, EbookConvertCli, ExtensionRouter, OcrSpaceConverter,
    PdfTextExtractor, TextConverter,
};
pub use pipeline::ConversionPipeline;
