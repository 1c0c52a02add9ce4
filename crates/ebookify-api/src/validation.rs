//! Validation utilities for the upload handler.

use std::path::Path;

use ebookify_core::AppError;

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Validate file extension against the allow-list. Returns the normalized
/// (lowercased) extension.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    if extension.is_empty() || extension == filename.to_lowercase() || !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

/// Normalize MIME type by stripping parameters (e.g. "application/pdf; v=1" -> "application/pdf").
fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Validate content type against allowlist. Compares normalized MIME type only.
pub fn validate_content_type(content_type: &str, allowed_types: &[String]) -> Result<(), AppError> {
    let normalized = normalize_mime_type(content_type).to_lowercase();
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(AppError::InvalidInput(format!(
            "Invalid content type. Allowed types: {}",
            allowed_types.join(", ")
        )));
    }
    Ok(())
}

/// Validate that Content-Type matches the file extension.
/// This prevents Content-Type spoofing where malicious files are uploaded
/// with legitimate Content-Types.
pub fn validate_extension_content_type_match(
    filename: &str,
    content_type: &str,
) -> Result<(), AppError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension.is_empty() {
        return Err(AppError::InvalidInput(
            "File must have an extension".to_string(),
        ));
    }

    let normalized_content_type = normalize_mime_type(content_type).to_lowercase();

    let expected_content_types: Vec<&str> = match extension.as_str() {
        "pdf" => vec!["application/pdf"],
        "jpg" | "jpeg" => vec!["image/jpeg"],
        "png" => vec!["image/png"],
        "tif" | "tiff" => vec!["image/tiff"],
        "bmp" => vec!["image/bmp", "image/x-ms-bmp"],
        "webp" => vec!["image/webp"],
        _ => {
            // Unknown extensions are still validated individually against the
            // allow-lists; only the cross-check is skipped
            tracing::debug!(
                extension = %extension,
                content_type = %content_type,
                "Unknown extension, skipping Content-Type/extension cross-validation"
            );
            return Ok(());
        }
    };

    if !expected_content_types
        .iter()
        .any(|ct| normalized_content_type == *ct)
    {
        return Err(AppError::InvalidInput(format!(
            "Content-Type '{}' does not match extension '{}'. Expected one of: {}",
            content_type,
            extension,
            expected_content_types.join(", ")
        )));
    }

    Ok(())
}
