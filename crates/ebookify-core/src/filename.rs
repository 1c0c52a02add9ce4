//! Filename handling: ingest sanitation and download-name derivation.
//!
//! User-supplied filenames are untrusted. They are sanitized once at upload
//! time and the stored value is the only form ever placed in a response
//! header.

use crate::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Fallback download name when nothing of the original survives sanitation.
pub const FALLBACK_DOWNLOAD_NAME: &str = "converted";

/// Sanitize a user-supplied filename to prevent path traversal and invalid
/// characters. Returns an error if the filename contains path traversal
/// attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// Derive the download name for converted output: strip the original
/// extension, keep only ASCII header-safe characters, append the target
/// extension. The result is always safe to embed directly in a
/// Content-Disposition header.
pub fn download_filename(original: &str) -> String {
    let base = match original.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => original,
    };

    let safe: String = base
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect();
    let safe = safe.trim().to_string();

    let stem = if safe.is_empty() {
        FALLBACK_DOWNLOAD_NAME
    } else {
        safe.as_str()
    };

    format!("{}.{}", stem, crate::constants::OUTPUT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo/../bar").is_err());
        assert!(sanitize_filename("....").is_err());
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("scan.pdf").unwrap(), "scan.pdf");
        assert_eq!(sanitize_filename("my-file_1.png").unwrap(), "my-file_1.png");
    }

    #[test]
    fn sanitize_filename_strips_directories() {
        assert_eq!(
            sanitize_filename("/etc/secrets/report.pdf").unwrap(),
            "report.pdf"
        );
    }

    #[test]
    fn sanitize_filename_replaces_odd_characters() {
        assert_eq!(sanitize_filename("a b?c.pdf").unwrap(), "a_b_c.pdf");
    }

    #[test]
    fn download_filename_strips_extension_and_appends_txt() {
        assert_eq!(download_filename("report.pdf"), "report.txt");
        assert_eq!(download_filename("photo.scan.jpeg"), "photo.scan.txt");
    }

    #[test]
    fn download_filename_strips_non_ascii() {
        assert_eq!(download_filename("résumé.pdf"), "rsum.txt");
        assert_eq!(download_filename("日本語.pdf"), "converted.txt");
    }

    #[test]
    fn download_filename_handles_missing_extension() {
        assert_eq!(download_filename("notes"), "notes.txt");
        assert_eq!(download_filename(""), "converted.txt");
    }

    #[test]
    fn download_filename_is_header_safe() {
        let name = download_filename("we\"ird\\na;me\r\n.pdf");
        assert!(name.chars().all(|c| c.is_ascii_graphic() || c == ' '));
        assert!(!name.contains('"'));
        assert!(!name.contains('\\'));
    }
}
