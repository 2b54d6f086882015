//! Rules for Markdown files accepted by the upload endpoint.

use super::error::DomainError;

/// Extensions accepted for uploaded documents, lowercase and with the dot.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".md", ".markdown", ".txt"];

/// Default ceiling on uploaded file size.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 25 * 1024 * 1024;

/// Lowercased extension of `filename`, taken from its last dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let index = filename.rfind('.')?;
    Some(filename[index..].to_ascii_lowercase())
}

/// Check that `filename` carries one of [`ACCEPTED_EXTENSIONS`].
pub fn validate_filename(filename: &str) -> Result<(), DomainError> {
    match extension_of(filename) {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(DomainError::unsupported("file extension", filename)),
    }
}

/// Whole megabytes shown to users when describing a size ceiling.
pub fn megabytes(bytes: u64) -> u64 {
    bytes.div_ceil(1024 * 1024)
}
