mod health;
mod pdf;
mod preview;
mod themes;
mod upload;

pub use health::health;
pub use pdf::generate_pdf;
pub use preview::preview;
pub use themes::list_themes;
pub use upload::{UploadError, upload_file};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Decode a JSON body so malformed input surfaces as our 400 envelope.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request("Invalid request body", Some(err.to_string())))
}

/// Reject empty or oversized Markdown before any rendering work.
fn validate_markdown(markdown: &str, max_bytes: u64) -> Result<(), ApiError> {
    if markdown.is_empty() {
        return Err(ApiError::bad_request(
            "Markdown content is required",
            None,
        ));
    }
    ensure_within_limit(markdown, max_bytes)
}

fn ensure_within_limit(markdown: &str, max_bytes: u64) -> Result<(), ApiError> {
    if markdown.len() as u64 > max_bytes {
        return Err(ApiError::bad_request(
            "Markdown content is too large",
            Some(format!("Content exceeds maximum size of {max_bytes} bytes")),
        ));
    }
    Ok(())
}
