//! Wire shapes for the JSON API.

use serde::{Deserialize, Serialize};

use crate::domain::{print::PrintOptions, themes::Theme};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ThemeListResponse {
    pub themes: &'static [Theme],
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewRequest {
    pub markdown: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// Body of `POST /api/pdf`. The theme stays a string until validated so an
/// unknown id reports as such rather than as a schema error.
#[derive(Debug, Deserialize)]
pub struct PdfRequestBody {
    pub markdown: String,
    pub theme: String,
    #[serde(default)]
    pub options: Option<PrintOptions>,
}
