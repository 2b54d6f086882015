use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use thiserror::Error;
use tracing::info;

use crate::domain::uploads::{self, ACCEPTED_EXTENSIONS};
use crate::infra::http::api::error::{ApiError, codes};
use crate::infra::http::api::models::UploadResponse;
use crate::infra::http::api::state::ApiState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no `file` field in upload")]
    Missing,
    #[error("unsupported extension on `{0}`")]
    UnsupportedExtension(String),
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("invalid multipart form data")]
    InvalidFormData(#[source] MultipartError),
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Missing => ApiError::bad_request(
                "No file provided. Please upload a markdown file.",
                None,
            ),
            UploadError::UnsupportedExtension(filename) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_FILE_TYPE,
                "Invalid file type. Supported formats: .md, .markdown, .txt",
                Some(format!("`{filename}` is not one of {}", ACCEPTED_EXTENSIONS.join(", "))),
            ),
            UploadError::TooLarge { limit } => ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::FILE_TOO_LARGE,
                "File exceeds the maximum upload size",
                Some(format!("Maximum size is {}MB", uploads::megabytes(limit))),
            ),
            UploadError::InvalidFormData(err) => {
                ApiError::bad_request("Invalid multipart payload", Some(err.body_text()))
            }
        }
    }
}

fn form_error(err: MultipartError, limit: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::InvalidFormData(err)
    }
}

/// Accept one Markdown file and echo its text back to the editor.
pub async fn upload_file(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let limit = state.max_file_bytes;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| form_error(err, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if uploads::validate_filename(&filename).is_err() {
            return Err(UploadError::UnsupportedExtension(filename).into());
        }

        let mut buffer = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(|err| form_error(err, limit))? {
            if (buffer.len() + chunk.len()) as u64 > limit {
                return Err(UploadError::TooLarge { limit }.into());
            }
            buffer.extend_from_slice(&chunk);
        }

        let size = buffer.len();
        let content = String::from_utf8_lossy(&buffer).into_owned();
        info!(
            target = "infra::http::api::upload",
            filename = %filename,
            size,
            "file uploaded"
        );

        return Ok(Json(UploadResponse {
            filename,
            content,
            size,
        }));
    }

    Err(UploadError::Missing.into())
}
