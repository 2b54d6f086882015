use std::str::FromStr;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::info;

use super::{parse_json, validate_markdown};
use crate::application::pdf::{PdfError, PdfRequest};
use crate::domain::themes::ThemeId;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::PdfRequestBody;
use crate::infra::http::api::state::ApiState;

const PDF_DISPOSITION: &str = "attachment; filename=\"document.pdf\"";

pub async fn generate_pdf(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let body: PdfRequestBody = parse_json(&body)?;
    validate_markdown(&body.markdown, state.max_file_bytes)?;
    let theme =
        ThemeId::from_str(&body.theme).map_err(|_| PdfError::UnknownTheme(body.theme.clone()))?;
    let options = body.options.unwrap_or_default();

    info!(
        target = "infra::http::api::pdf",
        theme = %theme,
        page_size = %options.page_size,
        bytes = body.markdown.len(),
        "starting PDF generation"
    );

    let pdf = state
        .pdf
        .generate(PdfRequest {
            markdown: body.markdown,
            theme,
            options,
        })
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, PDF_DISPOSITION),
        ],
        pdf,
    )
        .into_response())
}
