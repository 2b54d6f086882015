use axum::Json;
use axum::extract::State;
use bytes::Bytes;

use super::{ensure_within_limit, parse_json};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{PreviewRequest, PreviewResponse};
use crate::infra::http::api::state::ApiState;

/// Sanitized HTML for the editor's live preview pane.
pub async fn preview(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<PreviewResponse>, ApiError> {
    let request: PreviewRequest = parse_json(&body)?;
    ensure_within_limit(&request.markdown, state.max_file_bytes)?;

    let html = state.renderer.render_sanitized(&request.markdown)?;
    Ok(Json(PreviewResponse { html }))
}
