use axum::Json;
use axum::extract::State;

use crate::infra::http::api::models::ThemeListResponse;
use crate::infra::http::api::state::ApiState;

pub async fn list_themes(State(state): State<ApiState>) -> Json<ThemeListResponse> {
    Json(ThemeListResponse {
        themes: state.themes.list_themes(),
    })
}
