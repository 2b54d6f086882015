pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use handlers::UploadError;
pub use state::ApiState;

use axum::{
    Router,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/themes", get(handlers::list_themes))
        .route("/api/upload", post(handlers::upload_file))
        .route("/api/preview", post(handlers::preview))
        .route("/api/pdf", post(handlers::generate_pdf))
        .with_state(state)
}
