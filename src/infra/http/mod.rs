//! HTTP surface: JSON API, embedded editor bundle and shared middleware.

pub mod api;
mod middleware;

pub use api::{ApiState, UploadError, build_api_router};
pub use middleware::REQUEST_ID_HEADER;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, header},
    middleware as axum_middleware,
    routing::get,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};

use crate::infra::assets::{serve_index, serve_public};
use middleware::{log_responses, set_request_context};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; img-src 'self' data: https:; \
style-src 'self' 'unsafe-inline'; frame-src 'none'; object-src 'none'";

/// Room for multipart framing and JSON escaping on top of the file ceiling.
const BODY_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub max_file_bytes: u64,
    pub permissive_cors: bool,
}

impl RouterOptions {
    fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_bytes)
            .unwrap_or(usize::MAX)
            .saturating_mul(2)
            .saturating_add(BODY_OVERHEAD_BYTES)
    }
}

pub fn build_router(state: ApiState, options: RouterOptions) -> Router {
    let static_routes = Router::new()
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_public));

    let router = build_api_router(state)
        .merge(static_routes)
        .layer(DefaultBodyLimit::max(options.body_limit()))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .layer(security_header(
            header::CONTENT_SECURITY_POLICY,
            CONTENT_SECURITY_POLICY,
        ))
        .layer(security_header(header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(security_header(
            header::REFERRER_POLICY,
            "strict-origin-when-cross-origin",
        ));

    if options.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn security_header(
    name: HeaderName,
    value: &'static str,
) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}
