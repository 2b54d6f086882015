//! Embedded static asset serving for the editor bundle and theme stylesheets.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::{Mime, MimeGuess};

use crate::application::error::ErrorReport;

static STATIC_PUBLIC_ASSETS: Dir<'_> = include_dir!("$OUT_DIR/static_public");

const INDEX_DOCUMENT: &str = "index.html";
const SOURCE: &str = "infra::assets::serve_public";

/// Serve the editor page at `/`.
pub async fn serve_index() -> Response {
    serve_static(&STATIC_PUBLIC_ASSETS, Some(INDEX_DOCUMENT.to_string()))
}

/// Serve embedded public static assets.
pub async fn serve_public(path: Option<Path<String>>) -> Response {
    serve_static(&STATIC_PUBLIC_ASSETS, path.map(|Path(value)| value))
}

/// Look up an embedded asset by its path relative to the bundle root.
pub fn embedded_asset(path: &str) -> Option<&'static [u8]> {
    STATIC_PUBLIC_ASSETS.get_file(path).map(|file| file.contents())
}

fn serve_static(bundle: &'static Dir<'static>, path: Option<String>) -> Response {
    match resolve_asset(bundle, path) {
        Some(asset) => asset.into_response(),
        None => not_found_response(),
    }
}

fn not_found_response() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(SOURCE, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

struct Asset {
    contents: &'static [u8],
    mime: MimeGuess,
}

fn resolve_asset(bundle: &'static Dir<'static>, path: Option<String>) -> Option<Asset> {
    let candidate = path.unwrap_or_default();
    let candidate = candidate.trim_start_matches('/');

    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        // No traversal and no directory listings.
        return None;
    }

    let file = bundle.get_file(candidate)?;
    Some(Asset {
        contents: file.contents(),
        mime: mime_guess::from_path(candidate),
    })
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        build_response(
            Bytes::from_static(self.contents),
            self.mime.first_or_octet_stream(),
        )
    }
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let is_document = mime.essence_str() == "text/html";
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    let cache_control = if is_document {
        "no-cache"
    } else {
        "public, max-age=3600"
    };
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    response
}
