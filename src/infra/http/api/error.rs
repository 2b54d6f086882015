use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::pdf::PdfError;
use crate::application::render::RenderError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const INVALID_FILE_TYPE: &str = "invalid_file_type";
    pub const FILE_TOO_LARGE: &str = "file_too_large";
    pub const UNKNOWN_THEME: &str = "unknown_theme";
    pub const RENDER_TIMEOUT: &str = "render_timeout";
    pub const TOO_MANY_PENDING: &str = "too_many_pending";
    pub const RENDER: &str = "render_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// JSON error response. `detail` is logged by the middleware and never sent
/// to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    detail: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            detail: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn internal(error: &dyn std::error::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Internal server error",
            None,
        )
        .with_detail(error)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn with_detail(mut self, error: &dyn std::error::Error) -> Self {
        let report = ErrorReport::from_error("infra::http::api", self.status, error);
        self.detail = Some(report.messages);
        self
    }
}

impl From<PdfError> for ApiError {
    fn from(error: PdfError) -> Self {
        match &error {
            PdfError::UnknownTheme(id) => ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::UNKNOWN_THEME,
                "Unknown theme",
                Some(format!("`{id}` is not an available theme")),
            ),
            PdfError::TooManyPending => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::TOO_MANY_PENDING,
                "Too many pending PDF requests",
                Some("Try again in a few seconds".to_string()),
            ),
            PdfError::RenderTimeout { phase } => ApiError::new(
                StatusCode::REQUEST_TIMEOUT,
                codes::RENDER_TIMEOUT,
                "PDF generation timed out",
                Some(format!("The {phase} phase took too long")),
            ),
            PdfError::Stylesheet(_)
            | PdfError::Markdown(_)
            | PdfError::Browser(_)
            | PdfError::Template(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                "PDF generation failed",
                None,
            ),
        }
        .with_detail(&error)
    }
}

impl From<RenderError> for ApiError {
    fn from(error: RenderError) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::RENDER,
            "Markdown could not be rendered",
            None,
        )
        .with_detail(&error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let diagnostic = match self.detail {
            Some(messages) => messages,
            None => vec![format!(
                "{}: {}",
                self.code,
                self.hint.as_deref().unwrap_or(self.message)
            )],
        };
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // The middleware pops this to log the full chain.
        ErrorReport {
            source: "infra::http::api",
            status: self.status,
            messages: diagnostic,
        }
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pdf::TimeoutPhase;

    #[test]
    fn pdf_errors_map_to_documented_statuses() {
        let timeout = ApiError::from(PdfError::RenderTimeout {
            phase: TimeoutPhase::ContentLoad,
        });
        assert_eq!(timeout.status(), StatusCode::REQUEST_TIMEOUT);

        let busy = ApiError::from(PdfError::TooManyPending);
        assert_eq!(busy.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unknown = ApiError::from(PdfError::UnknownTheme("neon".into()));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_failures_hide_detail_from_the_body() {
        let error = ApiError::from(PdfError::Markdown(RenderError::Document {
            message: "secret /tmp/path".into(),
        }));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = error.into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert!(report.messages.iter().any(|m| m.contains("secret")));
    }
}
