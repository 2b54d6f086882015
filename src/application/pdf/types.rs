use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{
    application::{render::RenderError, themes::ThemeError},
    domain::{print::PrintOptions, themes::ThemeId},
};

use super::engine::BrowserError;

/// A validated request for one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfRequest {
    pub markdown: String,
    pub theme: ThemeId,
    pub options: PrintOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPhase {
    ContentLoad,
    Rasterize,
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeoutPhase::ContentLoad => "content load",
            TimeoutPhase::Rasterize => "rasterize",
        })
    }
}

/// Lifecycle of a single job, recorded in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Admitted,
    Rendering,
    Succeeded,
    TimedOut,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Admitted => "admitted",
            JobState::Rendering => "rendering",
            JobState::Succeeded => "succeeded",
            JobState::TimedOut => "timed_out",
            JobState::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error("theme stylesheet unavailable")]
    Stylesheet(#[source] ThemeError),
    #[error("markdown rendering failed")]
    Markdown(#[from] RenderError),
    #[error("too many pending PDF requests")]
    TooManyPending,
    #[error("PDF generation timed out during {phase}")]
    RenderTimeout { phase: TimeoutPhase },
    #[error("browser operation failed")]
    Browser(#[from] BrowserError),
    #[error("print document could not be assembled")]
    Template(#[from] askama::Error),
}

impl From<ThemeError> for PdfError {
    fn from(error: ThemeError) -> Self {
        match error {
            ThemeError::UnknownTheme(id) => PdfError::UnknownTheme(id),
            other => PdfError::Stylesheet(other),
        }
    }
}
