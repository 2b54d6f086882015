use thiserror::Error;

/// Structured errors surfaced by the rendering pipeline. Messages stay free of
/// document content so they can be logged without leaking user text.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown formatting failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
}
