use std::sync::Arc;

use crate::application::{pdf::PdfService, render::MarkdownRenderer, themes::ThemeStore};

#[derive(Clone)]
pub struct ApiState {
    pub themes: Arc<ThemeStore>,
    pub renderer: Arc<MarkdownRenderer>,
    pub pdf: Arc<PdfService>,
    /// Ceiling for uploaded files and for Markdown submitted in JSON bodies.
    pub max_file_bytes: u64,
}
