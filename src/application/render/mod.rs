//! Markdown to HTML pipeline.
//!
//! Rendering is pure: the same Markdown always yields the same HTML or the same
//! error. The sanitized variant is the only output that reaches clients or the
//! PDF pipeline; the raw variant exists for diagnostics.

mod service;
mod types;

pub use service::{MarkdownRenderer, markdown_renderer};
pub use types::RenderError;
