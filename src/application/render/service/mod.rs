mod anchors;
mod config;
mod highlight;
mod rewrite;

use std::sync::Arc;

use comrak::{Arena, format_html_with_plugins, nodes::AstNode, options::Plugins, parse_document};
use once_cell::sync::Lazy;
use syntect::{dumps::from_uncompressed_data, html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::types::RenderError;

use anchors::HeadingAnchors;
use config::{build_sanitizer, default_options};
use rewrite::{RewriteOutcome, rewrite_ast};

/// Comrak-based renderer with Syntect highlighting and Ammonia sanitisation.
pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    sanitizer: ammonia::Builder<'static>,
}

impl MarkdownRenderer {
    fn new() -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set: SyntaxSet =
            from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid");

        Self {
            options: default_options(),
            syntax_set,
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
            sanitizer: build_sanitizer(),
        }
    }

    /// Render Markdown without sanitisation. Diagnostics only; the output may
    /// carry raw HTML from the source.
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);
        rewrite_stage(root, &self.syntax_set, &self.class_style)?;
        render_html_stage(root, &self.options)
    }

    /// Render Markdown into sanitized HTML. Markdown headings up to h4 carry
    /// unique anchor ids.
    pub fn render_sanitized(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);
        rewrite_stage(root, &self.syntax_set, &self.class_style)?;
        let rendered = render_html_stage(root, &self.options)?;
        Ok(self.sanitizer.clean(&rendered).to_string())
    }
}

static MARKDOWN_RENDERER: Lazy<Arc<MarkdownRenderer>> =
    Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Shared renderer instance, initialised on first use.
pub fn markdown_renderer() -> Arc<MarkdownRenderer> {
    Arc::clone(&MARKDOWN_RENDERER)
}

fn rewrite_stage<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let outcome = rewrite_ast(root, syntax_set, class_style)?;
    tracing::trace!(
        target = "application::render",
        code_blocks = outcome.code_blocks,
        "markdown rewritten"
    );
    Ok(outcome)
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let anchors = HeadingAnchors::new();
    let mut plugins = Plugins::default();
    plugins.render.heading_adapter = Some(&anchors);

    let mut html = String::new();
    format_html_with_plugins(root, options, &mut html, &plugins).map_err(|err| {
        RenderError::Markdown {
            message: err.to_string(),
        }
    })?;
    Ok(html)
}
