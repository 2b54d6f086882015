//! Seam between the render coordinator and the browser that rasterizes pages.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::print::{PageMargins, PaperFormat, PrintOptions, Viewport};

const MM_PER_INCH: f64 = 25.4;

const FOOTER_TEMPLATE: &str = "<div style=\"width: 100%; text-align: center; font-size: 10px; \
color: #666; font-family: system-ui, sans-serif;\">Page <span class=\"pageNumber\"></span> of \
<span class=\"totalPages\"></span></div>";

#[derive(Debug, Clone, Error)]
#[error("{operation} failed: {message}")]
pub struct BrowserError {
    pub operation: &'static str,
    pub message: String,
}

impl BrowserError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Everything the rasterizer needs besides the document itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSettings {
    pub paper: PaperFormat,
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margin_top_in: f64,
    pub margin_right_in: f64,
    pub margin_bottom_in: f64,
    pub margin_left_in: f64,
    pub print_background: bool,
    /// Footer markup when page numbers are requested.
    pub footer_template: Option<String>,
}

impl PrintSettings {
    pub fn from_options(options: &PrintOptions) -> Self {
        let paper = options.page_size.paper_format();
        let (paper_width_in, paper_height_in) = paper.inches();
        let PageMargins {
            top,
            right,
            bottom,
            left,
        } = options.page_margins();

        Self {
            paper,
            paper_width_in,
            paper_height_in,
            margin_top_in: top / MM_PER_INCH,
            margin_right_in: right / MM_PER_INCH,
            margin_bottom_in: bottom / MM_PER_INCH,
            margin_left_in: left / MM_PER_INCH,
            print_background: true,
            footer_template: options
                .include_page_numbers
                .then(|| FOOTER_TEMPLATE.to_string()),
        }
    }
}

/// A browser capable of opening isolated pages.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Open a fresh page, launching or relaunching the browser when needed.
    async fn open_page(&self, viewport: Viewport) -> Result<Box<dyn BrowserPage>, BrowserError>;

    /// Tear down the browser process. Later calls to `open_page` may relaunch it.
    async fn shutdown(&self);
}

/// One open page owned by exactly one job.
#[async_trait]
pub trait BrowserPage: Send {
    /// Load a complete HTML document and wait until the network is quiet.
    async fn load_html(&mut self, html: &str) -> Result<(), BrowserError>;

    async fn print_pdf(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, BrowserError>;

    async fn close(self: Box<Self>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::print::{MarginPreset, PageSize};

    #[test]
    fn margins_are_converted_to_inches() {
        let settings = PrintSettings::from_options(&PrintOptions {
            page_size: PageSize::Letter,
            margins: MarginPreset::Normal,
            include_page_numbers: false,
        });

        assert!((settings.margin_top_in - 20.0 / 25.4).abs() < 1e-9);
        assert_eq!(settings.margin_top_in, settings.margin_bottom_in);
        assert_eq!((settings.paper_width_in, settings.paper_height_in), (8.5, 11.0));
        assert!(settings.footer_template.is_none());
    }

    #[test]
    fn page_numbers_add_a_footer_and_taller_bottom_margin() {
        let settings = PrintSettings::from_options(&PrintOptions {
            page_size: PageSize::B5,
            margins: MarginPreset::Narrow,
            include_page_numbers: true,
        });

        let footer = settings.footer_template.expect("footer");
        assert!(footer.contains("pageNumber") && footer.contains("totalPages"));
        assert!((settings.margin_bottom_in - 25.0 / 25.4).abs() < 1e-9);
        assert!(matches!(settings.paper, PaperFormat::Explicit { .. }));
    }
}
