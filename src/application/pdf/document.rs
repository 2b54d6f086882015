use askama::Template;

use crate::domain::print::PrintOptions;

const SYNTAX_CSS: &str = include_str!(env!("SYNTAX_CSS_FILE"));

#[derive(Template)]
#[template(path = "print_document.html")]
struct PrintDocument<'a> {
    page_size: &'a str,
    margin_mm: f64,
    theme_css: &'a str,
    syntax_css: &'a str,
    content: &'a str,
}

/// Assemble the self-contained HTML handed to the browser.
///
/// `content` must already be sanitized; it is inserted verbatim.
pub fn build_print_document(
    content: &str,
    theme_css: &str,
    options: &PrintOptions,
) -> Result<String, askama::Error> {
    PrintDocument {
        page_size: options.page_size.as_str(),
        margin_mm: options.margins.millimetres(),
        theme_css,
        syntax_css: SYNTAX_CSS,
        content,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::print::{MarginPreset, PageSize};

    #[test]
    fn document_carries_page_rules_theme_and_content() {
        let options = PrintOptions {
            page_size: PageSize::Legal,
            margins: MarginPreset::Wide,
            include_page_numbers: true,
        };
        let html = build_print_document(
            "<h1 id=\"t\">Title</h1>",
            ".theme-marker { color: red; }",
            &options,
        )
        .expect("document");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("size: Legal;"));
        assert!(html.contains("margin: 25mm;"));
        assert!(html.contains(".theme-marker { color: red; }"));
        assert!(html.contains("<h1 id=\"t\">Title</h1>"));
        assert!(html.contains(".syntax-"));
        assert!(html.contains("orphans: 3;"));
    }
}
