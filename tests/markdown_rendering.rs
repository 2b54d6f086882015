use inkpress::application::render::markdown_renderer;

fn render_fixture() -> String {
    markdown_renderer()
        .render_sanitized(include_str!("fixtures/gfm_features.md"))
        .expect("sanitized render succeeds")
}

#[test]
fn headings_receive_unique_anchors() {
    let html = render_fixture();

    assert!(html.contains("<h1 id=\"quarterly-report\">"));
    assert!(html.contains("<h2 id=\"tables\">"));
    assert!(html.contains("<h2 id=\"tables-2\">"));
    assert!(html.contains("<h2 id=\"notes\">"));
}

#[test]
fn gfm_extensions_are_rendered() {
    let html = render_fixture();

    assert!(html.contains("<table>"));
    assert!(html.contains("<th align=\"right\">Revenue</th>"));
    assert!(html.contains("<del>struck</del>"));
    assert!(html.contains("type=\"checkbox\""));
    assert!(html.contains("data-footnotes"));
    assert!(html.contains("href=\"https://example.com\""));
    assert!(html.contains("<img src=\"https://example.com/chart.png\""));
}

#[test]
fn fenced_code_is_highlighted_or_escaped() {
    let html = render_fixture();

    assert!(html.contains("syntax-highlight"));
    assert!(html.contains("plain block &lt;tag&gt;"));
}

#[test]
fn active_content_is_removed() {
    let html = render_fixture();

    assert!(html.contains("Raw HTML block"));
    assert!(!html.contains("onmouseover"));
    assert!(!html.contains("<iframe"));
    assert!(!html.contains("javascript:"));
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(render_fixture(), render_fixture());
}
