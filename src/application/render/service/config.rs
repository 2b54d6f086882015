use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;
use comrak::options::{ListStyleType, Options};

pub(crate) fn default_options() -> Options<'static> {
    let mut options = Options::default();
    configure_extensions(&mut options);
    options
}

/// Allow-list for Markdown output: structure, tables, code, task lists and
/// footnotes survive; scripts, styles, frames and event handlers do not.
pub(crate) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "abbr",
        "b",
        "blockquote",
        "br",
        "caption",
        "code",
        "dd",
        "del",
        "details",
        "div",
        "dl",
        "dt",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "input",
        "ins",
        "kbd",
        "li",
        "mark",
        "ol",
        "p",
        "pre",
        "s",
        "section",
        "span",
        "strong",
        "sub",
        "summary",
        "sup",
        "table",
        "tbody",
        "td",
        "tfoot",
        "th",
        "thead",
        "tr",
        "u",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "aria-hidden",
        "aria-label",
        "role",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
        "data-footnote-backref-idx",
    ]);
    builder.generic_attributes(generic);

    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["title", "width", "height", "alt", "loading"]);
    builder.add_tag_attributes("code", &["data-meta", "data-language"]);
    builder.add_tag_attributes("pre", &["data-language"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("ol", &["start"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("details", &["open"]);

    builder.add_url_schemes(["http", "https", "mailto", "tel"].iter().copied());

    builder
}

fn configure_extensions(options: &mut Options<'static>) {
    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.tagfilter = false;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.footnotes = true;

    options.parse.smart = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    render.tasklist_classes = true;
    render.list_style = ListStyleType::Dash;
    render.r#unsafe = true;
    render.sourcepos = false;
}

#[cfg(test)]
mod tests {
    use super::build_sanitizer;

    #[test]
    fn sanitizer_drops_active_content() {
        let html = build_sanitizer()
            .clean(
                "<p onclick=\"steal()\">Hi</p><script>alert(1)</script>\
                 <iframe src=\"https://example.com\"></iframe><style>p{}</style>",
            )
            .to_string();

        assert_eq!(html, "<p>Hi</p>");
    }

    #[test]
    fn sanitizer_keeps_task_list_checkboxes() {
        let html = build_sanitizer()
            .clean("<ul><li class=\"task-list-item\"><input type=\"checkbox\" checked=\"\" disabled=\"\"> done</li></ul>")
            .to_string();

        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("checked"));
    }

    #[test]
    fn sanitizer_strips_javascript_links() {
        let html = build_sanitizer()
            .clean("<a href=\"javascript:alert(1)\">x</a>")
            .to_string();

        assert!(!html.contains("javascript"));
    }
}
