use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Render a fenced block. Languages the syntax set does not know fall back to
/// an escaped, unhighlighted block that keeps the declared language as a class.
pub(crate) fn render_code_block(
    language: Option<&str>,
    meta: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let Some(lang_token) = language.filter(|lang| !lang.is_empty()) else {
        return Ok(format!("<pre><code>{}</code></pre>", escape_html(code)));
    };

    match find_syntax(syntax_set, lang_token) {
        Some(syntax) => highlight_code(syntax, lang_token, meta, code, syntax_set, class_style),
        None => Ok(format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(lang_token),
            escape_html(code)
        )),
    }
}

fn highlight_code(
    syntax: &SyntaxReference,
    lang_token: &str,
    meta: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.to_string(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let lang_class = escape_html(&lang_token.to_ascii_lowercase());

    let meta_attr = meta
        .filter(|m| !m.is_empty())
        .map(|m| format!(" data-meta=\"{}\"", escape_html(m)))
        .unwrap_or_default();

    Ok(format!(
        "<pre class=\"syntax-highlight syntax-lang-{lang_class}\" data-language=\"{lang_class}\">\
         <code class=\"language-{lang_class} syntax-code\"{meta_attr}>{highlighted}</code></pre>"
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
