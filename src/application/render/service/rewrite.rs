use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::{html::ClassStyle, parsing::SyntaxSet};

use crate::application::render::types::RenderError;

use super::highlight;

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    pub(crate) code_blocks: usize,
}

/// Replace fenced code blocks with highlighted HTML.
pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, RenderError> {
    let mut walker = RewriteWalker {
        syntax_set,
        class_style,
        outcome: RewriteOutcome::default(),
    };
    walker.visit_nodes(root)?;
    Ok(walker.outcome)
}

struct RewriteWalker<'a> {
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    outcome: RewriteOutcome,
}

impl RewriteWalker<'_> {
    fn visit_nodes(&mut self, node: &AstNode<'_>) -> Result<(), RenderError> {
        if let Some((info, literal)) = extract_code_block(node) {
            let mut segments = info.split_whitespace();
            let language = segments.next();
            let meta = segments.collect::<Vec<_>>().join(" ");
            let meta_ref = (!meta.is_empty()).then_some(meta.as_str());

            let html = highlight::render_code_block(
                language,
                meta_ref,
                &literal,
                self.syntax_set,
                self.class_style,
            )?;
            self.outcome.code_blocks += 1;

            let mut data = node.data.borrow_mut();
            data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: html,
            });
        }

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next)?;
            child = next.next_sibling();
        }

        Ok(())
    }
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::{Arena, format_html, parse_document};

    fn rewrite(markdown: &str) -> (RewriteOutcome, String) {
        let options = crate::application::render::service::config::default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &options);
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };

        let outcome = rewrite_ast(root, &syntax_set, &class_style).expect("rewrite");
        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        (outcome, html)
    }

    #[test]
    fn fenced_blocks_become_highlighted_html() {
        let (outcome, html) = rewrite("```python\nprint('hi')\n```\n");

        assert_eq!(outcome.code_blocks, 1);
        assert!(html.contains("syntax-lang-python"));
        assert!(!html.contains("<pre><code class=\"language-python\">"));
    }
}
