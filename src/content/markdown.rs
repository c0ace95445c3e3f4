//! Markdown body rendering.
//!
//! Bodies are CommonMark with tables, footnotes, strikethrough and task
//! lists enabled. Fenced code blocks and interpreter transcripts render
//! as static `<pre><code>` text; nothing in a body is ever executed.

use pulldown_cmark::{Options, Parser, html};

/// Render a Markdown body to an HTML fragment.
///
/// Pure and deterministic: equal input yields byte-identical output.
pub fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(body, options);
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_and_emphasis() {
        let out = render_markdown("hello *world*");
        assert_eq!(out, "<p>hello <em>world</em></p>\n");
    }

    #[test]
    fn fenced_code_block_passes_through_verbatim() {
        let body = "```python\n>>> [x for x in ()]\n[]\n```\n";
        let out = render_markdown(body);
        assert!(out.contains("<pre><code class=\"language-python\">"));
        assert!(out.contains("&gt;&gt;&gt; [x for x in ()]\n[]\n"));
    }

    #[test]
    fn interpreter_transcript_is_static_text() {
        // transcripts are text, not evaluated
        let out = render_markdown("```\n>>> 1 / 0\nZeroDivisionError\n```\n");
        assert!(out.contains("ZeroDivisionError"));
    }

    #[test]
    fn tables_enabled() {
        let out = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.contains("<table>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let body = "# Title\n\nsome `code` and a [link](https://example.com)\n";
        assert_eq!(render_markdown(body), render_markdown(body));
    }
}
