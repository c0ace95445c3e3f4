//! Opt-in minification for rendered HTML and generated XML.

use std::borrow::Cow;

/// Content kind for minification.
pub enum MinifyType<'a> {
    Html(&'a [u8]),
    Xml(&'a [u8]),
}

/// Minify content when `enabled`, otherwise pass through borrowed.
pub fn minify(content: MinifyType<'_>, enabled: bool) -> Cow<'_, [u8]> {
    match (content, enabled) {
        (MinifyType::Html(html), false) => Cow::Borrowed(html),
        (MinifyType::Xml(xml), false) => Cow::Borrowed(xml),
        (MinifyType::Html(html), true) => Cow::Owned(minify_html_inner(html)),
        (MinifyType::Xml(xml), true) => Cow::Owned(minify_xml_inner(xml)),
    }
}

fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(html, &cfg)
}

/// XML minification is whitespace-only: join trimmed non-empty lines.
fn minify_xml_inner(xml: &[u8]) -> Vec<u8> {
    std::str::from_utf8(xml)
        .unwrap_or("")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("")
        .into_bytes()
}
