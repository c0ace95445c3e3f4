//! Layout registry and page rendering.
//!
//! Layouts are plain HTML files with `{key}` placeholders. The registry
//! is an explicit object built once per publish run: embedded defaults
//! first, then any files from the templates directory on top. There is
//! no process-wide layout state.
//!
//! Substitution knows three groups of keys, applied in this order:
//! document fields (`{title}`, `{date}`, `{tags}`, `{content}`, ...),
//! unrecognized front matter keys verbatim, and site-wide fields
//! (`{site_title}`, `{language}`, `{extra_<key>}`, ...). Earlier groups
//! win because a consumed placeholder is gone.

use crate::{
    config::SiteConfig,
    content::{Document, SiteIndex, render_markdown},
    utils::slug::slugify_label,
};
use anyhow::{Context, Result};
use std::{borrow::Cow, collections::HashMap, fs, path::Path};
use thiserror::Error;

/// Rendering errors. `UnknownLayout` skips the affected document only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("layout `{0}` is not registered")]
    UnknownLayout(String),
}

/// Built-in layouts, used when the templates directory does not
/// override them.
const DEFAULT_LAYOUTS: &[(&str, &str)] = &[
    ("post", include_str!("embed/post.html")),
    ("index", include_str!("embed/index.html")),
    ("tags", include_str!("embed/tags.html")),
    ("tag", include_str!("embed/tag.html")),
];

/// Per-run layout registry.
pub struct Layouts {
    templates: HashMap<String, String>,
}

impl Layouts {
    /// Load layouts: embedded defaults overlaid with `*.html` files
    /// from the templates directory (file stem = layout name).
    pub fn load(templates_dir: &Path) -> Result<Self> {
        let mut templates: HashMap<String, String> = DEFAULT_LAYOUTS
            .iter()
            .map(|(name, body)| ((*name).to_owned(), (*body).to_owned()))
            .collect();

        if templates_dir.is_dir() {
            for entry in fs::read_dir(templates_dir)? {
                let path = entry?.path();
                if path.extension().is_none_or(|ext| ext != "html") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let body = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read layout {}", path.display()))?;
                templates.insert(name.to_owned(), body);
            }
        }

        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> Result<&str, RenderError> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| RenderError::UnknownLayout(name.to_owned()))
    }

    #[cfg(test)]
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

/// Renders documents and listing pages against a layout registry.
///
/// Holds everything a publish run needs; dropped when the run ends.
pub struct Renderer<'a> {
    config: &'a SiteConfig,
    layouts: Layouts,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a SiteConfig, layouts: Layouts) -> Self {
        Self { config, layouts }
    }

    /// Render one document through its layout.
    ///
    /// The layout is the document's `layout:` key, falling back to
    /// `[build.default_layout]`. Deterministic for unchanged inputs.
    pub fn render_document(&self, doc: &Document) -> Result<String, RenderError> {
        let layout_name = doc
            .meta
            .layout
            .as_deref()
            .unwrap_or(&self.config.build.default_layout);
        let template = self.layouts.get(layout_name)?;

        let date = doc.date_ymd();
        let comments = doc.meta.comments.unwrap_or(true);
        let doc_vars = [
            ("title", html_escape(doc.title()).into_owned()),
            ("date", date),
            ("tags", self.tag_links(&doc.meta.tags)),
            ("slug", doc.slug.clone()),
            ("url", doc.paths.url_path.clone()),
            ("comments", comments.to_string()),
            ("content", render_markdown(&doc.body)),
        ];

        let mut out = substitute(template, &doc_vars);
        for (key, value) in &doc.meta.extra {
            out = out.replace(&format!("{{{key}}}"), &html_escape(&value.to_display()));
        }
        Ok(self.substitute_site_vars(&out))
    }

    /// Render a listing page (index, tag index, one tag) through a
    /// named layout.
    pub fn render_listing(
        &self,
        layout_name: &str,
        vars: &[(&str, String)],
    ) -> Result<String, RenderError> {
        let template = self.layouts.get(layout_name)?;
        let out = substitute(template, vars);
        Ok(self.substitute_site_vars(&out))
    }

    /// `<li>` entries for a date-sorted document listing.
    pub fn listing_entries(&self, docs: &[&Document]) -> String {
        docs.iter()
            .map(|doc| {
                let date = doc.date_ymd();
                let title = html_escape(doc.title());
                if date.is_empty() {
                    format!(r#"<li><a href="{}">{title}</a></li>"#, doc.paths.url_path)
                } else {
                    format!(
                        r#"<li><time datetime="{date}">{date}</time> <a href="{}">{title}</a></li>"#,
                        doc.paths.url_path
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n      ")
    }

    /// `<li>` entries for the all-tags page, with post counts.
    pub fn tag_entries(&self, index: &SiteIndex) -> String {
        index
            .by_tag
            .iter()
            .map(|(tag, docs)| {
                format!(
                    r#"<li><a href="{}">{}</a> ({})</li>"#,
                    self.tag_url(tag),
                    html_escape(tag),
                    docs.len()
                )
            })
            .collect::<Vec<_>>()
            .join("\n      ")
    }

    /// URL path of a tag listing page.
    pub fn tag_url(&self, tag: &str) -> String {
        format!("/tags/{}/", slugify_label(tag, self.config.build.slug))
    }

    fn tag_links(&self, tags: &[String]) -> String {
        tags.iter()
            .map(|tag| format!(r#"<a href="{}">{}</a>"#, self.tag_url(tag), html_escape(tag)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn substitute_site_vars(&self, template: &str) -> String {
        let base = &self.config.base;
        let mut out = substitute(
            template,
            &[
                ("site_title", html_escape(&base.title).into_owned()),
                ("site_description", html_escape(&base.description).into_owned()),
                ("site_author", html_escape(&base.author).into_owned()),
                ("base_url", base.url.clone().unwrap_or_default()),
                ("language", base.language.clone()),
                ("copyright", html_escape(&base.copyright).into_owned()),
            ],
        );
        for (key, value) in &self.config.extra {
            let value = match value.as_str() {
                Some(s) => html_escape(s).into_owned(),
                None => value.to_string(),
            };
            out = out.replace(&format!("{{extra_{key}}}"), &value);
        }
        out
    }
}

/// Replace each `{key}` token with its value.
fn substitute(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_owned();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
