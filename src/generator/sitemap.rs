//! Sitemap generation.
//!
//! Lists every published page for search engine indexing:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/hello/</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{
    config::SiteConfig,
    content::Document,
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Context, Result};
use std::fs;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Single URL entry in the sitemap
struct UrlEntry {
    loc: String,
    /// Last modification date (YYYY-MM-DD)
    lastmod: Option<String>,
}

/// Build the sitemap if enabled in config.
pub fn generate(config: &SiteConfig, documents: &[Document]) -> Result<()> {
    if !config.build.sitemap.enable {
        return Ok(());
    }

    let base_url = config.base.url.as_deref().unwrap_or_default();
    let root_loc = format!("{}/", base_url.trim_end_matches('/'));

    // A content index.md owns the root URL: it carries a lastmod and
    // the bare root entry would duplicate it.
    let mut urls = Vec::with_capacity(documents.len() + 1);
    if !documents.iter().any(|doc| doc.paths.full_url == root_loc) {
        urls.push(UrlEntry { loc: root_loc, lastmod: None });
    }
    urls.extend(documents.iter().map(|doc| UrlEntry {
        loc: doc.paths.full_url.clone(),
        lastmod: doc.lastmod_ymd(),
    }));

    let xml = into_xml(urls);
    let xml = minify(MinifyType::Xml(xml.as_bytes()), config.build.minify);
    let path = config.build.output.join(&config.build.sitemap.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &*xml)
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))?;

    log!("sitemap"; "{}", path.file_name().unwrap_or_default().to_string_lossy());
    Ok(())
}

fn into_xml(urls: Vec<UrlEntry>) -> String {
    let mut xml = String::with_capacity(4096);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
        if let Some(lastmod) = entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
