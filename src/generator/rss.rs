//! RSS feed generation from the dated document index.

use crate::{
    config::SiteConfig,
    content::{Document, FrontValue, SiteIndex},
    log,
    utils::minify::{MinifyType, minify},
};
use anyhow::{Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::{fs, sync::LazyLock};

/// Build the RSS feed if enabled in config.
///
/// Only dated documents appear, newest first, matching the front page.
pub fn generate(config: &SiteConfig, index: &SiteIndex) -> Result<()> {
    if !config.build.rss.enable {
        return Ok(());
    }

    let items: Vec<_> = index
        .dated
        .iter()
        .filter_map(|doc| doc_to_rss_item(doc, config))
        .collect();

    let channel = ChannelBuilder::default()
        .title(&config.base.title)
        .link(config.base.url.as_deref().unwrap_or_default())
        .description(&config.base.description)
        .language(config.base.language.clone())
        .generator("quire".to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;

    let xml = channel.to_string();
    let xml = minify(MinifyType::Xml(xml.as_bytes()), config.build.minify);
    let path = config.build.output.join(&config.build.rss.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &*xml)?;

    log!("rss"; "{}", path.file_name().unwrap_or_default().to_string_lossy());
    Ok(())
}

/// Convert a document to an RSS item.
///
/// Returns None when the publish date is missing; the caller already
/// filters, this is a second guard.
fn doc_to_rss_item(doc: &Document, config: &SiteConfig) -> Option<rss::Item> {
    let pub_date = doc.date?.to_rfc2822();
    let link = doc.paths.full_url.clone();

    Some(
        ItemBuilder::default()
            .title(doc.title().to_owned())
            .link(Some(link.clone()))
            .guid(GuidBuilder::default().permalink(true).value(link).build())
            .description(doc_summary(doc))
            .pub_date(pub_date)
            .author(normalize_rss_author(doc_author(doc), config))
            .build(),
    )
}

/// `summary:` front matter key, when present as a string.
fn doc_summary(doc: &Document) -> Option<String> {
    doc.meta.extra.iter().find_map(|(key, value)| match value {
        FrontValue::String(s) if key == "summary" => Some(s.clone()),
        _ => None,
    })
}

/// `author:` front matter key, when present as a string.
fn doc_author(doc: &Document) -> Option<&String> {
    doc.meta.extra.iter().find_map(|(key, value)| match value {
        FrontValue::String(s) if key == "author" => Some(s),
        _ => None,
    })
}

/// Normalize the author field to RSS form: "email@example.com (Name)"
///
/// Priority:
/// 1. Document author if already in valid format
/// 2. Site config author if in valid format
/// 3. Combine site config email and author
fn normalize_rss_author(author: Option<&String>, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap()
    });

    let author = author?;
    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.clone());
    }

    let site_author = &config.base.author;
    if RE_VALID_AUTHOR.is_match(site_author) {
        return Some(site_author.clone());
    }
    Some(format!("{} ({})", config.base.email, site_author))
}
