//! Full site build: scan, parse, index, render, generate.
//!
//! Per-document failures (unreadable file, malformed metadata, unknown
//! layout) are logged and skip that document only; the batch always
//! runs to completion.

use crate::{
    config::SiteConfig,
    content::{Document, SiteIndex, collect_asset_files, collect_content_files},
    generator, log,
    render::{Layouts, Renderer},
    utils::{
        log::Progress,
        minify::{MinifyType, minify},
        slug::slugify_label,
    },
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::{fs, path::Path, time::Instant};

/// Build the whole site into the output directory.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let start = Instant::now();

    prepare_output(config)?;
    let layouts = Layouts::load(&config.build.templates)?;
    let renderer = Renderer::new(config, layouts);

    let (documents, skipped) = load_documents(config);
    let loaded = documents.len();

    // Pages first: listings, feed and sitemap are built from the
    // documents that actually produced a page, nothing else.
    let documents = render_documents(config, &renderer, documents);
    let rendered = documents.len();
    let skipped = skipped + (loaded - rendered);
    let index = SiteIndex::build(&documents);

    render_listings(config, &renderer, &index)?;
    copy_assets(config)?;

    generator::rss::generate(config, &index)?;
    generator::sitemap::generate(config, &documents)?;

    if skipped > 0 {
        log!("build"; "{rendered} pages in {:.2?}, {skipped} skipped", start.elapsed());
    } else {
        log!("build"; "{rendered} pages in {:.2?}", start.elapsed());
    }
    Ok(())
}

/// Empty (when `[build.clean]`) and recreate the output directory.
fn prepare_output(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    if config.build.clean && output.is_dir() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    Ok(())
}

/// Load every content file, dropping documents that fail to parse.
///
/// Returns the surviving documents and the skip count. Scan order is
/// the sorted file order, so the first document to claim a slug wins.
fn load_documents(config: &SiteConfig) -> (Vec<Document>, usize) {
    let files = collect_content_files(&config.build.content);
    let mut documents = Vec::with_capacity(files.len());
    let mut seen_slugs = FxHashSet::default();
    let mut skipped = 0;
    let mut drafts = 0;

    for file in &files {
        let doc = match Document::load(file, config) {
            Ok(doc) => doc,
            Err(e) => {
                log!("skip"; "{e:#}");
                skipped += 1;
                continue;
            }
        };
        if doc.meta.draft && !config.build.drafts {
            drafts += 1;
            continue;
        }
        if !seen_slugs.insert(doc.slug.clone()) {
            log!("skip"; "{}: duplicate slug `{}`", file.display(), doc.slug);
            skipped += 1;
            continue;
        }
        documents.push(doc);
    }

    if drafts > 0 {
        log!("build"; "excluded {drafts} drafts");
    }
    (documents, skipped)
}

/// Render and write all document pages in parallel.
///
/// Returns only the documents whose page was actually written; the
/// rest are logged and dropped, so no listing, feed or sitemap entry
/// ever points at a page that does not exist.
fn render_documents(
    config: &SiteConfig,
    renderer: &Renderer,
    documents: Vec<Document>,
) -> Vec<Document> {
    let progress = Progress::new("build", documents.len());

    let survivors: Vec<Document> = documents
        .into_par_iter()
        .filter_map(|doc| {
            let result = renderer
                .render_document(&doc)
                .map_err(anyhow::Error::from)
                .and_then(|html| write_page(&doc.paths.html, &html, config));
            progress.inc();
            match result {
                Ok(()) => Some(doc),
                Err(e) => {
                    log!("skip"; "{}: {e:#}", doc.paths.source.display());
                    None
                }
            }
        })
        .collect();

    progress.finish();
    survivors
}

/// Write the front page, the tag overview and one page per tag.
fn render_listings(config: &SiteConfig, renderer: &Renderer, index: &SiteIndex) -> Result<()> {
    let output = &config.build.output;

    // A content file with slug `index` owns the front page; only
    // generate the listing when nothing claims it.
    if index.get("index").is_none() {
        let html = renderer.render_listing(
            "index",
            &[("entries", renderer.listing_entries(&index.dated))],
        )?;
        write_page(&output.join("index.html"), &html, config)?;
    }

    // Same rule for the tag overview: a document with slug `tags`
    // already wrote `tags/index.html` and wins over the generated page.
    if let Some(doc) = index.get("tags") {
        log!(
            "build";
            "{}: slug `tags` shadows the generated tag overview",
            doc.paths.source.display()
        );
    } else {
        let html = renderer.render_listing("tags", &[("entries", renderer.tag_entries(index))])?;
        write_page(&output.join("tags/index.html"), &html, config)?;
    }

    for (tag, docs) in &index.by_tag {
        let html = renderer.render_listing(
            "tag",
            &[
                ("tag", tag.clone()),
                ("entries", renderer.listing_entries(docs)),
            ],
        )?;
        let dir = slugify_label(tag, config.build.slug);
        write_page(&output.join("tags").join(dir).join("index.html"), &html, config)?;
    }
    Ok(())
}

/// Copy the assets tree into the output directory, structure intact.
fn copy_assets(config: &SiteConfig) -> Result<()> {
    let assets = &config.build.assets;
    if !assets.is_dir() {
        return Ok(());
    }

    collect_asset_files(assets)
        .par_iter()
        .try_for_each(|file| -> Result<()> {
            let relative = file
                .strip_prefix(assets)
                .with_context(|| format!("Asset outside assets dir: {}", file.display()))?;
            let target = config.build.output.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(file, &target)
                .with_context(|| format!("Failed to copy {}", file.display()))?;
            Ok(())
        })
}

fn write_page(path: &Path, html: &str, config: &SiteConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = minify(MinifyType::Html(html.as_bytes()), config.build.minify);
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn site(dir: &TempDir) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.build.content = dir.path().join("posts");
        config.build.templates = dir.path().join("templates");
        config.build.assets = dir.path().join("assets");
        config.build.output = dir.path().join("public");
        // Readable output for string assertions
        config.build.minify = false;
        fs::create_dir_all(&config.build.content).unwrap();
        config
    }

    fn write_post(config: &SiteConfig, name: &str, text: &str) -> PathBuf {
        let path = config.build.content.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn malformed_document_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(&config, "bad.md", "---\ntitle: Broken\n\nno terminator");
        write_post(&config, "good.md", "---\ntitle: Fine\n---\nbody");

        let (documents, skipped) = load_documents(&config);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].slug, "good");
        assert_eq!(skipped, 1);
    }

    #[test]
    fn duplicate_slug_keeps_first_in_scan_order() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        // Both sanitize to the same slug; `a b.md` sorts first.
        write_post(&config, "a b.md", "---\ntitle: First\n---\n");
        write_post(&config, "a_b.md", "---\ntitle: Second\n---\n");

        let (documents, skipped) = load_documents(&config);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].meta.title.as_deref(), Some("First"));
        assert_eq!(skipped, 1);
    }

    #[test]
    fn drafts_excluded_by_default() {
        let dir = TempDir::new().unwrap();
        let mut config = site(&dir);
        write_post(&config, "wip.md", "---\ntitle: Wip\ndraft: true\n---\n");

        let (documents, skipped) = load_documents(&config);
        assert!(documents.is_empty());
        assert_eq!(skipped, 0);

        config.build.drafts = true;
        let (documents, _) = load_documents(&config);
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn build_writes_pages_and_listings() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(
            &config,
            "first.md",
            "---\ntitle: First\ndate: 2021-08-09\ntags: [rust]\n---\nhello *world*",
        );

        build_site(&config).unwrap();

        let page = fs::read_to_string(config.build.output.join("first/index.html")).unwrap();
        assert!(page.contains("<em>world</em>"));

        let front = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(front.contains(r#"href="/first/""#));

        let tag = fs::read_to_string(config.build.output.join("tags/rust/index.html")).unwrap();
        assert!(tag.contains("First"));
    }

    #[test]
    fn front_page_lists_newest_first() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(&config, "aug.md", "---\ntitle: August\ndate: 2021-08-09\n---\n");
        write_post(&config, "sep.md", "---\ntitle: September\ndate: 2021-09-01\n---\n");
        write_post(&config, "undated.md", "---\ntitle: Undated\n---\nstill published");

        build_site(&config).unwrap();

        let front = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        let sep = front.find("September").unwrap();
        let aug = front.find("August").unwrap();
        assert!(sep < aug);
        // Undated documents are reachable but never listed by date
        assert!(!front.contains("Undated"));
        assert!(config.build.output.join("undated/index.html").is_file());
    }

    #[test]
    fn failed_render_never_reaches_listings() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(
            &config,
            "broken.md",
            "---\ntitle: Broken\ndate: 2021-09-01\nlayout: podcast\ntags: [x]\n---\n",
        );
        write_post(&config, "fine.md", "---\ntitle: Fine\ndate: 2021-08-09\ntags: [x]\n---\n");

        build_site(&config).unwrap();

        // No page was written for the broken document...
        assert!(!config.build.output.join("broken/index.html").exists());
        // ...so nothing may link to it.
        let front = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(!front.contains("Broken"));
        let tag = fs::read_to_string(config.build.output.join("tags/x/index.html")).unwrap();
        assert!(tag.contains("Fine"));
        assert!(!tag.contains("Broken"));
    }

    #[test]
    fn content_tags_slug_shadows_generated_overview() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(&config, "tags.md", "---\ntitle: My Tags\n---\nhand-written tag page");
        write_post(&config, "post.md", "---\ntitle: Post\ndate: 2021-08-09\ntags: [rust]\n---\n");

        build_site(&config).unwrap();

        let overview = fs::read_to_string(config.build.output.join("tags/index.html")).unwrap();
        assert!(overview.contains("hand-written tag page"));
        // Individual tag pages still live underneath
        assert!(config.build.output.join("tags/rust/index.html").is_file());
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(
            &config,
            "post.md",
            "---\ntitle: Post\ndate: 2021-08-09\ntags: [a, b]\n---\n# heading\n\ntext",
        );

        build_site(&config).unwrap();
        let first = fs::read(config.build.output.join("post/index.html")).unwrap();
        build_site(&config).unwrap();
        let second = fs::read(config.build.output.join("post/index.html")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn content_index_overrides_generated_front_page() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        write_post(&config, "index.md", "---\ntitle: Hand Made\n---\nmy own front page");

        build_site(&config).unwrap();

        let front = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(front.contains("my own front page"));
    }

    #[test]
    fn assets_copied_with_structure() {
        let dir = TempDir::new().unwrap();
        let config = site(&dir);
        fs::create_dir_all(config.build.assets.join("img")).unwrap();
        fs::write(config.build.assets.join("img/logo.png"), b"png").unwrap();

        build_site(&config).unwrap();

        assert!(config.build.output.join("img/logo.png").is_file());
    }
}
