//! Documents: a source file, its front matter, and its output location.

use crate::{
    config::SiteConfig,
    content::frontmatter::FrontMatter,
    utils::{date::DateTimeUtc, slug::slugify_path},
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// A parsed content document.
///
/// Loaded whole from a single `.md` file; never partially updated. The
/// rendered page derived from it is ephemeral and regenerated on every
/// build.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique identifier derived from the content-relative file path
    pub slug: String,
    /// Path information
    pub paths: DocPaths,
    /// Parsed front matter
    pub meta: FrontMatter,
    /// Parsed publish date (`None` for undated documents)
    pub date: Option<DateTimeUtc>,
    /// Markdown body (everything after the metadata block)
    pub body: String,
    /// Last modification time of the source file
    pub lastmod: Option<SystemTime>,
}

/// Path information for a document.
#[derive(Debug, Clone)]
pub struct DocPaths {
    /// Source .md file path
    pub source: PathBuf,
    /// Output HTML file path
    pub html: PathBuf,
    /// URL path component, e.g. `/posts/hello/`
    pub url_path: String,
    /// Full URL including base, e.g. `https://example.com/posts/hello/`
    pub full_url: String,
}

impl Document {
    /// Load and parse a document from a source file.
    ///
    /// Fails when the file cannot be read, is not under the content
    /// directory, or carries a malformed metadata block. Such failures
    /// skip the document only; the build batch continues.
    pub fn load(source: &Path, config: &SiteConfig) -> Result<Self> {
        let text = fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;

        let (meta, body) = FrontMatter::parse(&text)
            .map_err(|e| anyhow!("{}: {e}", source.display()))?;
        let date = meta.date();
        let body = body.to_owned();
        let lastmod = fs::metadata(source).and_then(|m| m.modified()).ok();

        let slug = derive_slug(source, config)?;
        let paths = DocPaths::new(source.to_path_buf(), &slug, config);

        Ok(Self { slug, paths, meta, date, body, lastmod })
    }

    /// Display title: front matter `title`, falling back to the slug.
    pub fn title(&self) -> &str {
        self.meta.title.as_deref().unwrap_or(&self.slug)
    }

    /// Publish date as `YYYY-MM-DD`, empty for undated documents.
    pub fn date_ymd(&self) -> String {
        self.date.map(DateTimeUtc::to_ymd).unwrap_or_default()
    }

    /// Last modification time as `YYYY-MM-DD` for the sitemap.
    pub fn lastmod_ymd(&self) -> Option<String> {
        let duration = self.lastmod?.duration_since(SystemTime::UNIX_EPOCH).ok()?;
        let days = (duration.as_secs() / 86400) as i64;
        let (year, month, day) = days_to_ymd(days);
        Some(format!("{year:04}-{month:02}-{day:02}"))
    }
}

impl DocPaths {
    fn new(source: PathBuf, slug: &str, config: &SiteConfig) -> Self {
        let output_dir = &config.build.output;
        let base_url = config
            .base
            .url
            .as_deref()
            .unwrap_or_default()
            .trim_end_matches('/');

        // Root index.md publishes at the site root, everything else
        // under its own directory for pretty URLs.
        let (html, url_path) = if slug == "index" {
            (output_dir.join("index.html"), "/".to_owned())
        } else {
            (
                output_dir.join(slug).join("index.html"),
                format!("/{slug}/"),
            )
        };
        let full_url = format!("{base_url}{url_path}");

        Self { source, html, url_path, full_url }
    }
}

/// Derive the slug from the content-relative path without extension.
///
/// `posts/2021/Iterator Surprises.md` → `2021/iterator-surprises`
/// (exact form depends on `[build.slug]`).
fn derive_slug(source: &Path, config: &SiteConfig) -> Result<String> {
    let relative = source
        .strip_prefix(&config.build.content)
        .map_err(|_| anyhow!("File is not in content directory: {}", source.display()))?
        .to_str()
        .ok_or_else(|| anyhow!("Invalid path encoding: {}", source.display()))?
        .strip_suffix(".md")
        .ok_or_else(|| anyhow!("Not a .md file: {}", source.display()))?
        .to_owned();

    let slug = slugify_path(Path::new(&relative), config.build.slug)
        .to_string_lossy()
        .replace('\\', "/");

    if slug.is_empty() {
        return Err(anyhow!("Empty slug for {}", source.display()));
    }
    Ok(slug)
}

/// Days since UNIX epoch to (year, month, day).
///
/// Howard Hinnant's civil-from-days algorithm.
const fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.build.content = dir.path().join("posts");
        config.build.output = dir.path().join("public");
        config.base.url = Some("https://example.com".into());
        fs::create_dir_all(&config.build.content).unwrap();
        (dir, config)
    }

    fn write_post(config: &SiteConfig, rel: &str, text: &str) -> PathBuf {
        let path = config.build.content.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn load_parses_meta_and_body() {
        let (_dir, config) = site();
        let path = write_post(
            &config,
            "hello.md",
            "---\ntitle: X\ndate: 2021-08-09\ntags: [python]\n---\nhello\n",
        );

        let doc = Document::load(&path, &config).unwrap();
        assert_eq!(doc.slug, "hello");
        assert_eq!(doc.title(), "X");
        assert_eq!(doc.date, Some(DateTimeUtc::from_ymd(2021, 8, 9)));
        assert_eq!(doc.body, "hello\n");
        assert_eq!(doc.paths.url_path, "/hello/");
        assert_eq!(doc.paths.full_url, "https://example.com/hello/");
        assert!(doc.paths.html.ends_with("public/hello/index.html"));
    }

    #[test]
    fn load_body_only_document() {
        let (_dir, config) = site();
        let path = write_post(&config, "plain.md", "no metadata here\n");

        let doc = Document::load(&path, &config).unwrap();
        assert_eq!(doc.title(), "plain");
        assert_eq!(doc.date, None);
        assert_eq!(doc.body, "no metadata here\n");
    }

    #[test]
    fn load_rejects_malformed_front_matter() {
        let (_dir, config) = site();
        let path = write_post(&config, "broken.md", "---\ntitle: X\nbody without closing\n");

        let err = Document::load(&path, &config).unwrap_err();
        assert!(err.to_string().contains("broken.md"));
    }

    #[test]
    fn nested_path_slug() {
        let (_dir, config) = site();
        let path = write_post(&config, "2021/aug/note.md", "body\n");

        let doc = Document::load(&path, &config).unwrap();
        assert_eq!(doc.slug, "2021/aug/note");
        assert_eq!(doc.paths.url_path, "/2021/aug/note/");
    }

    #[test]
    fn root_index_publishes_at_site_root() {
        let (_dir, config) = site();
        let path = write_post(&config, "index.md", "welcome\n");

        let doc = Document::load(&path, &config).unwrap();
        assert_eq!(doc.paths.url_path, "/");
        assert!(doc.paths.html.ends_with("public/index.html"));
    }

    #[test]
    fn safe_slug_mode_sanitizes() {
        let (_dir, config) = site();
        let path = write_post(&config, "Why So Slow?.md", "body\n");

        let doc = Document::load(&path, &config).unwrap();
        assert_eq!(doc.slug, "Why_So_Slow");
    }

    #[test]
    fn non_md_file_rejected() {
        let (_dir, config) = site();
        let path = config.build.content.join("notes.txt");
        fs::write(&path, "x").unwrap();

        assert!(Document::load(&path, &config).is_err());
    }

    #[test]
    fn days_to_ymd_epoch() {
        assert_eq!(days_to_ymd(0), (1970, 1, 1));
        assert_eq!(days_to_ymd(18_848), (2021, 8, 9));
    }
}
