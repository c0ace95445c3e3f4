//! Content pipeline: document store scan, front matter, Markdown, indexing.
//!
//! ```text
//! collect_content_files() ──► Document::load() ──► SiteIndex::build()
//!         │                        │                      │
//!         ▼                        ▼                      ▼
//!     .md paths          FrontMatter + body      dated order + tags
//! ```

pub mod document;
pub mod frontmatter;
pub mod index;
pub mod markdown;

pub use document::Document;
pub use frontmatter::{FrontMatter, FrontValue};
pub use index::SiteIndex;
pub use markdown::render_markdown;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all `.md` files under the content directory.
///
/// Sorted by path so that scan order (and with it duplicate-slug
/// resolution and error reporting) is deterministic.
pub fn collect_content_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walk_files(dir)
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

/// Collect every file under the assets directory.
pub fn collect_asset_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = walk_files(dir).collect();
    files.sort();
    files
}

fn walk_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name) && !name.starts_with('.')
        })
        .map(walkdir::DirEntry::into_path)
}
