//! Slug derivation for document paths and tag names.

use crate::config::SlugMode;
use std::path::{Path, PathBuf};

/// Characters forbidden in output paths and URLs
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '(', ')', '[', ']', '\t', '\r', '\n',
];

/// Slugify a single label (a tag name, a path component).
pub fn slugify_label(text: &str, mode: SlugMode) -> String {
    match mode {
        SlugMode::Safe => sanitize_text(text),
        SlugMode::On => slug::slugify(text),
        SlugMode::No => text.to_owned(),
    }
}

/// Slugify each component of a relative path.
pub fn slugify_path(path: impl AsRef<Path>, mode: SlugMode) -> PathBuf {
    path.as_ref()
        .components()
        .map(|c| slugify_label(&c.as_os_str().to_string_lossy(), mode))
        .collect()
}

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
