//! Collection indexing: date ordering, tag grouping, slug lookup.
//!
//! A purely derived view over parsed documents; nothing here mutates a
//! `Document`.

use crate::content::document::Document;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Derived index over the full document collection.
pub struct SiteIndex<'a> {
    /// Dated documents sorted by publish date descending, ties broken
    /// by slug ascending. Undated documents never appear here.
    pub dated: Vec<&'a Document>,
    /// Tag name → documents carrying it, newest first. BTreeMap keeps
    /// tag iteration deterministic.
    pub by_tag: BTreeMap<String, Vec<&'a Document>>,
    /// Direct slug lookup, dated or not.
    by_slug: FxHashMap<&'a str, &'a Document>,
}

impl<'a> SiteIndex<'a> {
    /// Build the index. Input order does not matter; output order is
    /// total and deterministic.
    pub fn build(documents: &'a [Document]) -> Self {
        let mut dated: Vec<&Document> = documents.iter().filter(|d| d.date.is_some()).collect();
        dated.sort_by(newest_first);

        let mut by_tag: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
        for doc in documents {
            for tag in &doc.meta.tags {
                by_tag.entry(tag.clone()).or_default().push(doc);
            }
        }
        for bucket in by_tag.values_mut() {
            bucket.sort_by(newest_first);
        }

        let by_slug = documents.iter().map(|d| (d.slug.as_str(), d)).collect();

        Self { dated, by_tag, by_slug }
    }

    /// Look up a document by slug, whether dated or not.
    pub fn get(&self, slug: &str) -> Option<&'a Document> {
        self.by_slug.get(slug).copied()
    }
}

/// Publish date descending; `None` sorts last; slug ascending breaks
/// ties for determinism.
fn newest_first(a: &&Document, b: &&Document) -> std::cmp::Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.slug.cmp(&b.slug))
}
