//! Output generators beyond HTML pages: RSS feed and sitemap.

pub mod rss;
pub mod sitemap;
