//! Shared utilities: logging, dates, slugs, minification.

pub mod date;
pub mod log;
pub mod minify;
pub mod slug;
