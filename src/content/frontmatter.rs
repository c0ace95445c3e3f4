//! Front matter parsing and serialization.
//!
//! A document may begin with a metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Iterator surprises
//! date: 2021-08-09
//! tags: [python, iterators]
//! layout: post
//! comments: true
//! ---
//! body text...
//! ```
//!
//! Recognized keys are `title`, `date`, `tags`, `layout`, `comments` and
//! `draft`; anything else is preserved opaquely and handed to the
//! renderer. A document without a leading delimiter is body-only with
//! default metadata. A leading delimiter without a closing one is a
//! malformed block and fails the document (not the batch).

use crate::utils::date::DateTimeUtc;
use thiserror::Error;

/// Delimiter line for the metadata block
const DELIMITER: &str = "---";

/// Front matter parsing errors.
///
/// All of these fail only the document they occur in; the build batch
/// continues past them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front matter block is not terminated by a closing `---`")]
    Unterminated,

    #[error("front matter line is not `key: value`: `{0}`")]
    InvalidLine(String),

    #[error("date is not `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SSZ`: `{0}`")]
    InvalidDate(String),

    #[error("`{key}` expects true or false, got `{value}`")]
    InvalidBool { key: String, value: String },
}

/// An unrecognized front matter value, preserved opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontValue {
    String(String),
    Bool(bool),
    List(Vec<String>),
}

impl FrontValue {
    /// Render the value for `{key}` placeholder substitution.
    pub fn to_display(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => items.join(", "),
        }
    }

    fn serialize(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => format!("[{}]", items.join(", ")),
        }
    }
}

/// Parsed front matter of a document.
///
/// `date` keeps the verbatim value so that serialization round-trips;
/// [`FrontMatter::date`] yields the parsed form. Unrecognized keys keep
/// their document order in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    raw_date: Option<String>,
    pub tags: Vec<String>,
    pub layout: Option<String>,
    pub comments: Option<bool>,
    pub draft: bool,
    pub extra: Vec<(String, FrontValue)>,
}

impl FrontMatter {
    /// Parse a document into front matter and remaining body text.
    ///
    /// Returns default metadata and the whole input when no leading
    /// delimiter is present.
    pub fn parse(text: &str) -> Result<(Self, &str), FrontMatterError> {
        let Some(rest) = strip_delimiter_line(text) else {
            return Ok((Self::default(), text));
        };

        let (block, body) = split_terminated(rest)?;

        let mut fm = Self::default();
        for line in block.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| FrontMatterError::InvalidLine(line.to_owned()))?;
            fm.set(key.trim(), value.trim())?;
        }

        Ok((fm, body))
    }

    /// Parsed publish date, `None` when the document carries no date.
    pub fn date(&self) -> Option<DateTimeUtc> {
        // parse() already validated the value
        self.raw_date.as_deref().and_then(DateTimeUtc::parse)
    }

    /// Verbatim `date:` value as written in the document.
    pub fn raw_date(&self) -> Option<&str> {
        self.raw_date.as_deref()
    }

    #[cfg(test)]
    pub fn set_raw_date(&mut self, date: &str) {
        self.raw_date = Some(date.to_owned());
    }

    /// Re-serialize the front matter block, including delimiters.
    ///
    /// Parsing the output yields an equal `FrontMatter` (round-trip
    /// idempotence over all recognized keys).
    pub fn to_block(&self) -> String {
        let mut out = String::new();
        out.push_str(DELIMITER);
        out.push('\n');

        if let Some(title) = &self.title {
            out.push_str(&format!("title: {title}\n"));
        }
        if let Some(date) = &self.raw_date {
            out.push_str(&format!("date: {date}\n"));
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("tags: [{}]\n", self.tags.join(", ")));
        }
        if let Some(layout) = &self.layout {
            out.push_str(&format!("layout: {layout}\n"));
        }
        if let Some(comments) = self.comments {
            out.push_str(&format!("comments: {comments}\n"));
        }
        if self.draft {
            out.push_str("draft: true\n");
        }
        for (key, value) in &self.extra {
            out.push_str(&format!("{key}: {}\n", value.serialize()));
        }

        out.push_str(DELIMITER);
        out.push('\n');
        out
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FrontMatterError> {
        match key {
            "title" => self.title = Some(unquote(value).to_owned()),
            "date" => {
                if DateTimeUtc::parse(value).is_none() {
                    return Err(FrontMatterError::InvalidDate(value.to_owned()));
                }
                self.raw_date = Some(value.to_owned());
            }
            "tags" => self.tags = parse_list(value),
            "layout" => self.layout = Some(unquote(value).to_owned()),
            "comments" => self.comments = Some(parse_bool(key, value)?),
            "draft" => self.draft = parse_bool(key, value)?,
            _ => self.extra.push((key.to_owned(), parse_value(value))),
        }
        Ok(())
    }
}

/// Strip a leading `---` line, tolerating CRLF.
/// Returns the text after the delimiter line, or `None` if absent.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    if let Some(rest) = rest.strip_prefix('\n') {
        return Some(rest);
    }
    rest.strip_prefix("\r\n")
}

/// Split block text at the closing delimiter line.
fn split_terminated(rest: &str) -> Result<(&str, &str), FrontMatterError> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let body = &rest[offset + line.len()..];
            return Ok((&rest[..offset], body));
        }
        offset += line.len();
    }
    Err(FrontMatterError::Unterminated)
}

/// Parse `[a, b, c]` or a single bare scalar into a list.
fn parse_list(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    inner
        .split(',')
        .map(|item| unquote(item.trim()).to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, FrontMatterError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FrontMatterError::InvalidBool {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}

/// A value with no recognized key: bool, list, or plain string.
fn parse_value(value: &str) -> FrontValue {
    match value {
        "true" => FrontValue::Bool(true),
        "false" => FrontValue::Bool(false),
        v if v.starts_with('[') && v.ends_with(']') => FrontValue::List(parse_list(v)),
        v => FrontValue::String(unquote(v).to_owned()),
    }
}

/// Strip one pair of surrounding single or double quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
