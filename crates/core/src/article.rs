//! The canonical article record.
//!
//! [`ArticleRecord`] is what every acquisition path normalizes into and what
//! the layout engine renders. Its JSON shape (camelCase) is also the shape
//! the remote extractor is asked to return.
//!
//! Only `title` and `article_body_html` are required downstream. For the
//! optional fields, absent, empty and the literal string `"null"` (in any
//! case) all mean "omit this from layout"; the accessor methods apply that
//! rule so consumers never look at the raw fields.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::format_publication_date;

static FORBIDDEN_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).unwrap());
static NON_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)[^a-z0-9\-\s]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Title used at render time when the record has none.
pub const UNTITLED: &str = "Untitled";

/// A normalized article, immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_name: Option<String>,

    /// Free-form source date text; normalized only when rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    /// Absolute URL of the representative image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_image_url: Option<String>,

    /// Sanitized HTML fragment restricted to the body tag allow-list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub article_body_html: String,
}

/// Reads a JSON `null` string field as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Returns the trimmed value unless it is missing, blank, or `"null"`.
pub fn present(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") { None } else { Some(value) }
}

impl ArticleRecord {
    /// Title to render, falling back to [`UNTITLED`].
    pub fn display_title(&self) -> &str {
        present(Some(self.title.as_str())).unwrap_or(UNTITLED)
    }

    /// Author line, omitted for absent, blank, or `"null"` values.
    pub fn author_line(&self) -> Option<&str> {
        present(self.author.as_deref())
    }

    pub fn publication_name(&self) -> Option<&str> {
        present(self.publication_name.as_deref())
    }

    /// Publication date as `MM/DD/YYYY`, empty when unparseable.
    pub fn formatted_date(&self) -> String {
        present(self.publication_date.as_deref())
            .map(format_publication_date)
            .unwrap_or_default()
    }

    /// Publication name and formatted date joined with `" - "`.
    ///
    /// Either side is dropped when absent; `None` when both are.
    pub fn byline(&self) -> Option<String> {
        let date = self.formatted_date();
        let parts: Vec<&str> = [self.publication_name(), Some(date.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() { None } else { Some(parts.join(" - ")) }
    }

    pub fn feature_image_url(&self) -> Option<&str> {
        present(self.feature_image_url.as_deref())
    }

    /// Whether a title is present at all (before the render-time fallback).
    pub fn has_title(&self) -> bool {
        present(Some(self.title.as_str())).is_some()
    }

    /// Number of characters in the trimmed body HTML.
    pub fn body_len(&self) -> usize {
        self.article_body_html.trim().chars().count()
    }

    /// File name for the generated document, without extension.
    pub fn file_stem(&self) -> String {
        sanitize_filename(&self.title)
    }
}

/// Turns an article title into a safe file name stem.
///
/// Filesystem-hostile characters are removed, anything that is not an
/// ASCII letter, digit, hyphen, or whitespace becomes a space, whitespace
/// runs collapse, and an empty result falls back to `"document"`.
pub fn sanitize_filename(title: &str) -> String {
    let stripped = FORBIDDEN_FILENAME_CHARS.replace_all(title, "");
    let replaced = NON_FILENAME_CHARS.replace_all(&stripped, " ");
    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() { "document".to_string() } else { trimmed.to_string() }
}
