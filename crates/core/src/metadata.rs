//! Article metadata lookups on the untouched page.
//!
//! Each field walks a priority list (JSON-LD, Open Graph and other meta
//! tags, then markup conventions) and returns the first non-blank value.

use serde_json::Value;

use crate::Document;

/// Metadata found in a page's head and markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub site_name: Option<String>,
    /// Absolute URL of the page's share image.
    pub feature_image: Option<String>,
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. JSON-LD `headline`
    /// 2. Open Graph `og:title`
    /// 3. Twitter `twitter:title`
    /// 4. `<title>` element
    /// 5. First `<h1>` element
    pub fn extract_title(&self) -> Option<String> {
        self.json_ld_str(&["headline"])
            .or_else(|| self.meta_content("og:title"))
            .or_else(|| self.meta_content("twitter:title"))
            .or_else(|| self.title())
            .or_else(|| self.first_text("h1", usize::MAX))
    }

    /// Extract author with priority fallback:
    /// 1. JSON-LD `author` (string, object or first array entry)
    /// 2. Meta `author`
    /// 3. `[rel="author"]` link text
    /// 4. `[itemprop="author"]` text
    /// 5. Short text of an element whose class mentions a byline
    pub fn extract_author(&self) -> Option<String> {
        if let Some(author) = self.json_ld().as_ref().and_then(|ld| ld.get("author")).and_then(author_name) {
            return Some(author);
        }

        self.meta_content("author")
            .or_else(|| self.first_text("[rel=\"author\"]", usize::MAX))
            .or_else(|| self.first_text("[itemprop=\"author\"]", usize::MAX))
            .or_else(|| {
                ["byline", "author"]
                    .iter()
                    .find_map(|hint| self.first_text(&format!("[class*=\"{hint}\"]"), 100))
            })
    }

    /// Extract the raw publication date text:
    /// 1. JSON-LD `datePublished`
    /// 2. Meta `article:published_time`
    /// 3. `<time datetime="">`
    /// 4. Meta `date`
    pub fn extract_date(&self) -> Option<String> {
        self.json_ld_str(&["datePublished"])
            .or_else(|| self.meta_content("article:published_time"))
            .or_else(|| {
                self.select("time[datetime]")
                    .ok()?
                    .first()
                    .and_then(|time| time.attr("datetime"))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
            .or_else(|| self.meta_content("date"))
    }

    /// Extract site name: Open Graph `og:site_name`, then JSON-LD `publisher.name`.
    pub fn extract_site_name(&self) -> Option<String> {
        self.meta_content("og:site_name").or_else(|| self.json_ld_str(&["publisher", "name"]))
    }

    /// Share image from `og:image`, then `twitter:image`, resolved against the page URL.
    pub fn extract_feature_image(&self) -> Option<String> {
        self.meta_content("og:image")
            .or_else(|| self.meta_content("twitter:image"))
            .map(|href| self.resolve_url(&href))
    }

    /// Extract all metadata at once
    pub fn extract_metadata(&self) -> Metadata {
        Metadata {
            title: self.extract_title(),
            author: self.extract_author(),
            date: self.extract_date(),
            site_name: self.extract_site_name(),
            feature_image: self.extract_feature_image(),
        }
    }

    /// `content` of the first `meta` whose `name` or `property` is `key`.
    fn meta_content(&self, key: &str) -> Option<String> {
        ["name", "property"].iter().find_map(|attr| {
            self.select(&format!("meta[{attr}=\"{key}\"]"))
                .ok()?
                .first()
                .and_then(|meta| meta.attr("content"))
                .map(str::trim)
                .filter(|content| !content.is_empty())
                .map(str::to_string)
        })
    }

    /// Trimmed text of the first matching element that is non-empty and shorter than `max_chars`.
    fn first_text(&self, selector: &str, max_chars: usize) -> Option<String> {
        self.select(selector).ok()?.iter().take(3).find_map(|el| {
            let text = el.text();
            let text = text.trim();
            (!text.is_empty() && text.chars().count() < max_chars).then(|| text.to_string())
        })
    }

    /// First JSON-LD block that parses, unwrapping `@graph` to its first article-like node.
    fn json_ld(&self) -> Option<Value> {
        let scripts = self.select("script[type=\"application/ld+json\"]").ok()?;
        let value = scripts.iter().find_map(|el| serde_json::from_str::<Value>(el.text().trim()).ok())?;

        let article = value
            .get("@graph")
            .and_then(Value::as_array)
            .and_then(|graph| graph.iter().find(|node| node.get("headline").is_some()).cloned());
        Some(article.unwrap_or(value))
    }

    fn json_ld_str(&self, path: &[&str]) -> Option<String> {
        let ld = self.json_ld()?;
        let value = path.iter().try_fold(&ld, |node, key| node.get(key))?;
        value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }
}

/// Author name from a JSON-LD `author` value: a string, an object with
/// `name`, or the first entry of an array of either.
fn author_name(author: &Value) -> Option<String> {
    match author {
        Value::String(name) => Some(name.trim().to_string()).filter(|n| !n.is_empty()),
        Value::Object(obj) => obj.get("name").and_then(author_name),
        Value::Array(items) => items.first().and_then(author_name),
        _ => None,
    }
}
