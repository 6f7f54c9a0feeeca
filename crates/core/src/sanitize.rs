//! Restricts article HTML to the body tag allow-list.
//!
//! Whatever produced the body (the local scorer or the remote extractor),
//! the layout engine only understands `p, b, strong, i, em, ul, ol, li,
//! blockquote, h1..h6, a, hr`. Everything else is unwrapped (text kept) or,
//! for media and scripting, dropped with its content. Attributes are
//! stripped except `href` on links.

use std::sync::LazyLock;

use lol_html::html_content::ContentType;
use regex::Regex;
use tracing::warn;

use crate::preprocess::rewrite_html;

/// Tags that survive sanitization.
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "b", "strong", "i", "em", "ul", "ol", "li", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "a", "hr",
];

/// Tags removed together with their content.
const DROPPED_TAGS: &[&str] = &[
    "img", "picture", "figure", "figcaption", "video", "audio", "source", "track", "script", "style", "noscript",
    "iframe", "object", "embed", "svg", "canvas", "form", "input", "button", "select", "textarea", "template", "head",
    "title", "meta", "link",
];

/// Block tags removed when they end up with no text.
const EMPTY_BLOCKS: &[&str] = &["p", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "ul", "ol"];

/// Inline tags collapsed to the whitespace they held, so neighbouring words stay apart.
const EMPTY_INLINES: &[&str] = &["b", "strong", "i", "em", "a"];

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*").unwrap());

static EMPTY_BLOCK_NODES: LazyLock<Vec<Regex>> = LazyLock::new(|| empty_node_patterns(EMPTY_BLOCKS));
static EMPTY_INLINE_NODES: LazyLock<Vec<Regex>> = LazyLock::new(|| empty_node_patterns(EMPTY_INLINES));

fn empty_node_patterns(tags: &[&str]) -> Vec<Regex> {
    tags.iter()
        .map(|tag| Regex::new(&format!(r#"<{tag}(?:\s[^>]*)?>((?:\s|&nbsp;)*)</{tag}>"#)).unwrap())
        .collect()
}

/// Configuration for body sanitization
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Whether to remove allow-listed elements left without text
    pub remove_empty_nodes: bool,
    /// Maximum passes for removing empty nodes
    pub max_empty_node_passes: usize,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { remove_empty_nodes: true, max_empty_node_passes: 10 }
    }
}

/// Sanitizes an HTML fragment with the default configuration.
pub fn sanitize_fragment(html: &str) -> String {
    sanitize_with_config(html, &SanitizeConfig::default())
}

/// Sanitizes an HTML fragment down to the allow-list.
pub fn sanitize_with_config(html: &str, config: &SanitizeConfig) -> String {
    let without_comments = COMMENT.replace_all(html, "");
    let mut processed = filter_tags(&without_comments);

    if config.remove_empty_nodes {
        processed = remove_empty_nodes(&processed, config.max_empty_node_passes);
    }

    BLANK_LINES.replace_all(processed.trim(), "\n").to_string()
}

fn filter_tags(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let rewritten = rewrite_html!(
        html,
        vec![lol_html::element!("*", |el| {
            let tag = el.tag_name().to_ascii_lowercase();

            if tag == "br" {
                el.replace(" ", ContentType::Text);
                return Ok(());
            }
            if DROPPED_TAGS.contains(&tag.as_str()) {
                el.remove();
                return Ok(());
            }
            if !ALLOWED_TAGS.contains(&tag.as_str()) {
                el.remove_and_keep_content();
                return Ok(());
            }

            let names: Vec<String> = el.attributes().iter().map(|attr| attr.name()).collect();
            for name in names {
                if !(tag == "a" && name == "href") {
                    el.remove_attribute(&name);
                }
            }

            if tag == "a"
                && let Some(href) = el.get_attribute("href")
                && (href.trim().is_empty() || href.trim_start().to_ascii_lowercase().starts_with("javascript:"))
            {
                el.remove_attribute("href");
            }

            Ok(())
        })]
    );

    rewritten.unwrap_or_else(|| {
        warn!("could not rewrite article body, dropping it");
        String::new()
    })
}

/// Removes empty allow-listed nodes until nothing changes
fn remove_empty_nodes(html: &str, max_passes: usize) -> String {
    let mut result = html.to_string();

    for _ in 0..max_passes {
        let previous = result.clone();
        for re in EMPTY_INLINE_NODES.iter() {
            result = re
                .replace_all(&result, |caps: &regex::Captures| if caps[1].is_empty() { "" } else { " " })
                .to_string();
        }
        for re in EMPTY_BLOCK_NODES.iter() {
            result = re.replace_all(&result, "").to_string();
        }
        if result == previous {
            break;
        }
    }

    result
}
