//! HTML cleanup ahead of parsing.
//!
//! Two cleanups live here: [`preprocess_html`] prepares a page for the
//! local content scorer, and [`strip_for_remote`] shrinks a page before it
//! is sent to the remote extractor.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Tags dropped (with their content) before a page is sent for remote extraction.
pub const REMOTE_STRIP_TAGS: &[&str] =
    &["script", "style", "svg", "nav", "footer", "aside", "noscript", "iframe", "path", "symbol"];

/// Tags dropped (with their content) before local scoring.
const UNWANTED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas", "form", "button"];

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static UNLIKELY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|share|newsletter|subscribe)",
    )
    .unwrap()
});
static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story)").unwrap()
});
static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());

/// Runs an `HtmlRewriter` over `$html` with the given element handlers.
///
/// Evaluates to `None` when the rewriter reports an error.
macro_rules! rewrite_html {
    ($html:expr, $handlers:expr) => {{
        let html: &str = $html;
        let mut output = String::new();
        let mut rewriter = lol_html::HtmlRewriter::new(
            lol_html::Settings { element_content_handlers: $handlers, ..Default::default() },
            |c: &[u8]| {
                output.push_str(&String::from_utf8_lossy(c));
            },
        );

        let ok = match rewriter.write(html.as_bytes()) {
            Ok(()) => rewriter.end().is_ok(),
            Err(_) => {
                drop(rewriter);
                false
            }
        };
        if ok { Some(output) } else { None }
    }};
}

pub(crate) use rewrite_html;

/// Keeps the original markup when a rewrite failed or produced nothing.
fn or_original(rewritten: Option<String>, html: &str) -> String {
    match rewritten {
        Some(output) if !output.is_empty() => output,
        _ => html.to_string(),
    }
}

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script, style, form and embed tags
    pub remove_unwanted: bool,
    /// Whether to unwrap elements whose class/id look like page chrome
    pub remove_unlikely: bool,
    /// Whether to keep positive candidates even if they match unlikely patterns
    pub keep_positive: bool,
    /// Whether to remove hidden elements
    pub remove_hidden: bool,
    /// Whether to convert relative URLs to absolute
    pub convert_urls: bool,
    /// Base URL for converting relative URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_unwanted: true,
            remove_unlikely: true,
            keep_positive: true,
            remove_hidden: true,
            convert_urls: true,
            base_url: None,
        }
    }
}

/// Preprocess HTML by removing unwanted elements and normalizing the document
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = html.to_string();

    if config.remove_unwanted {
        processed = remove_tags(&processed, UNWANTED_TAGS);
    }

    processed = remove_comments(&processed);

    if config.remove_unlikely {
        processed = remove_unlikely_candidates(&processed, config.keep_positive);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if config.convert_urls
        && let Some(base_url) = &config.base_url
    {
        processed = convert_relative_urls(&processed, base_url);
    }

    normalize_whitespace(&processed)
}

/// Shrinks a page for remote extraction: drops non-content tags and
/// comments, then returns only the `<body>` markup.
pub fn strip_for_remote(html: &str) -> String {
    let stripped = remove_comments(&remove_tags(html, REMOTE_STRIP_TAGS));
    let doc = scraper::Html::parse_document(&stripped);
    let body = scraper::Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next().map(|body| body.inner_html()))
        .unwrap_or(stripped);

    normalize_whitespace(&body).trim().to_string()
}

/// Remove every element matching one of `tags`, content included
fn remove_tags(html: &str, tags: &[&str]) -> String {
    let rewritten = rewrite_html!(
        html,
        tags.iter()
            .map(|tag| {
                lol_html::element!(*tag, |el| {
                    el.remove();
                    Ok(())
                })
            })
            .collect()
    );
    or_original(rewritten, html)
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").to_string()
}

/// Unwrap elements that match unlikely candidate patterns
fn remove_unlikely_candidates(html: &str, keep_positive: bool) -> String {
    let is_unlikely = |value: &str| UNLIKELY.is_match(value) && (!keep_positive || !POSITIVE.is_match(value));

    let rewritten = rewrite_html!(
        html,
        vec![lol_html::element!("*", |el| {
            if matches!(el.tag_name().as_str(), "html" | "body" | "article" | "main") {
                return Ok(());
            }

            if let Some(id) = el.get_attribute("id")
                && is_unlikely(&id)
            {
                el.remove_and_keep_content();
                return Ok(());
            }

            if let Some(class) = el.get_attribute("class")
                && class.split_whitespace().any(is_unlikely)
            {
                el.remove_and_keep_content();
            }

            Ok(())
        })]
    );
    or_original(rewritten, html)
}

/// Convert relative link and image URLs to absolute URLs
pub fn convert_relative_urls(html: &str, base_url: &Url) -> String {
    let rewritten = rewrite_html!(
        html,
        vec![
            lol_html::element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Ok(absolute) = base_url.join(&href)
                {
                    el.set_attribute("href", absolute.as_str()).ok();
                }
                Ok(())
            }),
            lol_html::element!("img[src]", |el| {
                if let Some(src) = el.get_attribute("src")
                    && let Ok(absolute) = base_url.join(&src)
                {
                    el.set_attribute("src", absolute.as_str()).ok();
                }
                Ok(())
            }),
        ]
    );
    or_original(rewritten, html)
}

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    let rewritten = rewrite_html!(
        html,
        vec![
            lol_html::element!("[style]", |el| {
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
                }
                Ok(())
            }),
            lol_html::element!("[hidden]", |el| {
                el.remove();
                Ok(())
            }),
            lol_html::element!("[aria-hidden=\"true\"]", |el| {
                el.remove();
                Ok(())
            }),
        ]
    );
    or_original(rewritten, html)
}

/// Normalize whitespace in HTML
fn normalize_whitespace(html: &str) -> String {
    WHITESPACE.replace_all(html, " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_unwanted_tags() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = remove_tags(html, UNWANTED_TAGS);
        assert!(!result.contains("<script"));
        assert!(!result.contains("<style"));
        assert!(!result.contains("alert"), "Script content should be removed");
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("example.com"));
        assert!(!result.contains("rect"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_remove_comments() {
        let html = "<body><!-- a\nmultiline comment --><p>Visible content</p></body>";
        let result = remove_comments(html);
        assert!(!result.contains("<!--"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_remove_unlikely_candidates() {
        let html = r#"
            <html>
                <body>
                    <div id="sidebar"><span>Sidebar text</span></div>
                    <div id="main-content">Main content</div>
                    <div class="banner-ad">Ad</div>
                </body>
            </html>
        "#;

        let result = remove_unlikely_candidates(html, true);
        assert!(!result.contains("id=\"sidebar\""));
        assert!(!result.contains("banner-ad"));
        assert!(result.contains("main-content"));
        assert!(result.contains("Sidebar text"), "unwrapping keeps the text");
    }

    #[test]
    fn test_convert_relative_urls() {
        let base = Url::parse("https://example.com/blog/").unwrap();
        let html = r#"<a href="/about">About</a><a href="post.html">Post</a><img src="image.jpg" />"#;

        let result = convert_relative_urls(html, &base);
        assert!(result.contains("href=\"https://example.com/about\""));
        assert!(result.contains("href=\"https://example.com/blog/post.html\""));
        assert!(result.contains("src=\"https://example.com/blog/image.jpg\""));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <div style="display:none">Hidden content</div>
            <div style="visibility: hidden">Invisible content</div>
            <div hidden>Attribute hidden</div>
            <div>Visible content</div>
        "#;

        let result = remove_hidden_elements(html);
        assert!(!result.contains("Hidden content"));
        assert!(!result.contains("Invisible content"));
        assert!(!result.contains("Attribute hidden"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_strip_for_remote() {
        let html = r#"
            <html>
            <head><title>T</title><style>p{}</style></head>
            <body>
                <nav><a href="/">Home</a></nav>
                <script>track()</script>
                <article><p>Story text</p><svg><path d="M0"/><symbol id="s"/></svg></article>
                <aside>Related</aside>
                <footer>Copyright</footer>
            </body>
            </html>
        "#;

        let result = strip_for_remote(html);
        assert!(result.contains("<p>Story text</p>"));
        for gone in ["Home", "track()", "<svg", "<path", "Related", "Copyright", "<title>"] {
            assert!(!result.contains(gone), "{gone} should be stripped");
        }
    }

    #[test]
    fn test_preprocess_full_pipeline() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <script>console.log('test');</script>
                <!-- Comment -->
            </head>
            <body>
                <div id="sidebar" class="menu">
                    <p>Sidebar</p>
                </div>
                <div id="main" class="article">
                    <a href="/post">Link</a>
                    <p style="display:none">Hidden</p>
                    <p>Content</p>
                </div>
            </body>
            </html>
        "#;

        let base = Url::parse("https://example.com").unwrap();
        let config = PreprocessConfig { base_url: Some(base), ..Default::default() };

        let result = preprocess_html(html, &config);

        assert!(!result.contains("<script"));
        assert!(!result.contains("<!--"));
        assert!(!result.contains("id=\"sidebar\""));
        assert!(!result.contains("Hidden"));
        assert!(result.contains("href=\"https://example.com/post\""));
        assert!(result.contains("Content"));
    }
}
