//! Content-density scoring for candidate containers.
//!
//! Each element gets a score from its tag, its class/id hints, the amount
//! of prose it holds (characters and commas) and how much of that prose is
//! link text. [`crate::extract`] uses these scores to pick the container
//! most likely to be the article body.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Element;

static POSITIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(article|body|content|entry|hentry|h-entry|main|page|post|text|blog|story|prose)").unwrap()
});

static NEGATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(banner|breadcrumbs?|combx|comment|community|disqus|extra|foot|header|menu|related|remark|rss|shoutbox|sidebar|sponsor|ad-break|agegate|pagination|pager|popup|promo|share|social|widget)",
    )
    .unwrap()
});

/// Configuration for content scoring algorithm
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// Weight for positive class/ID patterns
    pub positive_weight: f64,
    /// Weight for negative class/ID patterns
    pub negative_weight: f64,
    /// Maximum content density score from character count
    pub max_char_density_score: f64,
    /// Maximum content density score from comma count
    pub max_comma_density_score: f64,
    /// Characters per point for content density scoring
    pub chars_per_point: usize,
    /// Text length above which link density is only half-penalized
    pub content_rich_chars: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            positive_weight: 25.0,
            negative_weight: -25.0,
            max_char_density_score: 3.0,
            max_comma_density_score: 3.0,
            chars_per_point: 100,
            content_rich_chars: 500,
        }
    }
}

/// Breakdown of an element's score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub base_score: f64,
    pub class_weight: f64,
    pub content_density: f64,
    /// Ratio of link text to all text (0.0 to 1.0)
    pub link_density: f64,
    pub final_score: f64,
}

/// Base score from the tag name.
///
/// Containers that usually hold prose score high; lists, headings and
/// page chrome score low.
pub fn base_tag_score(tag_name: &str) -> f64 {
    match tag_name {
        "article" => 10.0,
        "section" | "main" => 8.0,
        "div" => 5.0,
        "td" | "blockquote" => 3.0,
        "pre" | "p" => 0.0,
        "form" => -3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" | "header" | "footer" | "nav" | "aside" => -5.0,
        _ => 0.0,
    }
}

/// Class/ID weight: positive hints win over negative ones on the same value.
pub fn class_id_weight(element: &Element<'_>, config: &ScoreConfig) -> f64 {
    let values = element
        .attr("id")
        .into_iter()
        .chain(element.attr("class").into_iter().flat_map(str::split_whitespace));

    for value in values {
        if POSITIVE.is_match(value) {
            return config.positive_weight;
        }
        if NEGATIVE.is_match(value) {
            return config.negative_weight;
        }
    }

    0.0
}

/// Score from text length and comma count, each capped.
pub fn content_density_score(text: &str, config: &ScoreConfig) -> f64 {
    let char_score = ((text.chars().count() / config.chars_per_point.max(1)) as f64).min(config.max_char_density_score);
    let comma_score = (text.matches(',').count() as f64).min(config.max_comma_density_score);

    char_score + comma_score
}

/// Ratio of link text characters to total text characters.
pub fn link_density(element: &Element<'_>) -> f64 {
    let text_length = element.text().chars().count();
    if text_length == 0 {
        return 0.0;
    }

    let link_text_length: usize = element
        .select("a")
        .unwrap_or_default()
        .iter()
        .map(|link| link.text().chars().count())
        .sum();

    link_text_length as f64 / text_length as f64
}

/// Scores an element.
///
/// `(base + class weight + density) * (1 - link density)`, with the link
/// penalty halved for elements that carry a positive hint or a lot of text.
pub fn score_element(element: &Element<'_>, config: &ScoreConfig) -> ScoreResult {
    let text = element.text();
    let base_score = base_tag_score(&element.tag_name());
    let class_weight = class_id_weight(element, config);
    let content_density = content_density_score(&text, config);
    let link_density = link_density(element);

    let lenient = class_weight > 0.0 || text.chars().count() > config.content_rich_chars;
    let link_penalty = if lenient { 1.0 - link_density * 0.5 } else { 1.0 - link_density };
    let final_score = (base_score + class_weight + content_density) * link_penalty;

    ScoreResult { base_score, class_weight, content_density, link_density, final_score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn first<'a>(doc: &'a Document, selector: &str) -> Element<'a> {
        doc.select(selector).unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn test_base_tag_scores() {
        assert_eq!(base_tag_score("article"), 10.0);
        assert_eq!(base_tag_score("div"), 5.0);
        assert_eq!(base_tag_score("nav"), -5.0);
        assert_eq!(base_tag_score("span"), 0.0);
    }

    #[test]
    fn test_class_weight_positive() {
        let doc = Document::parse(r#"<div class="wrapper article-content">Content</div>"#).unwrap();
        assert_eq!(class_id_weight(&first(&doc, "div"), &ScoreConfig::default()), 25.0);
    }

    #[test]
    fn test_class_weight_negative() {
        let doc = Document::parse(r#"<div class="sidebar">Content</div>"#).unwrap();
        assert_eq!(class_id_weight(&first(&doc, "div"), &ScoreConfig::default()), -25.0);
    }

    #[test]
    fn test_class_weight_id_checked_first() {
        let doc = Document::parse(r#"<div id="main-article" class="sidebar">Content</div>"#).unwrap();
        assert_eq!(class_id_weight(&first(&doc, "div"), &ScoreConfig::default()), 25.0);
    }

    #[test]
    fn test_class_weight_no_match() {
        let doc = Document::parse(r#"<div class="container" id="wrapper">Content</div>"#).unwrap();
        assert_eq!(class_id_weight(&first(&doc, "div"), &ScoreConfig::default()), 0.0);
    }

    #[test]
    fn test_content_density() {
        let config = ScoreConfig::default();
        assert_eq!(content_density_score("Short text here.", &config), 0.0);
        assert_eq!(content_density_score("a, b, c, d, e", &config), 3.0);
        assert_eq!(content_density_score(&"a".repeat(1000), &config), 3.0);
    }

    #[test]
    fn test_link_density() {
        let doc = Document::parse(
            r##"<div id="a">Text content without any links.</div><div id="b"><a href="#">Link text</a></div><div id="c">Some text <a href="#">link</a> more text</div>"##,
        )
        .unwrap();
        assert_eq!(link_density(&first(&doc, "#a")), 0.0);
        assert_eq!(link_density(&first(&doc, "#b")), 1.0);
        let mixed = link_density(&first(&doc, "#c"));
        assert!(mixed > 0.0 && mixed < 1.0);
    }

    #[test]
    fn test_nav_scores_negative() {
        let doc = Document::parse(r##"<nav class="menu"><a href="#">One</a><a href="#">Two</a></nav>"##).unwrap();
        let result = score_element(&first(&doc, "nav"), &ScoreConfig::default());
        assert_eq!(result.base_score, -5.0);
        assert_eq!(result.class_weight, -25.0);
        assert_eq!(result.link_density, 1.0);
        assert!(result.final_score <= 0.0);
    }

    #[test]
    fn test_article_scores_high() {
        let doc = Document::parse(
            r##"<article class="post">Long prose, with commas, and clauses, and a <a href="#">link</a>, and more words to read.</article>"##,
        )
        .unwrap();
        let result = score_element(&first(&doc, "article"), &ScoreConfig::default());
        assert_eq!(result.base_score, 10.0);
        assert_eq!(result.class_weight, 25.0);
        assert!(result.final_score > 30.0);
    }
}
