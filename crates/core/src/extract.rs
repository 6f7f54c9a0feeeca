use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::parse::{Document, Element};
use crate::sanitize::sanitize_fragment;
use crate::scoring::{ScoreConfig, link_density, score_element};
use crate::{PaperfoldError, Result};

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum score threshold for top candidate
    pub min_score_threshold: f64,
    /// Minimum character threshold for content
    pub char_threshold: usize,
    /// Maximum elements to consider
    pub max_elements: usize,
    /// Sibling score threshold (multiplier of top score)
    pub sibling_threshold: f64,
    pub score: ScoreConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_score_threshold: 10.0,
            char_threshold: 500,
            max_elements: 1000,
            sibling_threshold: 0.2,
            score: ScoreConfig::default(),
        }
    }
}

/// A candidate element with its accumulated score
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    element: Element<'a>,
    score: f64,
}

/// The result of content extraction
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Sanitized body HTML
    pub content: String,
    /// The top candidate score
    pub top_score: f64,
    /// Number of elements extracted
    pub element_count: usize,
}

/// Tags that are considered potential content containers
const CANDIDATE_TAGS: &[&str] = &["div", "article", "section", "main", "p", "td", "pre", "blockquote"];

/// Scores candidate elements and propagates their scores to ancestors.
///
/// Parents receive half of a candidate's score and grandparents a third,
/// on top of their own score. Candidates come back in discovery order.
fn collect_candidates<'a>(doc: &'a Document, config: &ExtractConfig) -> Vec<Candidate<'a>> {
    let mut candidates: Vec<Candidate<'a>> = Vec::new();
    let mut index = HashMap::new();
    let max_elements = if config.max_elements == 0 { usize::MAX } else { config.max_elements };
    let mut scanned = 0usize;

    'scan: for tag in CANDIDATE_TAGS {
        let Ok(elements) = doc.select(tag) else { continue };
        for element in elements {
            if scanned >= max_elements {
                break 'scan;
            }
            scanned += 1;

            if !matches!(element.tag_name().as_str(), "article" | "section" | "main")
                && element.text().trim().chars().count() < config.char_threshold / 10
            {
                continue;
            }

            let score = score_element(&element, &config.score).final_score;
            index.insert(element.key(), candidates.len());
            candidates.push(Candidate { element, score });
        }
    }

    let scored: Vec<Candidate<'a>> = candidates.clone();
    for candidate in scored {
        let Some(parent) = candidate.element.parent().filter(|p| p.tag_name() != "html") else { continue };
        let grandparent = parent.parent().filter(|g| g.tag_name() != "html");

        for (ancestor, share) in [(Some(parent), 2.0), (grandparent, 3.0)] {
            let Some(ancestor) = ancestor else { continue };
            let slot = *index.entry(ancestor.key()).or_insert_with(|| {
                let score = score_element(&ancestor, &config.score).final_score;
                candidates.push(Candidate { element: ancestor, score });
                candidates.len() - 1
            });
            candidates[slot].score += candidate.score / share;
        }
    }

    candidates
}

fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.score
        .partial_cmp(&b.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| candidate_priority(&a.element.tag_name()).cmp(&candidate_priority(&b.element.tag_name())))
        .then_with(|| a.element.text().chars().count().cmp(&b.element.text().chars().count()))
}

fn candidate_priority(tag_name: &str) -> u8 {
    match tag_name {
        "article" | "main" | "section" => 3,
        "div" => 2,
        _ => 1,
    }
}

/// Siblings of the top candidate that are worth keeping, in document order.
///
/// A sibling qualifies when it scored at least `top * sibling_threshold`;
/// paragraphs also need more than 80 characters and a link density under 0.25.
fn with_siblings<'a>(top: &Candidate<'a>, candidates: &[Candidate<'a>], config: &ExtractConfig) -> Vec<Element<'a>> {
    let Some(parent) = top.element.parent() else {
        return vec![top.element];
    };
    let threshold = top.score * config.sibling_threshold;

    let qualifies = |element: &Element<'a>| {
        if element.same_node(&top.element) {
            return true;
        }
        let Some(candidate) = candidates.iter().find(|c| c.element.same_node(element)) else {
            return false;
        };
        if candidate.score < threshold {
            return false;
        }
        if element.tag_name() == "p" {
            return element.text().trim().chars().count() > 80 && link_density(element) < 0.25;
        }
        true
    };

    parent.children().into_iter().filter(qualifies).collect()
}

/// Extract the main content from a document
///
/// Scores candidate containers, picks the best one, merges qualifying
/// siblings and sanitizes the result down to the body tag allow-list.
///
/// # Errors
///
/// [`PaperfoldError::Extraction`] when nothing scores above
/// `min_score_threshold`.
pub fn extract_content(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    let mut candidates = collect_candidates(doc, config);
    if candidates.is_empty() {
        return Err(PaperfoldError::Extraction("No article content found".to_string()));
    }

    candidates.sort_by(|a, b| compare_candidates(b, a));
    let top = candidates[0];
    if top.score < config.min_score_threshold {
        return Err(PaperfoldError::Extraction(format!(
            "Content is not readable (score {:.1} below threshold {:.1})",
            top.score, config.min_score_threshold
        )));
    }

    let elements = with_siblings(&top, &candidates, config);
    debug!(top_score = top.score, tag = %top.element.tag_name(), elements = elements.len(), "picked article container");

    let html: Vec<String> = elements.iter().map(Element::outer_html).collect();
    let content = sanitize_fragment(&html.join("\n"));

    Ok(ExtractedContent { content, top_score: top.score, element_count: elements.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"
        <html>
            <body>
                <nav class="menu"><a href="/">Home</a><a href="/about">About</a></nav>
                <article class="post">
                    <h1>Article Title</h1>
                    <p>This is a long paragraph with lots of content to ensure it meets the character threshold.
                    It continues with more text, more content, and even more text to increase the character count.</p>
                    <p>Another paragraph with substantial content. It has multiple sentences,
                    commas for density, and enough text to be considered meaningful content.</p>
                </article>
            </body>
        </html>
    "#;

    #[test]
    fn test_extract_config_default() {
        let config = ExtractConfig::default();
        assert_eq!(config.min_score_threshold, 10.0);
        assert_eq!(config.char_threshold, 500);
        assert_eq!(config.sibling_threshold, 0.2);
    }

    #[test]
    fn test_candidates_include_article() {
        let doc = Document::parse(ARTICLE).unwrap();
        let candidates = collect_candidates(&doc, &ExtractConfig::default());
        assert!(candidates.iter().any(|c| c.element.tag_name() == "article"));
    }

    #[test]
    fn test_scores_propagate_to_parent() {
        let doc = Document::parse(ARTICLE).unwrap();
        let config = ExtractConfig::default();
        let candidates = collect_candidates(&doc, &config);

        let article = candidates.iter().find(|c| c.element.tag_name() == "article").unwrap();
        let own = score_element(&article.element, &config.score).final_score;
        assert!(article.score > own);
    }

    #[test]
    fn test_extract_picks_article_body() {
        let doc = Document::parse(ARTICLE).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        assert!(extracted.content.contains("<h1>Article Title</h1>"));
        assert!(extracted.content.contains("Another paragraph"));
        assert!(!extracted.content.contains("Home"));
        assert!(!extracted.content.contains("class="));
        assert!(extracted.top_score >= 10.0);
    }

    #[test]
    fn test_siblings_in_document_order() {
        let html = r#"
            <html><body><div id="page">
                <div class="story">
                    <p>The first block of the story has plenty of prose, commas, clauses, and detail to score well.</p>
                    <p>It goes on with a second paragraph of prose, again with commas, to carry some more weight.</p>
                </div>
                <div class="story-more">
                    <p>The continuation sits in its own container, with enough prose, commas, and words to count.</p>
                </div>
            </div></body></html>
        "#;
        let doc = Document::parse(html).unwrap();
        let extracted = extract_content(&doc, &ExtractConfig::default()).unwrap();

        let first = extracted.content.find("first block").unwrap();
        let continuation = extracted.content.find("continuation").unwrap();
        assert!(first < continuation);
    }

    #[test]
    fn test_not_readable_error() {
        let html = r##"
            <html>
                <body>
                    <nav class="menu">
                        <a href="#">Link 1</a>
                        <a href="#">Link 2</a>
                    </nav>
                    <div class="sidebar">Sidebar <a href="#">Nav Link</a></div>
                </body>
            </html>
        "##;

        let doc = Document::parse(html).unwrap();
        let result = extract_content(&doc, &ExtractConfig::default());
        assert!(matches!(result, Err(PaperfoldError::Extraction(_))));
    }

    #[test]
    fn test_empty_document_error() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let result = extract_content(&doc, &ExtractConfig::default());
        assert!(matches!(result, Err(PaperfoldError::Extraction(_))));
    }
}
