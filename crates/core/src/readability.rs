//! Local article extraction.
//!
//! [`Readability`] turns a raw HTML page into an [`ArticleRecord`] without
//! any network access: metadata comes from the untouched page, the body
//! from content-density scoring over the cleaned page.
//!
//! # Example
//!
//! ```rust
//! use paperfold_core::Readability;
//!
//! let html = r#"<html><head><title>Hello</title></head><body><article class="post">
//!     <p>A paragraph long enough to be picked up by the scorer, with commas, clauses, and words.</p>
//! </article></body></html>"#;
//! let article = Readability::new().parse_with_url(html, "https://example.com/hello").unwrap();
//! assert_eq!(article.title, "Hello");
//! assert!(article.article_body_html.contains("paragraph long enough"));
//! ```

use tracing::{debug, info};
use url::Url;

use crate::article::ArticleRecord;
use crate::extract::{ExtractConfig, extract_content};
use crate::parse::Document;
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::{PaperfoldError, Result};

/// Title used when the page carries none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Configuration for the local extractor.
///
/// # Example
///
/// ```rust
/// use paperfold_core::ReadabilityConfig;
///
/// let config = ReadabilityConfig::builder().min_score(25.0).char_threshold(300).build();
/// assert_eq!(config.min_score, 25.0);
/// ```
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Minimum score the best container needs (default: 10.0).
    pub min_score: f64,

    /// Character count that marks a container as content-rich (default: 500).
    pub char_threshold: usize,

    /// Maximum elements to score (0 = default cap of 1000).
    pub max_elems_to_parse: usize,

    /// Whether to unwrap page chrome before scoring (default: true).
    pub remove_unlikely: bool,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self { min_score: 10.0, char_threshold: 500, max_elems_to_parse: 0, remove_unlikely: true }
    }
}

impl ReadabilityConfig {
    pub fn builder() -> ReadabilityConfigBuilder {
        ReadabilityConfigBuilder::new()
    }

    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            min_score_threshold: self.min_score,
            char_threshold: self.char_threshold,
            max_elements: if self.max_elems_to_parse == 0 { 1000 } else { self.max_elems_to_parse },
            ..Default::default()
        }
    }
}

/// Builder for ReadabilityConfig.
#[derive(Default)]
pub struct ReadabilityConfigBuilder {
    config: ReadabilityConfig,
}

impl ReadabilityConfigBuilder {
    pub fn new() -> Self {
        Self { config: ReadabilityConfig::default() }
    }

    pub fn min_score(mut self, value: f64) -> Self {
        self.config.min_score = value;
        self
    }

    pub fn char_threshold(mut self, value: usize) -> Self {
        self.config.char_threshold = value;
        self
    }

    pub fn max_elems_to_parse(mut self, value: usize) -> Self {
        self.config.max_elems_to_parse = value;
        self
    }

    pub fn remove_unlikely(mut self, value: bool) -> Self {
        self.config.remove_unlikely = value;
        self
    }

    pub fn build(self) -> ReadabilityConfig {
        self.config
    }
}

/// Local, offline article extractor.
#[derive(Debug, Clone, Default)]
pub struct Readability {
    config: ReadabilityConfig,
}

impl Readability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadabilityConfig) -> Self {
        Self { config }
    }

    /// Extracts an article from HTML with no page URL.
    pub fn parse(&self, html: &str) -> Result<ArticleRecord> {
        self.extract(html, None)
    }

    /// Extracts an article, resolving relative links and the feature image
    /// against `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PaperfoldError::InvalidUrl`] if the URL does not parse. A
    /// page with no readable content is not an error: the record comes back
    /// with an empty body so the caller can decide what to do with it.
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<ArticleRecord> {
        let base_url = Url::parse(url).map_err(|e| PaperfoldError::InvalidUrl(format!("{url}: {e}")))?;
        self.extract(html, Some(base_url))
    }

    fn extract(&self, html: &str, base_url: Option<Url>) -> Result<ArticleRecord> {
        let original = Document::parse_with_url(html, base_url.clone())?;
        let metadata = original.extract_metadata();

        let preprocess = PreprocessConfig {
            remove_unlikely: self.config.remove_unlikely,
            base_url: base_url.clone(),
            ..Default::default()
        };
        let cleaned = Document::parse_with_url(&preprocess_html(html, &preprocess), base_url)?;

        let body = match extract_content(&cleaned, &self.config.extract_config()) {
            Ok(extracted) => {
                info!(score = extracted.top_score, elements = extracted.element_count, "extracted article locally");
                extracted.content
            }
            Err(err) => {
                debug!(error = %err, "local extraction found no article body");
                String::new()
            }
        };

        Ok(ArticleRecord {
            title: metadata.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: metadata.author,
            publication_name: metadata.site_name,
            publication_date: metadata.date,
            feature_image_url: metadata.feature_image,
            article_body_html: body,
        })
    }
}
