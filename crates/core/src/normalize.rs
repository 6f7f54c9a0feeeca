//! Turns any acquired source into an [`ArticleRecord`].
//!
//! Web pages go through the local extractor first and fall back to the
//! remote extractor when the local result is unusable. PDF text always
//! goes through the remote formatter.

use tracing::{info, warn};

use crate::article::ArticleRecord;
use crate::fetch::FetchConfig;
use crate::readability::Readability;
use crate::remote::{RemoteConfig, RemoteExtractor};
use crate::{PaperfoldError, Result};

/// Shortest trimmed body (in characters of HTML) a local result may have.
pub const MIN_LOCAL_BODY_CHARS: usize = 50;

/// Which extractor handles web pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Local heuristic, remote fallback when the result is unusable.
    #[default]
    Local,
    /// Remote extractor only.
    Remote,
}

/// Input to normalization.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// A web page and, when known, the URL it came from.
    Html { html: &'a str, url: Option<&'a str> },
    /// Raw text read out of a PDF file.
    PdfText { text: &'a str, filename: &'a str },
}

/// Whether a locally extracted article is good enough to render.
pub fn is_sufficient(article: &ArticleRecord) -> bool {
    article.has_title() && article.body_len() >= MIN_LOCAL_BODY_CHARS
}

/// Dispatches sources to the local and remote extractors.
pub struct Normalizer<'a> {
    readability: Readability,
    remote: &'a RemoteConfig,
    fetch: &'a FetchConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(remote: &'a RemoteConfig, fetch: &'a FetchConfig) -> Self {
        Self { readability: Readability::new(), remote, fetch }
    }

    pub fn with_readability(mut self, readability: Readability) -> Self {
        self.readability = readability;
        self
    }

    /// Normalizes `source` into an article record.
    ///
    /// # Errors
    ///
    /// [`PaperfoldError::Credential`] when the remote extractor is needed and
    /// no key is configured, plus whatever the remote extractor reports.
    pub async fn normalize(&self, source: Source<'_>, mode: ExtractionMode) -> Result<ArticleRecord> {
        let remote = RemoteExtractor::new(self.remote, self.fetch);

        match (source, mode) {
            (Source::PdfText { text, filename }, _) => remote.extract_pdf_text(text, filename).await,
            (Source::Html { html, url }, ExtractionMode::Remote) => {
                if self.remote.credential().is_none() {
                    return Err(PaperfoldError::Credential(
                        "AI extraction needs an API key. Please provide a key.".to_string(),
                    ));
                }
                remote.extract_html(html, url.unwrap_or_default()).await
            }
            (Source::Html { html, url }, ExtractionMode::Local) => {
                info!("parsing article locally");
                let local = match url {
                    Some(url) => self.readability.parse_with_url(html, url),
                    None => self.readability.parse(html),
                };

                match local {
                    Ok(article) if is_sufficient(&article) => return Ok(article),
                    Ok(article) => warn!(body_chars = article.body_len(), "local parsing came up short"),
                    Err(err) => warn!(error = %err, "local parsing failed"),
                }

                if self.remote.credential().is_none() {
                    return Err(PaperfoldError::Credential(
                        "Local parsing failed, and no API key is available for AI fallback. Please provide a key."
                            .to_string(),
                    ));
                }
                info!("falling back to AI extraction");
                remote.extract_html(html, url.unwrap_or_default()).await
            }
        }
    }
}
