//! End-to-end conversion: acquire, normalize, assemble.
//!
//! # Example
//!
//! ```rust,no_run
//! use paperfold_core::{Converter, ConverterConfig, ExtractionMode};
//!
//! # async fn run() -> paperfold_core::Result<()> {
//! let config = ConverterConfig::builder().mode(ExtractionMode::Local).timeout(20).build();
//! let conversion = Converter::new(config).convert_url("https://example.com/article").await?;
//! std::fs::write(&conversion.filename, &conversion.pdf)?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::article::ArticleRecord;
use crate::assemble::{AssembleOptions, assemble};
use crate::device::DeviceProfiles;
use crate::fetch::{FetchConfig, fetch_bytes, fetch_html};
use crate::normalize::{ExtractionMode, Normalizer, Source};
use crate::pdf_text::extract_pdf_text;
use crate::remote::RemoteConfig;
use crate::{PaperfoldError, Result};

/// Everything a [`Converter`] needs.
#[derive(Debug, Clone, Default)]
pub struct ConverterConfig {
    pub fetch: FetchConfig,
    pub remote: RemoteConfig,
    pub mode: ExtractionMode,
    pub profiles: DeviceProfiles,
}

impl ConverterConfig {
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }
}

/// Builder for ConverterConfig.
#[derive(Debug, Default)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.config.fetch = fetch;
        self
    }

    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.config.remote = remote;
        self
    }

    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn profiles(mut self, profiles: DeviceProfiles) -> Self {
        self.config.profiles = profiles;
        self
    }

    /// Key for the remote extractor; blank keys count as none.
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.config.remote.api_key = key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.remote.model = model.into();
        self
    }

    pub fn relay_url(mut self, relay_url: impl Into<String>) -> Self {
        self.config.fetch.relay_url = relay_url.into();
        self
    }

    /// Page and image fetch timeout in seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.config.fetch.timeout = seconds;
        self
    }

    pub fn build(self) -> ConverterConfig {
        self.config
    }
}

/// Output of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub article: ArticleRecord,
    pub pdf: Vec<u8>,
    /// Suggested file name, `<sanitized title>.pdf`.
    pub filename: String,
}

/// Runs conversions one at a time.
///
/// A call made while another is still running fails with
/// [`PaperfoldError::Busy`] instead of queueing.
#[derive(Debug, Default)]
pub struct Converter {
    config: ConverterConfig,
    busy: AtomicBool,
}

/// Releases the converter when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config, busy: AtomicBool::new(false) }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| PaperfoldError::Busy)
    }

    fn normalizer(&self) -> Normalizer<'_> {
        Normalizer::new(&self.config.remote, &self.config.fetch)
    }

    /// Fetches a page through the relay and converts it.
    pub async fn convert_url(&self, url: &str) -> Result<Conversion> {
        let _guard = self.begin()?;
        info!(url, "fetching article");
        let html = fetch_html(url, &self.config.fetch).await?;
        let article = self.normalizer().normalize(Source::Html { html: &html, url: Some(url) }, self.config.mode).await?;
        self.finish(article).await
    }

    /// Converts a page whose HTML is already at hand.
    pub async fn convert_html(&self, html: &str, url: Option<&str>) -> Result<Conversion> {
        let _guard = self.begin()?;
        let article = self.normalizer().normalize(Source::Html { html, url }, self.config.mode).await?;
        self.finish(article).await
    }

    /// Converts a PDF file. Its text is always reformatted remotely.
    pub async fn convert_pdf(&self, bytes: &[u8], filename: &str) -> Result<Conversion> {
        let _guard = self.begin()?;
        info!(filename, "reading PDF text");
        let text = extract_pdf_text(bytes)?;
        let article = self.normalizer().normalize(Source::PdfText { text: &text, filename }, self.config.mode).await?;
        self.finish(article).await
    }

    /// Fetches and normalizes a page without producing a document.
    pub async fn read_url(&self, url: &str) -> Result<ArticleRecord> {
        let _guard = self.begin()?;
        let html = fetch_html(url, &self.config.fetch).await?;
        self.normalizer().normalize(Source::Html { html: &html, url: Some(url) }, self.config.mode).await
    }

    /// Normalizes HTML already at hand without producing a document.
    pub async fn read_html(&self, html: &str, url: Option<&str>) -> Result<ArticleRecord> {
        let _guard = self.begin()?;
        self.normalizer().normalize(Source::Html { html, url }, self.config.mode).await
    }

    /// Fetches the feature image (if any) once and assembles the document.
    ///
    /// A failed image fetch is logged and the document is built without it.
    pub async fn assemble_with_fetch(&self, article: &ArticleRecord) -> Result<Vec<u8>> {
        let image = match article.feature_image_url() {
            Some(url) => {
                info!(url, "fetching feature image");
                match fetch_bytes(url, &self.config.fetch).await {
                    Ok(bytes) => Some(bytes),
                    Err(err) => {
                        warn!(error = %err, "continuing without feature image");
                        None
                    }
                }
            }
            None => None,
        };

        info!("generating PDF");
        assemble(article, &AssembleOptions { profiles: self.config.profiles }, image.as_deref())
    }

    async fn finish(&self, article: ArticleRecord) -> Result<Conversion> {
        let pdf = self.assemble_with_fetch(&article).await?;
        let filename = format!("{}.pdf", article.file_stem());
        Ok(Conversion { article, pdf, filename })
    }
}
