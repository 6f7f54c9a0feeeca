//! Error types for paperfold operations.
//!
//! [`PaperfoldError`] covers every failure a conversion can hit: acquiring
//! the source, normalizing it into an article record, preparing images,
//! laying out pages and writing the final PDF.
//!
//! Image and layout failures are contained by the components that raise
//! them (the document is still produced without the offending image or
//! node); the remaining variants abort the current conversion and carry a
//! message meant to be shown to the user verbatim.
//!
//! # Example
//!
//! ```rust
//! use paperfold_core::{PaperfoldError, Result};
//!
//! fn require_body(html: &str) -> Result<&str> {
//!     if html.trim().is_empty() {
//!         return Err(PaperfoldError::Extraction("no article body found".to_string()));
//!     }
//!     Ok(html)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum PaperfoldError {
    /// HTTP transport errors from reqwest.
    ///
    /// Wraps DNS failures, connection resets and other errors that happen
    /// before a response status is available.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Network or relay failure, or a non-success status after retries.
    ///
    /// The message is surfaced to the user as-is.
    #[error("{message}")]
    Fetch { status: Option<u16>, message: String },

    /// Request timeout.
    ///
    /// Returned when a request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The local heuristic found no usable article content.
    #[error("{0}")]
    Extraction(String),

    /// The remote extractor needs a credential that is missing or was rejected.
    #[error("{0}")]
    Credential(String),

    /// The remote extractor answered with something that is not the expected JSON.
    #[error("{0}")]
    RemoteFormat(String),

    /// Feature image could not be fetched, decoded or encoded.
    ///
    /// Never fatal to a conversion.
    #[error("Image processing failed: {0}")]
    Image(String),

    /// A content node could not be rendered.
    ///
    /// Never fatal to a conversion.
    #[error("Layout failed: {0}")]
    Layout(String),

    /// The PDF writer failed to serialize the document.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Text could not be read out of an input PDF.
    #[error("Could not read text from PDF: {0}")]
    PdfText(String),

    /// Another conversion is already running on this converter.
    #[error("A conversion is already in progress")]
    Busy,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File and stream I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors for persisted state.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for PaperfoldError {
    fn from(err: lopdf::Error) -> Self {
        PaperfoldError::Pdf(err.to_string())
    }
}

impl From<image::ImageError> for PaperfoldError {
    fn from(err: image::ImageError) -> Self {
        PaperfoldError::Image(err.to_string())
    }
}

impl PaperfoldError {
    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            PaperfoldError::Fetch { status, .. } => *status,
            PaperfoldError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for PaperfoldError.
pub type Result<T> = std::result::Result<T, PaperfoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PaperfoldError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_fetch_error_is_verbatim() {
        let err = PaperfoldError::Fetch { status: Some(404), message: "Failed to fetch URL (Status: 404)".into() };
        assert_eq!(err.to_string(), "Failed to fetch URL (Status: 404)");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_timeout_error() {
        let err = PaperfoldError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_credential_message_passthrough() {
        let err = PaperfoldError::Credential("Please provide a key.".into());
        assert_eq!(err.to_string(), "Please provide a key.");
        assert_eq!(err.status(), None);
    }
}
