//! HTML parsing and DOM navigation.
//!
//! [`Document`] wraps a parsed page for CSS-selector queries and metadata
//! lookups; [`Element`] wraps a single node and adds the parent/sibling
//! navigation the content scorer needs.
//!
//! # Example
//!
//! ```rust
//! use paperfold_core::parse::Document;
//!
//! let doc = Document::parse("<html><head><title>Test</title></head><body><p>Hi</p></body></html>").unwrap();
//! assert_eq!(doc.title(), Some("Test".to_string()));
//! assert_eq!(doc.select("p").unwrap().len(), 1);
//! ```

use std::hash::Hash;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::preprocess::{self, PreprocessConfig};
use crate::{PaperfoldError, Result};

/// A parsed HTML document.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url: None })
    }

    /// Parses HTML after cleaning it for content extraction.
    ///
    /// Scripts, styles, hidden and unlikely nodes are removed and, when a
    /// base URL is given, relative links and image sources are resolved
    /// against it.
    pub fn parse_with_preprocessing(html: &str, base_url: Option<Url>) -> Result<Self> {
        let config = PreprocessConfig { base_url: base_url.clone(), ..Default::default() };

        let cleaned = preprocess::preprocess_html(html, &config);
        let html = Html::parse_document(&cleaned);

        Ok(Self { html, base_url })
    }

    /// Parses HTML and remembers the page URL without cleaning the markup.
    ///
    /// Used for metadata lookups, which need the untouched `<head>`.
    pub fn parse_with_url(html: &str, base_url: Option<Url>) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, base_url })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Gets the entire HTML as a string.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PaperfoldError::Extraction`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the content of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// Inner HTML of `<body>`, or the whole document when there is none.
    pub fn body_inner_html(&self) -> String {
        match self.select("body") {
            Ok(bodies) if !bodies.is_empty() => bodies[0].inner_html(),
            _ => self.as_string(),
        }
    }

    /// Resolves `href` against the document URL when one is known.
    pub fn resolve_url(&self, href: &str) -> String {
        match &self.base_url {
            Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PaperfoldError::Extraction(format!("Invalid selector: {}", e)))
}

/// A wrapper around scraper's `ElementRef`.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// The parent element, if the parent is an element node.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Direct element children in document order.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .collect()
    }

    /// Identity of the underlying node, stable for the document's lifetime.
    pub fn key(&self) -> impl Hash + Eq + Copy + use<'a> {
        self.element.id()
    }

    /// Whether both wrappers point at the same node.
    pub fn same_node(&self, other: &Element<'_>) -> bool {
        self.element.id() == other.element.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>Test Page</title>
        </head>
        <body>
            <h1>Heading</h1>
            <div id="wrap"><p class="content">Paragraph 1</p><p class="content">Paragraph 2</p></div>
            <a href="/about">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PaperfoldError::Extraction(_))));
    }

    #[test]
    fn test_parent_navigation() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let paragraphs = doc.select("p").unwrap();
        let parent = paragraphs[0].parent().unwrap();

        assert_eq!(parent.attr("id"), Some("wrap"));
        assert!(parent.same_node(&paragraphs[1].parent().unwrap()));
        assert!(!paragraphs[0].same_node(&paragraphs[1]));
    }

    #[test]
    fn test_body_inner_html() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let body = doc.body_inner_html();
        assert!(body.contains("<h1>Heading</h1>"));
        assert!(!body.contains("<title>"));
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let doc = Document::parse_with_url(SAMPLE_HTML, Some(base)).unwrap();
        assert_eq!(doc.resolve_url("/img/a.png"), "https://example.com/img/a.png");
        assert_eq!(doc.resolve_url("https://cdn.example.org/b.png"), "https://cdn.example.org/b.png");
    }
}
