//! Raw text out of an input PDF.
//!
//! The text has no structure worth keeping; it is only the input for the
//! remote formatter, which rebuilds paragraphs from it.

use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;
use tracing::{debug, warn};

use crate::{PaperfoldError, Result};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extracts the text of every page.
///
/// Within a page, text items are joined with single spaces; each page is
/// followed by a blank line. Pages whose text cannot be decoded are skipped.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    let document = Document::load_mem(bytes).map_err(|e| PaperfoldError::PdfText(e.to_string()))?;
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(PaperfoldError::PdfText("document has no pages".to_string()));
    }

    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                text.push_str(WHITESPACE.replace_all(page_text.trim(), " ").as_ref());
                text.push_str("\n\n");
            }
            Err(err) => warn!(page = page_number, error = %err, "skipping page without readable text"),
        }
    }

    debug!(pages = pages.len(), chars = text.len(), "read PDF text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for line in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extracts_each_page() {
        let text = extract_pdf_text(&sample_pdf(&["First page", "Second page"])).unwrap();
        let pages: Vec<&str> = text.split("\n\n").filter(|p| !p.is_empty()).collect();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("First page"));
        assert!(pages[1].contains("Second page"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = extract_pdf_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PaperfoldError::PdfText(_)));
    }
}
