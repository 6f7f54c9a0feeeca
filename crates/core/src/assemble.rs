//! Builds the final multi-device document from an article record.
//!
//! The document opens with an index page whose device icons link to one
//! section per [`DeviceProfile`](crate::device::DeviceProfile), each laid out
//! at that device's page size and typography.

use tracing::{info, warn};

use crate::article::ArticleRecord;
use crate::device::DeviceProfiles;
use crate::flatten::flatten;
use crate::image::{EmbeddedImage, prepare_feature_image, transcode_if_webp};
use crate::layout::{PageSet, render_article, render_index_page, start_section};
use crate::pdf::{DocumentInfo, write_pdf};
use crate::Result;

/// Options for [`assemble`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    pub profiles: DeviceProfiles,
}

/// Lays out and serializes the document. Performs no I/O.
///
/// `image_bytes` are the raw bytes behind the record's feature image URL.
/// Image problems only drop the image; the document is still produced.
///
/// # Errors
///
/// Returns [`PaperfoldError::Pdf`](crate::PaperfoldError::Pdf) when the PDF
/// cannot be serialized.
pub fn assemble(article: &ArticleRecord, options: &AssembleOptions, image_bytes: Option<&[u8]>) -> Result<Vec<u8>> {
    let items = flatten(&article.article_body_html);
    let image_url = article.feature_image_url().unwrap_or_default();
    info!(title = article.display_title(), flow_items = items.len(), "assembling document");

    let mut pages = PageSet::new();

    let index_image = image_bytes.and_then(|bytes| {
        let normalized = transcode_if_webp(bytes, image_url).unwrap_or_else(|err| {
            warn!(error = %err, "could not transcode feature image");
            bytes.into()
        });
        embed(&mut pages, &normalized)
    });
    render_index_page(&mut pages, article, index_image, &options.profiles);

    for profile in options.profiles.in_order() {
        let image = image_bytes.and_then(|bytes| embed(&mut pages, &prepare_feature_image(bytes, image_url)));
        let cursor = start_section(&mut pages, profile);
        let end = render_article(&mut pages, cursor, profile, article, image, &items);
        info!(device = profile.name, last_page = end.page_index, "laid out device section");
    }

    let info = DocumentInfo {
        title: article.display_title().to_string(),
        author: article.author_line().map(str::to_string),
    };
    write_pdf(&pages, &info)
}

fn embed(pages: &mut PageSet, bytes: &[u8]) -> Option<usize> {
    match EmbeddedImage::from_bytes(bytes) {
        Ok(image) => Some(pages.add_image(image)),
        Err(err) => {
            warn!(error = %err, "leaving out feature image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use lopdf::Document;
    use std::io::Cursor;

    fn article() -> ArticleRecord {
        ArticleRecord {
            title: "Tide Tables".into(),
            author: Some("R. Ocean".into()),
            feature_image_url: Some("https://example.com/tide.png".into()),
            article_body_html: "<p>The tide comes in twice a day.</p><hr><ul><li>High</li><li>Low</li></ul>".into(),
            ..Default::default()
        }
    }

    fn png() -> Vec<u8> {
        let image = RgbImage::from_fn(40, 20, |x, _| Rgb([(x * 6) as u8, 120, 200]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image).write_to(&mut cursor, ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_index_then_two_sections() {
        let bytes = assemble(&article(), &AssembleOptions::default(), None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();

        assert_eq!(pages.len(), 3);
        assert!(doc.extract_text(&[1]).unwrap().contains("Tide Tables"));
        assert!(doc.extract_text(&[2]).unwrap().contains("twice a day"));
        assert!(doc.extract_text(&[3]).unwrap().contains("twice a day"));

        let dests = doc.catalog().unwrap().get(b"Dests").and_then(|d| d.as_dict()).unwrap();
        assert!(dests.has(b"proMoveStart"));
        assert!(dests.has(b"proStart"));
    }

    #[test]
    fn test_feature_image_embedded_per_page_group() {
        let image = png();
        let bytes = assemble(&article(), &AssembleOptions::default(), Some(image.as_slice())).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        let images = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Image".as_slice()))
            .count();
        assert_eq!(images, 3);
    }

    #[test]
    fn test_broken_image_does_not_abort() {
        let bytes = assemble(&article(), &AssembleOptions::default(), Some(b"garbage".as_slice())).unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 3);
    }

    #[test]
    fn test_empty_record_still_renders() {
        let bytes = assemble(&ArticleRecord::default(), &AssembleOptions::default(), None).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.extract_text(&[1]).unwrap().contains("Untitled"));
        assert!(doc.extract_text(&[2]).unwrap().contains("Could not parse article body."));
    }
}
