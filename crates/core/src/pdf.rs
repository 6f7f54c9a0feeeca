//! Serializes a laid-out [`PageSet`] into PDF bytes with `lopdf`.
//!
//! Layout coordinates are top-left based; PDF user space is bottom-left
//! based, so every `y` is flipped against the page height here.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::debug;

use crate::fonts::{Font, encode_win_ansi};
use crate::layout::{Color, DrawOp, PageSet};
use crate::{PaperfoldError, Result};

/// Bézier control point distance for quarter circles.
const KAPPA: f32 = 0.552_284_8;

pub const PRODUCER: &str = concat!("paperfold ", env!("CARGO_PKG_VERSION"));

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: Option<String>,
}

/// Writes `pages` as a complete PDF file.
pub fn write_pdf(pages: &PageSet, info: &DocumentInfo) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(PaperfoldError::Pdf("document has no pages".to_string()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_name(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }

    let mut xobjects = Dictionary::new();
    for (index, image) in pages.images.iter().enumerate() {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width),
                "Height" => i64::from(image.height),
                "ColorSpace" => image.color_space.pdf_name(),
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        );
        xobjects.set(image_name(index), doc.add_object(stream));
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
        "ProcSet" => vec!["PDF".into(), "Text".into(), "ImageC".into(), "ImageB".into()],
    });

    let mut kids = Vec::with_capacity(pages.len());
    let mut destinations = BTreeMap::new();
    for page in &pages.pages {
        let height = page.height;
        let mut operations = Vec::new();
        let mut annotations = Vec::new();

        for op in &page.ops {
            match op {
                DrawOp::UriLink { x, y, width, height: h, uri } => {
                    annotations.push(doc.add_object(link_annotation(
                        [*x, height - y - h, x + width, height - y],
                        "A",
                        Object::Dictionary(dictionary! { "S" => "URI", "URI" => Object::string_literal(uri.as_str()) }),
                    )));
                }
                DrawOp::GoToLink { x, y, width, height: h, destination } => {
                    annotations.push(doc.add_object(link_annotation(
                        [*x, height - y - h, x + width, height - y],
                        "Dest",
                        Object::Name(destination.as_bytes().to_vec()),
                    )));
                }
                other => draw(&mut operations, other, height),
            }
        }

        let content = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
            "Annots" => annotations.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        });

        if let Some(name) = page.destination {
            destinations.insert(name, (page_id, page.height));
        }
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(pages_id, Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }));

    let mut dests = Dictionary::new();
    for (name, (page_id, page_height)) in destinations {
        dests.set(name, vec![Object::Reference(page_id), "XYZ".into(), 0.into(), page_height.into(), Object::Null]);
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Dests" => dests,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info_dict = dictionary! {
        "Title" => text_string(&info.title),
        "Producer" => Object::string_literal(PRODUCER),
    };
    if let Some(author) = &info.author {
        info_dict.set("Author", text_string(author));
    }
    let info_id: ObjectId = doc.add_object(info_dict);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| PaperfoldError::Pdf(e.to_string()))?;
    debug!(pages = pages.len(), images = pages.images.len(), bytes = bytes.len(), "wrote PDF");
    Ok(bytes)
}

fn image_name(index: usize) -> String {
    format!("Im{index}")
}

fn link_annotation(rect: [f32; 4], key: &str, target: Object) -> Dictionary {
    let mut annotation = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => rect.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
        "Border" => vec![0.into(), 0.into(), 0.into()],
    };
    annotation.set(key, target);
    annotation
}

/// PDF text string: literal for ASCII, UTF-16BE with a byte order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn reals<const N: usize>(values: [f32; N]) -> Vec<Object> {
    values.into_iter().map(Object::Real).collect()
}

fn fill_color(ops: &mut Vec<Operation>, color: &Color) {
    ops.push(op("rg", reals([color.r, color.g, color.b])));
}

fn stroke_color(ops: &mut Vec<Operation>, color: &Color) {
    ops.push(op("RG", reals([color.r, color.g, color.b])));
}

/// Appends the content stream operators for one drawing op.
fn draw(ops: &mut Vec<Operation>, draw_op: &DrawOp, page_height: f32) {
    let flip = |y: f32| page_height - y;

    match draw_op {
        DrawOp::Text { x, y, font, size, color, text } => {
            ops.push(op("BT", vec![]));
            fill_color(ops, color);
            ops.push(op("Tf", vec![font.resource_name().into(), Object::Real(*size)]));
            ops.push(op("Td", reals([*x, flip(*y)])));
            ops.push(op("Tj", vec![Object::String(encode_win_ansi(text), StringFormat::Literal)]));
            ops.push(op("ET", vec![]));
        }
        DrawOp::Line { x1, y1, x2, y2, width, color } => {
            ops.push(op("q", vec![]));
            stroke_color(ops, color);
            ops.push(op("w", reals([*width])));
            ops.push(op("m", reals([*x1, flip(*y1)])));
            ops.push(op("l", reals([*x2, flip(*y2)])));
            ops.push(op("S", vec![]));
            ops.push(op("Q", vec![]));
        }
        DrawOp::Rect { x, y, width, height, line_width, color } => {
            ops.push(op("q", vec![]));
            stroke_color(ops, color);
            ops.push(op("w", reals([*line_width])));
            ops.push(op("re", reals([*x, flip(y + height), *width, *height])));
            ops.push(op("S", vec![]));
            ops.push(op("Q", vec![]));
        }
        DrawOp::RoundedRect { x, y, width, height, radius, line_width, color } => {
            ops.push(op("q", vec![]));
            stroke_color(ops, color);
            ops.push(op("w", reals([*line_width])));
            rounded_rect_path(ops, *x, flip(y + height), *width, *height, *radius);
            ops.push(op("S", vec![]));
            ops.push(op("Q", vec![]));
        }
        DrawOp::Circle { cx, cy, radius, color } => {
            ops.push(op("q", vec![]));
            fill_color(ops, color);
            circle_path(ops, *cx, flip(*cy), *radius);
            ops.push(op("f", vec![]));
            ops.push(op("Q", vec![]));
        }
        DrawOp::Image { image, x, y, width, height } => {
            ops.push(op("q", vec![]));
            ops.push(op("cm", reals([*width, 0.0, 0.0, *height, *x, flip(y + height)])));
            ops.push(op("Do", vec![Object::Name(image_name(*image).into_bytes())]));
            ops.push(op("Q", vec![]));
        }
        DrawOp::UriLink { .. } | DrawOp::GoToLink { .. } => {}
    }
}

/// Rounded rectangle path; `(x, y)` is the bottom-left corner in PDF space.
fn rounded_rect_path(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32, r: f32) {
    let r = r.min(w / 2.0).min(h / 2.0);
    let c = r * (1.0 - KAPPA);

    ops.push(op("m", reals([x + r, y])));
    ops.push(op("l", reals([x + w - r, y])));
    ops.push(op("c", reals([x + w - c, y, x + w, y + c, x + w, y + r])));
    ops.push(op("l", reals([x + w, y + h - r])));
    ops.push(op("c", reals([x + w, y + h - c, x + w - c, y + h, x + w - r, y + h])));
    ops.push(op("l", reals([x + r, y + h])));
    ops.push(op("c", reals([x + c, y + h, x, y + h - c, x, y + h - r])));
    ops.push(op("l", reals([x, y + r])));
    ops.push(op("c", reals([x, y + c, x + c, y, x + r, y])));
    ops.push(op("h", vec![]));
}

fn circle_path(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    let k = r * KAPPA;

    ops.push(op("m", reals([cx + r, cy])));
    ops.push(op("c", reals([cx + r, cy + k, cx + k, cy + r, cx, cy + r])));
    ops.push(op("c", reals([cx - k, cy + r, cx - r, cy + k, cx - r, cy])));
    ops.push(op("c", reals([cx - r, cy - k, cx - k, cy - r, cx, cy - r])));
    ops.push(op("c", reals([cx + k, cy - r, cx + r, cy - k, cx + r, cy])));
    ops.push(op("h", vec![]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Frame;
    use crate::device::PAPER_PRO;

    fn single_page(ops: Vec<DrawOp>, destination: Option<&'static str>) -> PageSet {
        let mut pages = PageSet::new();
        let index = pages.new_page(&Frame::from(&PAPER_PRO), destination);
        pages.pages[index].ops = ops;
        pages
    }

    fn info() -> DocumentInfo {
        DocumentInfo { title: "Test".to_string(), author: None }
    }

    #[test]
    fn test_writes_loadable_pdf_with_text() {
        let pages = single_page(
            vec![DrawOp::Text {
                x: 60.0,
                y: 150.0,
                font: Font::TimesRoman,
                size: 28.0,
                color: Color::BLACK,
                text: "Hello (paper) world".to_string(),
            }],
            None,
        );
        let bytes = write_pdf(&pages, &info()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(doc.extract_text(&[1]).unwrap().contains("Hello (paper) world"));
    }

    #[test]
    fn test_named_destinations_and_links() {
        let mut pages = single_page(
            vec![
                DrawOp::GoToLink { x: 10.0, y: 10.0, width: 50.0, height: 50.0, destination: "proStart" },
                DrawOp::UriLink { x: 10.0, y: 100.0, width: 50.0, height: 20.0, uri: "https://example.com".to_string() },
            ],
            None,
        );
        pages.new_page(&Frame::from(&PAPER_PRO), Some("proStart"));

        let doc = Document::load_mem(&write_pdf(&pages, &info()).unwrap()).unwrap();
        let catalog = doc.catalog().unwrap();
        let dests = catalog.get(b"Dests").and_then(|d| d.as_dict()).unwrap();
        assert!(dests.has(b"proStart"));

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let page = doc.get_dictionary(page_ids[0]).unwrap();
        let annots = page.get(b"Annots").and_then(|a| a.as_array()).unwrap();
        assert_eq!(annots.len(), 2);
    }

    #[test]
    fn test_non_ascii_title_is_utf16() {
        let Object::String(bytes, _) = text_string("Café") else { panic!("expected string") };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert!(matches!(text_string("Plain"), Object::String(b, StringFormat::Literal) if b == b"Plain"));
    }

    #[test]
    fn test_empty_page_set_rejected() {
        assert!(matches!(write_pdf(&PageSet::new(), &info()), Err(PaperfoldError::Pdf(_))));
    }
}
