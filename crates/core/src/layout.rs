//! Pagination and layout.
//!
//! Layout works in a top-left coordinate space with `y` growing downwards,
//! measured in points. Pages are collected in a [`PageSet`] as lists of
//! [`DrawOp`]s; converting them to PDF content streams happens in
//! [`crate::pdf`].
//!
//! The vertical position is carried in a [`RenderCursor`] that every public
//! entry point takes and returns, so page breaks are visible to the caller.

use tracing::warn;

use crate::article::ArticleRecord;
use crate::device::{DeviceProfile, DeviceProfiles, ImageAlign, Margins};
use crate::flatten::{FlowItem, StyledRun};
use crate::fonts::{Font, break_word, height_of_string};
use crate::image::EmbeddedImage;
use crate::{PaperfoldError, Result};

/// Drawn instead of the body when nothing could be flattened.
pub const EMPTY_BODY_MESSAGE: &str = "Could not parse article body.";

const MAX_IMAGE_HEIGHT: f32 = 300.0;
/// Lines moved down after each paragraph, list and quote.
const BLOCK_SPACING: f32 = 0.75;
const INDENT: f32 = 20.0;
const BULLET_RADIUS: f32 = 2.5;

const TITLE_SIZE: f32 = 32.0;
const AUTHOR_SIZE: f32 = 20.0;
const BYLINE_SIZE: f32 = 16.0;

const INDEX_TITLE_SIZE: f32 = 42.0;
const INDEX_AUTHOR_SIZE: f32 = 28.0;
const INDEX_BYLINE_SIZE: f32 = 22.0;
/// Vertical space kept for the feature image on the index page.
const INDEX_IMAGE_RESERVE: f32 = 340.0;
const INDEX_RAISE: f32 = 150.0;

const ICON_WIDTH: f32 = 120.0;
const ICON_HEIGHT: f32 = 160.0;
const ICON_SPACING: f32 = 80.0;

/// An RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::gray(0.0);
    pub const LINK: Color = Color { r: 0.0, g: 0.0, b: 1.0 };
    /// `#333`
    pub const DARK_GRAY: Color = Color::gray(0.2);
    /// `#999`
    pub const MID_GRAY: Color = Color::gray(0.6);

    pub const fn gray(level: f32) -> Color {
        Color { r: level, g: level, b: level }
    }
}

/// A single drawing instruction. Coordinates are top-left based.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text drawn with its baseline at `y`.
    Text { x: f32, y: f32, font: Font, size: f32, color: Color, text: String },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Color },
    /// Stroked rectangle.
    Rect { x: f32, y: f32, width: f32, height: f32, line_width: f32, color: Color },
    /// Stroked rectangle with rounded corners.
    RoundedRect { x: f32, y: f32, width: f32, height: f32, radius: f32, line_width: f32, color: Color },
    /// Filled circle.
    Circle { cx: f32, cy: f32, radius: f32, color: Color },
    /// Image from [`PageSet::images`] scaled into the box.
    Image { image: usize, x: f32, y: f32, width: f32, height: f32 },
    /// Clickable area opening an external URI.
    UriLink { x: f32, y: f32, width: f32, height: f32, uri: String },
    /// Clickable area jumping to a named destination.
    GoToLink { x: f32, y: f32, width: f32, height: f32, destination: &'static str },
}

/// Page size and margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl Frame {
    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Lowest `y` a line may reach.
    pub fn bottom(&self) -> f32 {
        self.height - self.margins.bottom
    }
}

impl From<&DeviceProfile> for Frame {
    fn from(profile: &DeviceProfile) -> Self {
        Frame { width: profile.page_width, height: profile.page_height, margins: profile.margins }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
    /// Named destination pointing at the top of this page.
    pub destination: Option<&'static str>,
}

/// Pages of a document plus the images they reference.
#[derive(Debug, Clone, Default)]
pub struct PageSet {
    pub pages: Vec<Page>,
    pub images: Vec<EmbeddedImage>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty page and returns its index.
    pub fn new_page(&mut self, frame: &Frame, destination: Option<&'static str>) -> usize {
        self.pages.push(Page { width: frame.width, height: frame.height, ops: Vec::new(), destination });
        self.pages.len() - 1
    }

    /// Registers an image and returns its index for [`DrawOp::Image`].
    pub fn add_image(&mut self, image: EmbeddedImage) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Current drawing position and text state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCursor {
    /// Top of the next line.
    pub y: f32,
    pub page_index: usize,
    pub font: Font,
    pub font_size: f32,
    pub color: Color,
}

impl RenderCursor {
    /// Cursor at the top margin of `page_index`.
    pub fn at_top(frame: &Frame, page_index: usize) -> Self {
        Self { y: frame.margins.top, page_index, font: Font::TimesRoman, font_size: 12.0, color: Color::BLACK }
    }

    /// Height `move_down(1.0)` advances by.
    pub fn line_height(&self) -> f32 {
        self.font.line_height(self.font_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
struct Style {
    font: Font,
    size: f32,
    color: Color,
    link: Option<String>,
}

impl Style {
    fn plain(font: Font, size: f32, color: Color) -> Self {
        Self { font, size, color, link: None }
    }
}

#[derive(Debug, Clone)]
struct Word {
    text: String,
    style: Style,
    space_before: bool,
}

/// Splits text into words, tracking whether whitespace preceded each one.
///
/// `pending_space` carries trailing whitespace over to the next run so that
/// runs sharing a line are joined exactly as written.
fn push_words(words: &mut Vec<Word>, text: &str, style: &Style, pending_space: &mut bool) {
    for (i, piece) in text.split(char::is_whitespace).enumerate() {
        if i > 0 {
            *pending_space = true;
        }
        if piece.is_empty() {
            continue;
        }
        words.push(Word { text: piece.to_string(), style: style.clone(), space_before: *pending_space });
        *pending_space = false;
    }
}

fn run_words(runs: &[StyledRun], size: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut pending_space = false;
    for run in runs {
        let color = if run.link.is_some() { Color::LINK } else { Color::BLACK };
        let style = Style { font: Font::body(run.bold, run.italic), size, color, link: run.link.clone() };
        push_words(&mut words, &run.text, &style, &mut pending_space);
    }
    words
}

fn plain_words(text: &str, style: Style) -> Vec<Word> {
    let mut words = Vec::new();
    push_words(&mut words, text, &style, &mut false);
    words
}

/// A word placed on the current line, `x` relative to the line start.
struct Placed {
    word: Word,
    x: f32,
    width: f32,
}

#[derive(Debug, Clone, Copy)]
struct LineFormat {
    indent: f32,
    align: Align,
    line_gap: f32,
}

impl LineFormat {
    fn left(line_gap: f32) -> Self {
        Self { indent: 0.0, align: Align::Left, line_gap }
    }

    fn centered() -> Self {
        Self { indent: 0.0, align: Align::Center, line_gap: 0.0 }
    }
}

struct Writer<'a> {
    pages: &'a mut PageSet,
    frame: Frame,
    cursor: RenderCursor,
}

impl<'a> Writer<'a> {
    fn new(pages: &'a mut PageSet, frame: Frame, cursor: RenderCursor) -> Self {
        Self { pages, frame, cursor }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.pages.get_mut(self.cursor.page_index) {
            page.ops.push(op);
        }
    }

    fn new_page(&mut self) {
        let page_index = self.pages.new_page(&self.frame, None);
        self.cursor = RenderCursor { y: self.frame.margins.top, page_index, ..self.cursor };
    }

    /// Breaks the page unless `height` still fits or the cursor is already at the top.
    fn ensure_room(&mut self, height: f32) {
        if self.cursor.y + height > self.frame.bottom() && self.cursor.y > self.frame.margins.top {
            self.new_page();
        }
    }

    fn move_down(&mut self, lines: f32) {
        self.cursor.y += lines * self.cursor.line_height();
    }

    fn set_font(&mut self, font: Font, size: f32) {
        self.cursor.font = font;
        self.cursor.font_size = size;
    }

    fn text(&mut self, text: &str, style: Style, format: LineFormat) {
        self.set_font(style.font, style.size);
        self.cursor.color = style.color;
        let words = plain_words(text, style);
        self.words(&words, format);
    }

    /// Greedy line filling across styled words.
    fn words(&mut self, words: &[Word], format: LineFormat) {
        let available = (self.frame.content_width() - format.indent).max(1.0);
        let mut line: Vec<Placed> = Vec::new();
        let mut x = 0.0;

        for word in fit_words(words, available) {
            let width = word.style.font.measure(&word.text, word.style.size);
            let mut space = if word.space_before && !line.is_empty() {
                word.style.font.measure(" ", word.style.size)
            } else {
                0.0
            };

            if !line.is_empty() && x + space + width > available {
                self.flush_line(&line, x, available, format);
                line.clear();
                x = 0.0;
                space = 0.0;
            }

            line.push(Placed { word, x: x + space, width });
            x += space + width;
        }

        if !line.is_empty() {
            self.flush_line(&line, x, available, format);
        }
    }

    fn flush_line(&mut self, line: &[Placed], line_width: f32, available: f32, format: LineFormat) {
        let line_height = line.iter().map(|p| p.word.style.font.line_height(p.word.style.size)).fold(0.0, f32::max);
        let ascent = line.iter().map(|p| p.word.style.font.ascent(p.word.style.size)).fold(0.0, f32::max);
        self.ensure_room(line_height);

        let top = self.cursor.y;
        let baseline = top + ascent;
        let start = self.frame.margins.left
            + format.indent
            + match format.align {
                Align::Left => 0.0,
                Align::Center => ((available - line_width) / 2.0).max(0.0),
            };

        for segment in segments(line) {
            let x = start + segment.x;
            let width = segment.end - segment.x;
            let style = &segment.style;

            if let Some(uri) = &style.link {
                let thickness = if style.size < 10.0 { 0.5 } else { (style.size / 10.0).floor() };
                let underline = baseline + style.size * 0.1;
                self.push(DrawOp::Line { x1: x, y1: underline, x2: x + width, y2: underline, width: thickness, color: style.color });
                self.push(DrawOp::UriLink { x, y: top, width, height: line_height, uri: uri.clone() });
            }
            self.push(DrawOp::Text { x, y: baseline, font: style.font, size: style.size, color: style.color, text: segment.text });
        }

        if let Some(last) = line.last() {
            self.set_font(last.word.style.font, last.word.style.size);
            self.cursor.color = last.word.style.color;
        }
        self.cursor.y += line_height + format.line_gap;
    }

    fn rule(&mut self) {
        self.move_down(1.0);
        let y = self.cursor.y;
        let left = self.frame.margins.left;
        let right = self.frame.width - self.frame.margins.right;
        self.push(DrawOp::Line { x1: left, y1: y, x2: right, y2: y, width: 0.5, color: Color::BLACK });
        self.move_down(1.0);
    }

    fn list(&mut self, ordered: bool, items: &[String], size: f32, line_gap: f32) {
        let font = Font::TimesRoman;
        let left = self.frame.margins.left;

        for (i, item) in items.iter().enumerate() {
            self.set_font(font, size);
            self.cursor.color = Color::BLACK;
            self.ensure_room(font.line_height(size));
            let baseline = self.cursor.y + font.ascent(size);

            let indent = if ordered {
                let label = format!("{}.", i + 1);
                let indent = INDENT.max(font.measure(&label, size) + 5.0);
                self.push(DrawOp::Text { x: left, y: baseline, font, size, color: Color::BLACK, text: label });
                indent
            } else {
                let cy = baseline - size * 0.25;
                self.push(DrawOp::Circle { cx: left + INDENT, cy, radius: BULLET_RADIUS, color: Color::BLACK });
                INDENT * 2.0
            };

            let words = plain_words(item, Style::plain(font, size, Color::BLACK));
            self.words(&words, LineFormat { indent, align: Align::Left, line_gap });
        }
    }

    fn image(&mut self, index: usize, align: ImageAlign) -> Result<()> {
        let image = self
            .pages
            .images
            .get(index)
            .ok_or_else(|| PaperfoldError::Layout(format!("unknown image {index}")))?;
        if image.width == 0 || image.height == 0 {
            return Err(PaperfoldError::Layout("image has no area".to_string()));
        }

        let content_width = self.frame.content_width();
        let scale = (content_width / image.width as f32).min(MAX_IMAGE_HEIGHT / image.height as f32);
        let (width, height) = (image.width as f32 * scale, image.height as f32 * scale);
        self.ensure_room(height);

        let x = self.frame.margins.left
            + match align {
                ImageAlign::Left => 0.0,
                ImageAlign::Center => (content_width - width) / 2.0,
            };
        self.push(DrawOp::Image { image: index, x, y: self.cursor.y, width, height });
        self.cursor.y += height;
        Ok(())
    }

    fn feature_image(&mut self, image: Option<usize>, align: ImageAlign) {
        let Some(index) = image else { return };
        match self.image(index, align) {
            Ok(()) => self.move_down(2.0),
            Err(err) => warn!(error = %err, "skipping feature image"),
        }
    }

    fn body(&mut self, items: &[FlowItem], profile: &DeviceProfile) {
        let size = profile.base_font_size;
        let line_gap = profile.line_gap();

        if items.is_empty() {
            self.text(EMPTY_BODY_MESSAGE, Style::plain(Font::TimesRoman, size, Color::BLACK), LineFormat::left(line_gap));
            return;
        }

        let mut block: Vec<StyledRun> = Vec::new();
        for item in items {
            if !matches!(item, FlowItem::Text(_)) && !block.is_empty() {
                self.paragraph(&std::mem::take(&mut block), size, line_gap);
            }

            match item {
                FlowItem::Text(run) => {
                    block.push(run.clone());
                    if run.is_block_terminal {
                        self.paragraph(&std::mem::take(&mut block), size, line_gap);
                    }
                }
                FlowItem::Rule => self.rule(),
                FlowItem::List { ordered, items } => {
                    self.list(*ordered, items, size, line_gap);
                    self.move_down(BLOCK_SPACING);
                }
                FlowItem::Quote(text) => {
                    self.set_font(Font::TimesItalic, size);
                    let words = plain_words(&format!("\"{text}\""), Style::plain(Font::TimesItalic, size, Color::BLACK));
                    self.words(&words, LineFormat { indent: INDENT, align: Align::Left, line_gap });
                    self.move_down(BLOCK_SPACING);
                }
            }
        }

        if !block.is_empty() {
            self.paragraph(&block, size, line_gap);
        }
    }

    fn paragraph(&mut self, runs: &[StyledRun], size: f32, line_gap: f32) {
        let words = run_words(runs, size);
        if words.is_empty() {
            return;
        }
        self.words(&words, LineFormat::left(line_gap));
        self.move_down(BLOCK_SPACING);
    }

    fn device_icon(&mut self, x: f32, y: f32, profile: &DeviceProfile) {
        self.push(DrawOp::RoundedRect {
            x,
            y,
            width: ICON_WIDTH,
            height: ICON_HEIGHT,
            radius: 8.0,
            line_width: 2.0,
            color: Color::DARK_GRAY,
        });
        self.push(DrawOp::Rect {
            x: x + 6.0,
            y: y + 12.0,
            width: ICON_WIDTH - 12.0,
            height: ICON_HEIGHT - 24.0,
            line_width: 1.0,
            color: Color::MID_GRAY,
        });
        self.push(DrawOp::Circle { cx: x + ICON_WIDTH / 2.0, cy: y + ICON_HEIGHT - 6.0, radius: 2.0, color: Color::DARK_GRAY });

        let font = Font::HelveticaBold;
        let size = 12.0;
        let label_width = font.measure(profile.label, size);
        self.push(DrawOp::Text {
            x: x + (ICON_WIDTH - label_width) / 2.0,
            y: y + ICON_HEIGHT / 2.0 - 6.0 + font.ascent(size),
            font,
            size,
            color: Color::DARK_GRAY,
            text: profile.label.to_string(),
        });
        self.push(DrawOp::GoToLink {
            x,
            y,
            width: ICON_WIDTH,
            height: ICON_HEIGHT,
            destination: profile.destination,
        });
    }
}

/// Runs of consecutive same-style words merged for drawing.
struct Segment {
    text: String,
    style: Style,
    x: f32,
    end: f32,
}

fn segments(line: &[Placed]) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    for placed in line {
        match out.last_mut() {
            Some(segment) if segment.style == placed.word.style => {
                if placed.x > segment.end {
                    segment.text.push(' ');
                }
                segment.text.push_str(&placed.word.text);
                segment.end = placed.x + placed.width;
            }
            _ => out.push(Segment {
                text: placed.word.text.clone(),
                style: placed.word.style.clone(),
                x: placed.x,
                end: placed.x + placed.width,
            }),
        }
    }
    out
}

/// Breaks words wider than the line into pieces that fit.
fn fit_words(words: &[Word], available: f32) -> Vec<Word> {
    let mut out = Vec::with_capacity(words.len());
    for word in words {
        if word.style.font.measure(&word.text, word.style.size) <= available {
            out.push(word.clone());
            continue;
        }
        for (i, piece) in break_word(&word.text, word.style.font, word.style.size, available).into_iter().enumerate() {
            out.push(Word { text: piece, style: word.style.clone(), space_before: i == 0 && word.space_before });
        }
    }
    out
}

/// Starts a device section on a new page carrying the profile's destination.
pub fn start_section(pages: &mut PageSet, profile: &DeviceProfile) -> RenderCursor {
    let frame = Frame::from(profile);
    let page_index = pages.new_page(&frame, Some(profile.destination));
    RenderCursor { font_size: profile.base_font_size, ..RenderCursor::at_top(&frame, page_index) }
}

/// Lays out one device section from `cursor` onwards.
///
/// Title, author and byline come first, then the feature image (when
/// `image` refers to an entry of `pages.images`) and the flattened body.
/// Returns the cursor after the last line.
pub fn render_article(
    pages: &mut PageSet,
    cursor: RenderCursor,
    profile: &DeviceProfile,
    article: &ArticleRecord,
    image: Option<usize>,
    items: &[FlowItem],
) -> RenderCursor {
    let mut writer = Writer::new(pages, Frame::from(profile), cursor);

    writer.text(article.display_title(), Style::plain(Font::HelveticaBold, TITLE_SIZE, Color::BLACK), LineFormat::left(0.0));
    writer.move_down(1.0);
    if let Some(author) = article.author_line() {
        writer.text(author, Style::plain(Font::HelveticaBold, AUTHOR_SIZE, Color::BLACK), LineFormat::left(0.0));
    }
    if let Some(byline) = article.byline() {
        writer.text(&byline, Style::plain(Font::TimesRoman, BYLINE_SIZE, Color::BLACK), LineFormat::left(0.0));
    }
    writer.move_down(2.0);

    writer.feature_image(image, profile.image_align);
    writer.body(items, profile);
    writer.cursor
}

/// Lays out the index page on the large profile's geometry.
///
/// The title block is vertically centered (raised a little), followed by
/// the feature image and one icon per device that links to its section.
pub fn render_index_page(
    pages: &mut PageSet,
    article: &ArticleRecord,
    image: Option<usize>,
    profiles: &DeviceProfiles,
) -> RenderCursor {
    let frame = Frame::from(&profiles.large);
    let page_index = pages.new_page(&frame, None);
    let content_width = frame.content_width();

    let title = article.display_title();
    let author = article.author_line();
    let byline = article.byline();

    let mut block_height = height_of_string(title, Font::HelveticaBold, INDEX_TITLE_SIZE, content_width) + 20.0;
    if article.feature_image_url().is_some() {
        block_height += INDEX_IMAGE_RESERVE;
    }
    if let Some(author) = author {
        block_height += height_of_string(author, Font::HelveticaBold, INDEX_AUTHOR_SIZE, content_width);
    }
    if let Some(byline) = &byline {
        block_height += height_of_string(byline, Font::TimesRoman, INDEX_BYLINE_SIZE, content_width);
    }
    let usable = frame.height - frame.margins.top - frame.margins.bottom;
    let start_y = frame.margins.top + usable / 2.0 - block_height / 2.0 - INDEX_RAISE;

    let cursor = RenderCursor { y: start_y, ..RenderCursor::at_top(&frame, page_index) };
    let mut writer = Writer::new(pages, frame, cursor);

    writer.text(title, Style::plain(Font::HelveticaBold, INDEX_TITLE_SIZE, Color::BLACK), LineFormat::centered());
    writer.move_down(1.0);
    if let Some(author) = author {
        writer.text(author, Style::plain(Font::HelveticaBold, INDEX_AUTHOR_SIZE, Color::BLACK), LineFormat::centered());
    }
    if let Some(byline) = &byline {
        writer.text(byline, Style::plain(Font::TimesRoman, INDEX_BYLINE_SIZE, Color::BLACK), LineFormat::centered());
    }
    writer.move_down(2.0);

    writer.feature_image(image, ImageAlign::Center);

    let start_x = frame.width / 2.0 - (ICON_WIDTH * 2.0 + ICON_SPACING) / 2.0;
    let icon_y = writer.cursor.y + 40.0;
    for (i, profile) in profiles.in_order().into_iter().enumerate() {
        writer.device_icon(start_x + i as f32 * (ICON_WIDTH + ICON_SPACING), icon_y, profile);
    }
    writer.cursor.y = icon_y + ICON_HEIGHT;
    writer.cursor
}
