//! Metrics for the standard PDF fonts used in generated documents.
//!
//! Only the five base-14 faces the layout needs are covered. Widths come
//! from the Adobe AFM files (units of 1/1000 em) for the printable ASCII
//! range; the WinAnsi typographic punctuation has its own table and the
//! Latin-1 range is approximated from comparable ASCII glyphs.

/// A standard Type1 font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Font {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    HelveticaBold,
}

/// Font metrics from an AFM file.
struct Metrics {
    /// Widths of bytes 32..=126 in WinAnsi encoding.
    ascii: [u16; 95],
    /// quoteleft, quoteright, quotedblleft, quotedblright, endash, emdash, ellipsis, bullet
    typographic: [u16; 8],
    ascender: i16,
    /// Ascender minus descender plus the bounding-box line gap.
    line_height: u16,
}

#[rustfmt::skip]
const TIMES_ROMAN: Metrics = Metrics {
    ascii: [
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
        921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
        556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
        333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
        500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
    ],
    typographic: [333, 333, 444, 444, 500, 1000, 1000, 350],
    ascender: 683,
    line_height: 1116,
};

#[rustfmt::skip]
const TIMES_BOLD: Metrics = Metrics {
    ascii: [
        250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
        930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
        611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
        333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
        556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
    ],
    typographic: [333, 333, 500, 500, 500, 1000, 1000, 350],
    ascender: 683,
    line_height: 1153,
};

#[rustfmt::skip]
const TIMES_ITALIC: Metrics = Metrics {
    ascii: [
        250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
        920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
        611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
        333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
        500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
    ],
    typographic: [333, 333, 556, 556, 500, 889, 889, 350],
    ascender: 683,
    line_height: 1100,
};

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: Metrics = Metrics {
    ascii: [
        250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
        832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
        611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
        333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
        500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
    ],
    typographic: [333, 333, 500, 500, 500, 1000, 1000, 350],
    ascender: 683,
    line_height: 1139,
};

#[rustfmt::skip]
const HELVETICA_BOLD: Metrics = Metrics {
    ascii: [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
        975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
        333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
        611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ],
    typographic: [278, 278, 500, 500, 556, 1000, 1000, 350],
    ascender: 718,
    line_height: 1190,
};

/// WinAnsi bytes for the typographic characters outside Latin-1, in the
/// order of [`Metrics::typographic`].
const TYPOGRAPHIC: [(char, u8); 8] = [
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{2026}', 0x85),
    ('\u{2022}', 0x95),
];

impl Font {
    pub const ALL: [Font; 5] =
        [Font::TimesRoman, Font::TimesBold, Font::TimesItalic, Font::TimesBoldItalic, Font::HelveticaBold];

    /// Body face for the given emphasis.
    pub fn body(bold: bool, italic: bool) -> Font {
        match (bold, italic) {
            (true, true) => Font::TimesBoldItalic,
            (true, false) => Font::TimesBold,
            (false, true) => Font::TimesItalic,
            (false, false) => Font::TimesRoman,
        }
    }

    /// PostScript name used as `/BaseFont`.
    pub fn base_name(self) -> &'static str {
        match self {
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::TimesItalic => "Times-Italic",
            Font::TimesBoldItalic => "Times-BoldItalic",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Name of the font in page resource dictionaries.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::TimesRoman => "F1",
            Font::TimesBold => "F2",
            Font::TimesItalic => "F3",
            Font::TimesBoldItalic => "F4",
            Font::HelveticaBold => "F5",
        }
    }

    fn metrics(self) -> &'static Metrics {
        match self {
            Font::TimesRoman => &TIMES_ROMAN,
            Font::TimesBold => &TIMES_BOLD,
            Font::TimesItalic => &TIMES_ITALIC,
            Font::TimesBoldItalic => &TIMES_BOLD_ITALIC,
            Font::HelveticaBold => &HELVETICA_BOLD,
        }
    }

    /// Width of an encoded byte in 1/1000 em.
    fn byte_width(self, byte: u8) -> u16 {
        let metrics = self.metrics();
        let ascii = |c: u8| metrics.ascii[usize::from(c - 32)];

        match byte {
            32..=126 => ascii(byte),
            0xA0 => ascii(b' '),
            0xC0..=0xDE => ascii(b'O'),
            0xDF..=0xFF => ascii(b'o'),
            0xA1..=0xBF => ascii(b'0'),
            _ => match TYPOGRAPHIC.iter().position(|(_, b)| *b == byte) {
                Some(index) => metrics.typographic[index],
                None => ascii(b'?'),
            },
        }
    }

    /// Advance width of `text` at `size` points.
    pub fn measure(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(self.byte_width(win_ansi_byte(ch)))).sum();
        units as f32 * size / 1000.0
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascent(self, size: f32) -> f32 {
        f32::from(self.metrics().ascender) * size / 1000.0
    }

    /// Height of one line, gap included, before any extra line spacing.
    pub fn line_height(self, size: f32) -> f32 {
        f32::from(self.metrics().line_height) * size / 1000.0
    }
}

/// WinAnsi byte for a character; unmappable characters become `?`.
pub fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        ' '..='~' => ch as u8,
        '\t' | '\n' | '\r' => b' ',
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        _ => TYPOGRAPHIC.iter().find(|(c, _)| *c == ch).map(|(_, b)| *b).unwrap_or(b'?'),
    }
}

/// Encodes text for a WinAnsi-encoded simple font.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

/// Greedy word wrap.
///
/// Words are split on whitespace and joined with single spaces. A word
/// wider than `width` on its own is broken between characters.
pub fn wrap_words(text: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() { word.to_string() } else { format!("{current} {word}") };
        if font.measure(&candidate, size) <= width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if font.measure(word, size) <= width {
            current = word.to_string();
        } else {
            let mut pieces = break_word(word, font, size, width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits an over-long word into pieces that each fit `width`.
pub fn break_word(word: &str, font: Font, size: f32, width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();

    for ch in word.chars() {
        piece.push(ch);
        if font.measure(&piece, size) > width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Height of `text` wrapped into `width`.
pub fn height_of_string(text: &str, font: Font, size: f32, width: f32) -> f32 {
    wrap_words(text, font, size, width).len().max(1) as f32 * font.line_height(size)
}
