//! Feature image post-processing.
//!
//! E-paper panels wash out photographs, so every per-device copy of the
//! feature image gets a fixed contrast and saturation boost before it is
//! embedded. Failures here never abort a conversion: the caller gets the
//! original bytes back and a warning is logged.

use std::borrow::Cow;
use std::io::Cursor;

use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, Rgb, RgbImage};
use tracing::{debug, warn};

use crate::{PaperfoldError, Result};

/// JPEG quality used for every re-encoded image.
pub const JPEG_QUALITY: u8 = 90;

const CONTRAST: f32 = 1.25;
const SATURATION: f32 = 1.35;

/// Whether the image URL names a WebP file. Query and fragment are ignored.
pub fn is_webp_url(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase().ends_with(".webp")
}

/// Re-encodes WebP images as JPEG; other images are passed through.
pub fn transcode_if_webp<'a>(bytes: &'a [u8], url: &str) -> Result<Cow<'a, [u8]>> {
    if !is_webp_url(url) {
        return Ok(Cow::Borrowed(bytes));
    }

    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::WebP)?;
    debug!(width = decoded.width(), height = decoded.height(), "transcoding WebP feature image");
    Ok(Cow::Owned(encode_jpeg(&flatten_alpha(&decoded))?))
}

/// Applies the e-paper contrast and saturation boost in place.
///
/// Contrast scales every channel around mid-gray; saturation then pushes
/// each channel away from the pixel's luminance. Only the final value is
/// rounded and clamped.
pub fn apply_color_correction(image: &mut RgbImage) {
    let intercept = 128.0 * (1.0 - CONTRAST);

    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0.map(|c| f32::from(c) * CONTRAST + intercept);
        let gray = 0.2989 * r + 0.5870 * g + 0.1140 * b;
        *pixel = Rgb([r, g, b].map(|c| (gray + SATURATION * (c - gray)).round().clamp(0.0, 255.0) as u8));
    }
}

/// Produces the color-corrected JPEG embedded in a device section.
///
/// Never fails: on any decode or encode error the input bytes are returned.
pub fn prepare_feature_image(bytes: &[u8], url: &str) -> Vec<u8> {
    match correct(bytes, url) {
        Ok(prepared) => prepared,
        Err(err) => {
            warn!(error = %err, "using feature image without color correction");
            bytes.to_vec()
        }
    }
}

fn correct(bytes: &[u8], url: &str) -> Result<Vec<u8>> {
    let source = transcode_if_webp(bytes, url)?;
    let decoded = image::load_from_memory(&source)?;
    let mut rgb = flatten_alpha(&decoded);
    apply_color_correction(&mut rgb);
    encode_jpeg(&rgb)
}

/// Composites any alpha channel onto white and drops it.
fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(image)?;
    Ok(out)
}

/// Color space of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRgb,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::DeviceRgb => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// A JPEG ready to be written as a `DCTDecode` image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    /// Builds an embeddable image from any supported encoded image.
    ///
    /// Gray and RGB JPEGs are embedded as-is; everything else is decoded
    /// and re-encoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg))
            && let Some(embedded) = Self::passthrough(bytes)?
        {
            return Ok(embedded);
        }

        let decoded = image::load_from_memory(bytes)?;
        let rgb = flatten_alpha(&decoded);
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(PaperfoldError::Image("image has no pixels".to_string()));
        }
        Ok(Self { width: rgb.width(), height: rgb.height(), color_space: ColorSpace::DeviceRgb, data: encode_jpeg(&rgb)? })
    }

    fn passthrough(bytes: &[u8]) -> Result<Option<Self>> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions();
        let color_space = match decoder.original_color_type() {
            ExtendedColorType::L8 => ColorSpace::DeviceGray,
            ExtendedColorType::Rgb8 => ColorSpace::DeviceRgb,
            _ => return Ok(None),
        };
        if width == 0 || height == 0 {
            return Err(PaperfoldError::Image("image has no pixels".to_string()));
        }
        Ok(Some(Self { width, height, color_space, data: bytes.to_vec() }))
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn sample_rgb() -> RgbImage {
        RgbImage::from_fn(8, 6, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 90]))
    }

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        image.write_to(&mut cursor, format).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_webp_url_detection() {
        assert!(is_webp_url("https://cdn.example.com/a/photo.WEBP"));
        assert!(is_webp_url("https://cdn.example.com/photo.webp?w=800&q=70"));
        assert!(is_webp_url("/relative/photo.webp#frag"));
        assert!(!is_webp_url("https://cdn.example.com/photo.jpg?format=webp"));
        assert!(!is_webp_url("https://cdn.example.com/webp/photo.png"));
    }

    #[test]
    fn test_color_correction_values() {
        let mut image = RgbImage::from_vec(3, 1, vec![128, 128, 128, 0, 0, 0, 200, 100, 50]).unwrap();
        apply_color_correction(&mut image);

        assert_eq!(image.get_pixel(0, 0).0, [128, 128, 128]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(2, 0).0, [251, 82, 0]);
    }

    #[test]
    fn test_non_webp_passes_through_untouched() {
        let bytes = encode(DynamicImage::ImageRgb8(sample_rgb()), ImageFormat::Png);
        let out = transcode_if_webp(&bytes, "https://example.com/a.png").unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_webp_transcoded_to_jpeg() {
        let webp = encode(DynamicImage::ImageRgb8(sample_rgb()), ImageFormat::WebP);
        let out = transcode_if_webp(&webp, "https://example.com/a.webp?x=1").unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }

    #[test]
    fn test_prepare_is_deterministic_jpeg() {
        let png = encode(DynamicImage::ImageRgb8(sample_rgb()), ImageFormat::Png);
        let first = prepare_feature_image(&png, "https://example.com/a.png");
        let second = prepare_feature_image(&png, "https://example.com/a.png");

        assert_eq!(first, second);
        assert_eq!(image::guess_format(&first).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_prepare_returns_input_on_garbage() {
        let garbage = b"not an image at all".to_vec();
        assert_eq!(prepare_feature_image(&garbage, "https://example.com/a.jpg"), garbage);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(rgba));
        assert!(flat.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_embedded_jpeg_passthrough() {
        let rgb_jpeg = encode_jpeg(&sample_rgb()).unwrap();
        let embedded = EmbeddedImage::from_bytes(&rgb_jpeg).unwrap();
        assert_eq!(embedded.color_space, ColorSpace::DeviceRgb);
        assert_eq!((embedded.width, embedded.height), (8, 6));
        assert_eq!(embedded.data, rgb_jpeg);

        let gray = encode(DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([77]))), ImageFormat::Jpeg);
        assert_eq!(EmbeddedImage::from_bytes(&gray).unwrap().color_space, ColorSpace::DeviceGray);
    }

    #[test]
    fn test_embedded_png_reencoded() {
        let png = encode(DynamicImage::ImageRgb8(sample_rgb()), ImageFormat::Png);
        let embedded = EmbeddedImage::from_bytes(&png).unwrap();

        assert_eq!(image::guess_format(&embedded.data).unwrap(), ImageFormat::Jpeg);
        assert!((embedded.aspect_ratio() - 8.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_embedded_rejects_garbage() {
        assert!(matches!(EmbeddedImage::from_bytes(b"nope"), Err(PaperfoldError::Image(_))));
    }
}
