use anyhow::Result;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

pub const DEFAULT_QUALITY: u8 = 75;
pub const MAX_DIMENSION: u32 = 4096;

/// Resize and re-encode parameters taken from the resource query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
}

impl TranscodeOptions {
    /// Clamps raw query values: dimensions to `1..=MAX_DIMENSION`, quality to
    /// `0..=100` with a default of 75.
    pub fn from_query(width: Option<i64>, height: Option<i64>, quality: Option<i64>) -> Self {
        let dim = |v: i64| v.clamp(1, MAX_DIMENSION as i64) as u32;
        Self {
            width: width.map(dim),
            height: height.map(dim),
            quality: quality
                .map(|q| q.clamp(0, 100) as u8)
                .unwrap_or(DEFAULT_QUALITY),
        }
    }
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: DEFAULT_QUALITY,
        }
    }
}

pub struct TranscodedImage {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

pub fn is_transcodable(mime_type: &str) -> bool {
    matches!(
        mime_type,
        "image/jpeg" | "image/png" | "image/gif" | "image/webp"
    )
}

/// Decodes an image, shrinks it to fit inside the requested box when a width
/// is given, and re-encodes it: lossless WebP at quality 100, JPEG otherwise.
pub fn transcode(data: &[u8], options: TranscodeOptions) -> Result<TranscodedImage> {
    let img = image::load_from_memory(data)?;

    let resized = match options.width {
        Some(width) => fit_inside(&img, width, options.height),
        None => img,
    };
    let (width, height) = resized.dimensions();

    let (data, mime_type) = if options.quality >= 100 {
        (encode_webp(&resized)?, "image/webp")
    } else {
        (encode_jpeg(&resized, options.quality.max(1))?, "image/jpeg")
    };

    Ok(TranscodedImage {
        data,
        mime_type,
        width,
        height,
    })
}

fn fit_inside(img: &DynamicImage, max_width: u32, max_height: Option<u32>) -> DynamicImage {
    let (orig_width, orig_height) = img.dimensions();
    let max_height = max_height.unwrap_or(u32::MAX);

    if orig_width <= max_width && orig_height <= max_height {
        return img.clone();
    }

    // `resize` keeps the aspect ratio and fits within both bounds
    img.resize(
        max_width.min(orig_width),
        max_height.min(orig_height),
        image::imageops::FilterType::Lanczos3,
    )
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buffer.into_inner())
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut buffer = Cursor::new(Vec::new());
    let encoder = WebPEncoder::new_lossless(&mut buffer);
    encoder.encode(&rgba, width, height, image::ExtendedColorType::Rgba8)?;

    Ok(buffer.into_inner())
}
