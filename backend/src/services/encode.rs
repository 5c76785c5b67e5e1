use std::io::Cursor;

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::models::bgr::BgrImage;
use crate::models::error::EnhanceError;
use crate::models::output::{OutputBundle, OutputFormat};

pub const JPEG_QUALITY: u8 = 90;
pub const WEBP_QUALITY: f32 = 90.0;
/// libwebp effort level; 6 is the slowest, smallest setting.
pub const WEBP_METHOD: i32 = 6;
/// Frame delay of the single APNG frame, as numerator / denominator seconds.
pub const APNG_DELAY: (u16, u16) = (100, 1000);

/// Encode the enhanced image in every output format.
pub fn encode_all(img: &BgrImage) -> Result<OutputBundle, EnhanceError> {
    let rgb = img.to_rgb();
    let mut bundle = OutputBundle::default();
    for format in OutputFormat::ALL {
        bundle.insert(format, encode(&rgb, format)?);
    }
    Ok(bundle)
}

pub fn encode(rgb: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, EnhanceError> {
    let bytes = match format {
        OutputFormat::Png => encode_png(rgb)?,
        OutputFormat::Jpeg => encode_jpeg(rgb, JPEG_QUALITY)?,
        OutputFormat::Webp => encode_webp(rgb)?,
        OutputFormat::Apng => encode_apng(rgb)?,
    };
    tracing::debug!(format = format.key(), size_bytes = bytes.len(), "encoded");
    Ok(bytes)
}

/// Lossless PNG with the strongest deflate setting and adaptive filtering.
fn encode_png(rgb: &RgbImage) -> Result<Vec<u8>, EnhanceError> {
    let mut buf = Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| encode_error("PNG", e))?;
    Ok(buf.into_inner())
}

/// Baseline JPEG with 4:4:4 sampling and optimized Huffman tables.
fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, EnhanceError> {
    write_jpeg(rgb, quality, true)
}

fn write_jpeg(rgb: &RgbImage, quality: u8, optimize: bool) -> Result<Vec<u8>, EnhanceError> {
    let (width, height) = match (u16::try_from(rgb.width()), u16::try_from(rgb.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(encode_error(
                "JPEG",
                format!("{}x{} exceeds the 65535 pixel limit", rgb.width(), rgb.height()),
            ))
        }
    };

    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, quality);
    encoder.set_sampling_factor(jpeg_encoder::SamplingFactor::R_4_4_4);
    encoder.set_optimized_huffman_tables(optimize);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| encode_error("JPEG", e))?;
    Ok(buf)
}

fn encode_webp(rgb: &RgbImage) -> Result<Vec<u8>, EnhanceError> {
    let mut config = webp::WebPConfig::new().map_err(|_| EnhanceError::Encode {
        format: "WEBP",
        detail: "libwebp rejected the default config".to_string(),
    })?;
    config.lossless = 0;
    config.quality = WEBP_QUALITY;
    config.method = WEBP_METHOD;

    let encoder = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| encode_error("WEBP", format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

/// Single-frame animated PNG: the default image doubles as frame one.
fn encode_apng(rgb: &RgbImage) -> Result<Vec<u8>, EnhanceError> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, rgb.width(), rgb.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        encoder
            .set_animated(1, 0)
            .map_err(|e| encode_error("APNG", e))?;
        encoder
            .set_frame_delay(APNG_DELAY.0, APNG_DELAY.1)
            .map_err(|e| encode_error("APNG", e))?;

        let mut writer = encoder
            .write_header()
            .map_err(|e| encode_error("APNG", e))?;
        writer
            .write_image_data(rgb.as_raw())
            .map_err(|e| encode_error("APNG", e))?;
        writer.finish().map_err(|e| encode_error("APNG", e))?;
    }
    Ok(buf)
}

fn encode_error(format: &'static str, e: impl std::fmt::Display) -> EnhanceError {
    EnhanceError::Encode {
        format,
        detail: e.to_string(),
    }
}
