//! Geometric and frequency stages: Lanczos resize and unsharp masking.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, Rgb32FImage};
use imageproc::filter::gaussian_blur_f32;

use super::clahe::reflect101;
use super::colorspace::to_u8;
use crate::models::bgr::BgrImage;

/// Resample to exactly `width` x `height` with a Lanczos3 kernel.
pub fn resize(img: &BgrImage, width: u32, height: u32) -> BgrImage {
    if img.dimensions() == (width, height) || img.is_empty() {
        return img.clone();
    }
    match img.as_channel_agnostic() {
        Some(view) => BgrImage::from_channel_agnostic(imageops::resize(
            &view,
            width,
            height,
            FilterType::Lanczos3,
        )),
        None => img.clone(),
    }
}

/// `original * (1 + amount) - blurred * amount`, blurred with a Gaussian of
/// the given sigma. Intermediate math stays in `f32`.
///
/// The blur reads a reflect-101 margin wider than its kernel, so border
/// pixels see mirrored neighbours rather than repeated edge samples.
pub fn unsharp_mask(img: &BgrImage, amount: f32, sigma: f32) -> BgrImage {
    if img.is_empty() || amount == 0.0 || sigma <= 0.0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let pad = (sigma * 6.0).ceil() as u32 + 1;
    let padded: Rgb32FImage = ImageBuffer::from_fn(w + 2 * pad, h + 2 * pad, |x, y| {
        let sx = reflect101(x as isize - pad as isize, w as usize) as u32;
        let sy = reflect101(y as isize - pad as isize, h as usize) as u32;
        let p = img.pixel(sx, sy);
        Rgb([p[0] as f32, p[1] as f32, p[2] as f32])
    });
    let blurred: ImageBuffer<Rgb<f32>, Vec<f32>> = gaussian_blur_f32(&padded, sigma);

    let mut data = Vec::with_capacity(img.as_raw().len());
    for y in 0..h {
        for x in 0..w {
            let o = img.pixel(x, y);
            let b = blurred.get_pixel(x + pad, y + pad).0;
            for c in 0..3 {
                let o = o[c] as f32;
                data.push(to_u8(o * (1.0 + amount) - b[c] * amount));
            }
        }
    }
    BgrImage::from_raw(w, h, data).unwrap_or_else(|| img.clone())
}
