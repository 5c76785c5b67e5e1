use std::time::Instant;

use crate::models::bgr::BgrImage;
use crate::models::error::EnhanceError;
use crate::models::params::EnhanceParams;
use crate::services::{denoise, spatial, tone};

/// Percentile band used by the contrast stretch stage.
pub const STRETCH_LOW_PERCENTILE: f64 = 1.0;
pub const STRETCH_HIGH_PERCENTILE: f64 = 99.0;

/// Run the fixed enhancement pipeline:
/// denoise, white balance, CLAHE, percentile stretch, upscale, unsharp mask,
/// saturation. Parameters are validated against the input size before any
/// stage runs.
pub fn enhance(img: &BgrImage, params: &EnhanceParams) -> Result<BgrImage, EnhanceError> {
    if img.is_empty() {
        return Err(EnhanceError::EmptyImage);
    }
    params.validate()?;
    let (src_w, src_h) = img.dimensions();
    let (out_w, out_h) = params.output_size(src_w, src_h)?;

    let started = Instant::now();
    let out = stage("denoise", || {
        denoise::denoise_colored(img, params.denoise_luma, params.denoise_color)
    });
    let out = stage("white_balance", || tone::gray_world_white_balance(&out));
    let out = stage("clahe", || tone::clahe_luma(&out, params.clahe_clip));
    let out = stage("contrast_stretch", || {
        tone::contrast_stretch_luma(&out, STRETCH_LOW_PERCENTILE, STRETCH_HIGH_PERCENTILE)
    });
    let out = stage("upscale", || spatial::resize(&out, out_w, out_h));
    let out = stage("unsharp_mask", || {
        spatial::unsharp_mask(&out, params.sharpen_amount, params.sharpen_sigma)
    });
    let out = stage("saturation", || tone::adjust_saturation(&out, params.saturation));

    tracing::info!(
        src_width = src_w,
        src_height = src_h,
        width = out_w,
        height = out_h,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "enhance complete",
    );
    Ok(out)
}

fn stage(name: &'static str, f: impl FnOnce() -> BgrImage) -> BgrImage {
    let started = Instant::now();
    let out = f();
    tracing::debug!(
        stage = name,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "stage done"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params::SizeSpec;

    #[test]
    fn test_rejects_empty_image() {
        let img = BgrImage::filled(0, 0, [0, 0, 0]);
        assert!(matches!(
            enhance(&img, &EnhanceParams::default()),
            Err(EnhanceError::EmptyImage)
        ));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let img = BgrImage::filled(4, 4, [1, 2, 3]);
        let params = EnhanceParams {
            saturation: -0.5,
            ..EnhanceParams::default()
        };
        assert!(matches!(
            enhance(&img, &params),
            Err(EnhanceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_default_scale_doubles() {
        let img = BgrImage::from_fn(12, 8, |x, y| [(x * 20) as u8, (y * 30) as u8, 100]);
        let out = enhance(&img, &EnhanceParams::default()).unwrap();
        assert_eq!(out.dimensions(), (24, 16));
    }

    #[test]
    fn test_target_height_aspect() {
        let img = BgrImage::filled(100, 50, [30, 60, 90]);
        let params = EnhanceParams {
            size: SizeSpec::TargetHeight(25),
            ..EnhanceParams::default()
        };
        assert_eq!(enhance(&img, &params).unwrap().dimensions(), (50, 25));
    }
}
