use serde::{Deserialize, Serialize};

use crate::models::error::EnhanceError;

pub const DEFAULT_SCALE: f64 = 2.0;
pub const DEFAULT_DENOISE_LUMA: f32 = 5.0;
pub const DEFAULT_DENOISE_COLOR: f32 = 5.0;
pub const DEFAULT_CLAHE_CLIP: f64 = 2.0;
pub const DEFAULT_SHARPEN_AMOUNT: f32 = 0.6;
pub const DEFAULT_SHARPEN_SIGMA: f32 = 1.2;
pub const DEFAULT_SATURATION: f32 = 1.05;

/// Upper bound on either side of the resized output.
pub const MAX_OUTPUT_DIMENSION: u32 = 16_384;

/// How the upscale stage picks its output size.
///
/// Exactly one variant is in effect. An explicit width and/or height always
/// wins over a scale factor; see [`SizeSpec::from_options`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizeSpec {
    ScaleFactor(f64),
    TargetWidth(u32),
    TargetHeight(u32),
    TargetSize(u32, u32),
}

impl Default for SizeSpec {
    fn default() -> Self {
        SizeSpec::ScaleFactor(DEFAULT_SCALE)
    }
}

impl SizeSpec {
    /// Collapse the three optional knobs into one variant. `scale` is ignored
    /// whenever `width` or `height` is present.
    pub fn from_options(scale: Option<f64>, width: Option<u32>, height: Option<u32>) -> Self {
        match (width, height) {
            (Some(w), Some(h)) => SizeSpec::TargetSize(w, h),
            (Some(w), None) => SizeSpec::TargetWidth(w),
            (None, Some(h)) => SizeSpec::TargetHeight(h),
            (None, None) => SizeSpec::ScaleFactor(scale.unwrap_or(DEFAULT_SCALE)),
        }
    }

    /// Concrete output dimensions for an input of `width` x `height`.
    /// Derived sides are rounded to the nearest pixel, ties to even.
    pub fn resolve(&self, width: u32, height: u32) -> (u32, u32) {
        let (w, h) = (width as f64, height as f64);
        match *self {
            SizeSpec::TargetSize(tw, th) => (tw, th),
            SizeSpec::TargetWidth(tw) => (tw, round_dim(h * (tw as f64 / w))),
            SizeSpec::TargetHeight(th) => (round_dim(w * (th as f64 / h)), th),
            SizeSpec::ScaleFactor(s) => (round_dim(w * s), round_dim(h * s)),
        }
    }

    fn validate(&self) -> Result<(), EnhanceError> {
        match *self {
            SizeSpec::ScaleFactor(s) if !s.is_finite() || s <= 0.0 => {
                Err(invalid("scale", format!("must be a positive number, got {}", s)))
            }
            SizeSpec::TargetWidth(0) | SizeSpec::TargetSize(0, _) => {
                Err(invalid("width", "must be at least 1".to_string()))
            }
            SizeSpec::TargetHeight(0) | SizeSpec::TargetSize(_, 0) => {
                Err(invalid("height", "must be at least 1".to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn round_dim(v: f64) -> u32 {
    v.round_ties_even().clamp(0.0, u32::MAX as f64) as u32
}

/// Knobs for one `enhance` run. `Default` carries the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceParams {
    pub size: SizeSpec,
    /// Non-local-means strength on the luminance plane.
    pub denoise_luma: f32,
    /// Non-local-means strength on the chroma planes.
    pub denoise_color: f32,
    /// CLAHE clip limit; 0 disables clipping.
    pub clahe_clip: f64,
    pub sharpen_amount: f32,
    pub sharpen_sigma: f32,
    pub saturation: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            size: SizeSpec::default(),
            denoise_luma: DEFAULT_DENOISE_LUMA,
            denoise_color: DEFAULT_DENOISE_COLOR,
            clahe_clip: DEFAULT_CLAHE_CLIP,
            sharpen_amount: DEFAULT_SHARPEN_AMOUNT,
            sharpen_sigma: DEFAULT_SHARPEN_SIGMA,
            saturation: DEFAULT_SATURATION,
        }
    }
}

impl EnhanceParams {
    /// Reject values the stages cannot honour. Run once at the boundary.
    pub fn validate(&self) -> Result<(), EnhanceError> {
        non_negative("denoise_luma", self.denoise_luma as f64)?;
        non_negative("denoise_color", self.denoise_color as f64)?;
        non_negative("clahe_clip", self.clahe_clip)?;
        non_negative("sharpen_amount", self.sharpen_amount as f64)?;
        non_negative("saturation", self.saturation as f64)?;
        if !self.sharpen_sigma.is_finite() || self.sharpen_sigma <= 0.0 {
            return Err(invalid(
                "sharpen_sigma",
                format!("must be a positive number, got {}", self.sharpen_sigma),
            ));
        }
        self.size.validate()
    }

    /// Resolve the output size for an input image, rejecting degenerate or
    /// oversized targets.
    pub fn output_size(&self, width: u32, height: u32) -> Result<(u32, u32), EnhanceError> {
        let (w, h) = self.size.resolve(width, height);
        if w == 0 || h == 0 {
            return Err(invalid(
                "size",
                format!("resolves to an empty {}x{} image", w, h),
            ));
        }
        if w > MAX_OUTPUT_DIMENSION || h > MAX_OUTPUT_DIMENSION {
            return Err(invalid(
                "size",
                format!(
                    "{}x{} exceeds the {} pixel limit per side",
                    w, h, MAX_OUTPUT_DIMENSION
                ),
            ));
        }
        Ok((w, h))
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), EnhanceError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(name, format!("must be zero or positive, got {}", value)));
    }
    Ok(())
}

fn invalid(name: &str, reason: String) -> EnhanceError {
    EnhanceError::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}
