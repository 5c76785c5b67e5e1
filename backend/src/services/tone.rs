//! Colour and tone stages: gray-world balance, CLAHE and percentile stretch on
//! lightness, saturation scaling.

use super::clahe::Clahe;
use super::colorspace::{bgr_to_hsv, hsv_to_bgr, to_u8, LabPlanes};
use crate::models::bgr::BgrImage;

const WB_EPSILON: f64 = 1e-6;

/// Scale each channel so the three channel means meet at their average.
pub fn gray_world_white_balance(img: &BgrImage) -> BgrImage {
    if img.is_empty() {
        return img.clone();
    }
    let mut sums = [0f64; 3];
    for px in img.pixels() {
        for c in 0..3 {
            sums[c] += px[c] as f64;
        }
    }
    let n = img.pixel_count() as f64;
    let means = sums.map(|s| s / n);
    let gray = (means[0] + means[1] + means[2]) / 3.0;
    let gains = means.map(|m| (gray / (m + WB_EPSILON)) as f32);

    let mut out = img.clone();
    for px in out.as_raw_mut().chunks_exact_mut(3) {
        for c in 0..3 {
            px[c] = to_u8(px[c] as f32 * gains[c]);
        }
    }
    out
}

/// CLAHE on the Lab lightness plane with an 8x8 tile grid; chroma untouched.
pub fn clahe_luma(img: &BgrImage, clip_limit: f64) -> BgrImage {
    if img.is_empty() {
        return img.clone();
    }
    let mut lab = LabPlanes::from_bgr(img);
    lab.l = Clahe::new(clip_limit).apply(&lab.l, lab.width, lab.height);
    lab.to_bgr()
}

/// Value at percentile `p` (0..=100) of a byte plane, linearly interpolated
/// between the neighbouring order statistics.
pub fn percentile(plane: &[u8], p: f64) -> f64 {
    if plane.is_empty() {
        return 0.0;
    }
    let mut hist = [0usize; 256];
    for &v in plane {
        hist[v as usize] += 1;
    }

    let rank = p.clamp(0.0, 100.0) / 100.0 * (plane.len() - 1) as f64;
    let lo_rank = rank.floor() as usize;
    let frac = rank - lo_rank as f64;
    let lo = nth_value(&hist, lo_rank) as f64;
    let hi = nth_value(&hist, (lo_rank + 1).min(plane.len() - 1)) as f64;
    lo + frac * (hi - lo)
}

fn nth_value(hist: &[usize; 256], n: usize) -> u8 {
    let mut seen = 0;
    for (v, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > n {
            return v as u8;
        }
    }
    255
}

/// Stretch lightness so the `low_perc`..`high_perc` percentile band spans
/// 0..255. A collapsed band leaves the image untouched.
pub fn contrast_stretch_luma(img: &BgrImage, low_perc: f64, high_perc: f64) -> BgrImage {
    if img.is_empty() {
        return img.clone();
    }
    let mut lab = LabPlanes::from_bgr(img);
    let lo = percentile(&lab.l, low_perc);
    let hi = percentile(&lab.l, high_perc);
    if hi <= lo {
        return img.clone();
    }

    let gain = 255.0 / (hi - lo);
    for l in lab.l.iter_mut() {
        *l = to_u8(((*l as f64 - lo) * gain) as f32);
    }
    lab.to_bgr()
}

/// Multiply HSV saturation by `factor`, clipping to the valid range.
pub fn adjust_saturation(img: &BgrImage, factor: f32) -> BgrImage {
    let mut out = img.clone();
    for px in out.as_raw_mut().chunks_exact_mut(3) {
        let (h, s, v) = bgr_to_hsv([px[0], px[1], px[2]]);
        let bgr = hsv_to_bgr(h, (s * factor).clamp(0.0, 1.0), v);
        px.copy_from_slice(&bgr);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_balance_removes_cast() {
        let img = BgrImage::filled(4, 4, [100, 150, 200]);
        let out = gray_world_white_balance(&img);
        assert!(out.pixels().all(|p| p == [150, 150, 150]));
    }

    #[test]
    fn test_white_balance_neutral_unchanged() {
        let img = BgrImage::filled(8, 8, [128, 128, 128]);
        assert_eq!(gray_world_white_balance(&img), img);
    }

    #[test]
    fn test_white_balance_black_channel() {
        let img = BgrImage::filled(2, 2, [0, 90, 90]);
        let out = gray_world_white_balance(&img);
        assert_eq!(out.pixel(0, 0), [0, 60, 60]);
    }

    #[test]
    fn test_percentile_interpolates() {
        let plane: Vec<u8> = (0..=100).collect();
        assert_eq!(percentile(&plane, 1.0), 1.0);
        assert_eq!(percentile(&plane, 99.0), 99.0);

        let plane = [0u8, 10];
        assert!((percentile(&plane, 25.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_stretch_flat_is_noop() {
        let img = BgrImage::filled(10, 10, [40, 90, 160]);
        assert_eq!(contrast_stretch_luma(&img, 1.0, 99.0), img);
    }

    #[test]
    fn test_stretch_widens_range() {
        let img = BgrImage::from_fn(50, 1, |x, _| {
            let v = 100 + x as u8;
            [v, v, v]
        });
        let out = contrast_stretch_luma(&img, 1.0, 99.0);
        assert!(out.pixel(0, 0)[1] < 10);
        assert!(out.pixel(49, 0)[1] > 245);
    }

    #[test]
    fn test_clahe_flat_is_noop() {
        let img = BgrImage::filled(64, 48, [128, 128, 128]);
        assert_eq!(clahe_luma(&img, 2.0), img);
    }

    #[test]
    fn test_saturation_boost_and_gray() {
        let gray = BgrImage::filled(3, 3, [128, 128, 128]);
        assert_eq!(adjust_saturation(&gray, 1.05), gray);

        let img = BgrImage::filled(1, 1, [100, 100, 200]);
        let out = adjust_saturation(&img, 2.0);
        assert_eq!(out.pixel(0, 0), [0, 0, 200]);

        let out = adjust_saturation(&img, 0.0);
        assert_eq!(out.pixel(0, 0), [200, 200, 200]);
    }
}
