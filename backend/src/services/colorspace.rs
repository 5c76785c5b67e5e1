//! 8-bit colour-space packing used by the tone stages.
//!
//! Lab follows the common 8-bit packing: L scaled from 0..100 to 0..255, a and
//! b offset by 128. sRGB primaries, D65 white point.

use palette::white_point::D65;
use palette::{Hsv, IntoColor, Lab, LinSrgb, Srgb};

use crate::models::bgr::BgrImage;

type LabD65 = Lab<D65, f32>;

/// Luminance plus two chroma planes, each one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabPlanes {
    pub width: u32,
    pub height: u32,
    pub l: Vec<u8>,
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

impl LabPlanes {
    pub fn from_bgr(img: &BgrImage) -> Self {
        let linear = linear_table();
        let n = img.pixel_count();
        let mut l = Vec::with_capacity(n);
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);

        for px in img.pixels() {
            let lin = LinSrgb::new(
                linear[px[2] as usize],
                linear[px[1] as usize],
                linear[px[0] as usize],
            );
            let lab: LabD65 = lin.into_color();
            l.push(to_u8(lab.l * 255.0 / 100.0));
            a.push(to_u8(lab.a + 128.0));
            b.push(to_u8(lab.b + 128.0));
        }

        Self {
            width: img.width(),
            height: img.height(),
            l,
            a,
            b,
        }
    }

    pub fn to_bgr(&self) -> BgrImage {
        let mut data = Vec::with_capacity(self.l.len() * 3);
        for i in 0..self.l.len() {
            let lab = LabD65::new(
                self.l[i] as f32 * 100.0 / 255.0,
                self.a[i] as f32 - 128.0,
                self.b[i] as f32 - 128.0,
            );
            let lin: LinSrgb<f32> = lab.into_color();
            let srgb: Srgb<f32> = Srgb::from_linear(lin);
            data.push(unit_to_u8(srgb.blue));
            data.push(unit_to_u8(srgb.green));
            data.push(unit_to_u8(srgb.red));
        }
        BgrImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| BgrImage::filled(self.width, self.height, [0, 0, 0]))
    }
}

/// Round to nearest and saturate to the byte range.
#[inline]
pub fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    to_u8(v.clamp(0.0, 1.0) * 255.0)
}

/// Byte to linear light, decoded once per image.
fn linear_table() -> [f32; 256] {
    let mut table = [0.0f32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let lin: LinSrgb<f32> = Srgb::new(i as u8, i as u8, i as u8)
            .into_format::<f32>()
            .into_linear();
        *slot = lin.red;
    }
    table
}

/// BGR bytes to (hue in degrees [0, 360), saturation [0, 1], value [0, 1]).
pub fn bgr_to_hsv(px: [u8; 3]) -> (f32, f32, f32) {
    let rgb: Srgb<f32> = Srgb::new(px[2], px[1], px[0]).into_format();
    let hsv: Hsv = rgb.into_color();
    (hsv.hue.into_positive_degrees(), hsv.saturation, hsv.value)
}

pub fn hsv_to_bgr(h: f32, s: f32, v: f32) -> [u8; 3] {
    let hsv: Hsv = Hsv::new(h, s, v);
    let rgb: Srgb<f32> = hsv.into_color();
    [
        unit_to_u8(rgb.blue),
        unit_to_u8(rgb.green),
        unit_to_u8(rgb.red),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_gray_has_centered_chroma() {
        for v in [0u8, 1, 37, 128, 255] {
            let img = BgrImage::filled(2, 2, [v, v, v]);
            let lab = LabPlanes::from_bgr(&img);
            assert!(lab.a.iter().all(|&a| a == 128), "a off-center for {}", v);
            assert!(lab.b.iter().all(|&b| b == 128), "b off-center for {}", v);
            assert_eq!(lab.to_bgr(), img, "gray {} did not survive", v);
        }
    }

    #[test]
    fn test_lab_lightness_extremes() {
        let black = LabPlanes::from_bgr(&BgrImage::filled(1, 1, [0, 0, 0]));
        let white = LabPlanes::from_bgr(&BgrImage::filled(1, 1, [255, 255, 255]));
        assert_eq!(black.l[0], 0);
        assert_eq!(white.l[0], 255);
    }

    #[test]
    fn test_lab_round_trip_is_close() {
        let img = BgrImage::from_fn(16, 16, |x, y| [(x * 16) as u8, (y * 16) as u8, 90]);
        let back = LabPlanes::from_bgr(&img).to_bgr();
        for (p, q) in img.pixels().zip(back.pixels()) {
            for c in 0..3 {
                assert!((p[c] as i32 - q[c] as i32).abs() <= 6, "{:?} vs {:?}", p, q);
            }
        }
    }

    #[test]
    fn test_hsv_round_trip() {
        for px in [[0u8, 0, 255], [10, 200, 30], [128, 128, 128], [255, 0, 255], [3, 7, 250]] {
            let (h, s, v) = bgr_to_hsv(px);
            assert_eq!(hsv_to_bgr(h, s, v), px);
        }
    }

    #[test]
    fn test_hsv_gray_has_no_saturation() {
        let (_, s, v) = bgr_to_hsv([128, 128, 128]);
        assert_eq!(s, 0.0);
        assert!((v - 128.0 / 255.0).abs() < 1e-6);
    }
}
