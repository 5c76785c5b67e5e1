//! Non-local-means denoising.
//!
//! Each output pixel is a weighted mean of the pixels in a square search
//! window, weighted by how similar the template patch around each candidate
//! is to the patch around the target. Patch distances are computed once per
//! search offset with an integral image.

use super::clahe::reflect101;
use super::colorspace::LabPlanes;
use crate::models::bgr::BgrImage;

pub const TEMPLATE_WINDOW: usize = 7;
pub const SEARCH_WINDOW: usize = 21;

/// Weights under this fraction of the centre weight are dropped.
const WEIGHT_THRESHOLD: f32 = 0.001;

/// Colour-aware denoise: the Lab lightness plane is filtered with `h_luma`,
/// the two chroma planes jointly with `h_color`.
pub fn denoise_colored(img: &BgrImage, h_luma: f32, h_color: f32) -> BgrImage {
    if img.is_empty() || (h_luma <= 0.0 && h_color <= 0.0) {
        return img.clone();
    }
    let mut lab = LabPlanes::from_bgr(img);
    let (w, h) = (lab.width as usize, lab.height as usize);

    if h_luma > 0.0 {
        let mut planes = [std::mem::take(&mut lab.l)];
        nl_means(&mut planes, w, h, h_luma);
        let [l] = planes;
        lab.l = l;
    }
    if h_color > 0.0 {
        let mut planes = [std::mem::take(&mut lab.a), std::mem::take(&mut lab.b)];
        nl_means(&mut planes, w, h, h_color);
        let [a, b] = planes;
        lab.a = a;
        lab.b = b;
    }
    lab.to_bgr()
}

/// Filter `C` co-located planes in place with strength `strength`.
pub fn nl_means<const C: usize>(planes: &mut [Vec<u8>; C], width: usize, height: usize, strength: f32) {
    let tr = TEMPLATE_WINDOW / 2;
    let sr = SEARCH_WINDOW / 2;
    let border = tr + sr;
    let pw = width + 2 * border;
    let ph = height + 2 * border;

    // Padded copies so every template and search access is in bounds.
    let padded: Vec<Vec<f32>> = planes
        .iter()
        .map(|plane| {
            let mut out = Vec::with_capacity(pw * ph);
            for py in 0..ph {
                let y = reflect101(py as isize - border as isize, height);
                for px in 0..pw {
                    let x = reflect101(px as isize - border as isize, width);
                    out.push(plane[y * width + x] as f32);
                }
            }
            out
        })
        .collect();

    let template_area = (TEMPLATE_WINDOW * TEMPLATE_WINDOW) as f32;
    let inv_h2 = 1.0 / (strength * strength * C as f32);

    // Squared differences over the template-padded region, then its integral.
    let rw = width + 2 * tr;
    let rh = height + 2 * tr;
    let mut diff = vec![0f32; rw * rh];
    let mut integral = vec![0f64; (rw + 1) * (rh + 1)];

    let mut weight_sum = vec![0f32; width * height];
    let mut value_sum = vec![[0f32; C]; width * height];

    for dy in -(sr as isize)..=(sr as isize) {
        for dx in -(sr as isize)..=(sr as isize) {
            for ry in 0..rh {
                let py = ry + sr;
                let qy = (py as isize + dy) as usize;
                for rx in 0..rw {
                    let px = rx + sr;
                    let qx = (px as isize + dx) as usize;
                    let mut d = 0.0;
                    for plane in &padded {
                        let e = plane[py * pw + px] - plane[qy * pw + qx];
                        d += e * e;
                    }
                    diff[ry * rw + rx] = d;
                }
            }

            for ry in 0..rh {
                let mut row = 0f64;
                for rx in 0..rw {
                    row += diff[ry * rw + rx] as f64;
                    integral[(ry + 1) * (rw + 1) + rx + 1] = integral[ry * (rw + 1) + rx + 1] + row;
                }
            }

            for y in 0..height {
                for x in 0..width {
                    let (x0, y0) = (x, y);
                    let (x1, y1) = (x + TEMPLATE_WINDOW, y + TEMPLATE_WINDOW);
                    let ssd = integral[y1 * (rw + 1) + x1] - integral[y0 * (rw + 1) + x1]
                        - integral[y1 * (rw + 1) + x0]
                        + integral[y0 * (rw + 1) + x0];
                    let dist = (ssd.max(0.0) as f32) / template_area;
                    let weight = (-dist * inv_h2).exp();
                    if weight < WEIGHT_THRESHOLD {
                        continue;
                    }

                    let qy = (y + border) as isize + dy;
                    let qx = (x + border) as isize + dx;
                    let q = qy as usize * pw + qx as usize;
                    let i = y * width + x;
                    weight_sum[i] += weight;
                    for (c, plane) in padded.iter().enumerate() {
                        value_sum[i][c] += weight * plane[q];
                    }
                }
            }
        }
    }

    for (c, plane) in planes.iter_mut().enumerate() {
        for (i, out) in plane.iter_mut().enumerate() {
            // The zero offset always contributes weight 1.
            let v = value_sum[i][c] / weight_sum[i];
            *out = v.round().clamp(0.0, 255.0) as u8;
        }
    }
}
