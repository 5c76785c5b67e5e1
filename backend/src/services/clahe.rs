//! Contrast-limited adaptive histogram equalization on a single 8-bit plane.

const BINS: usize = 256;

/// Tile grid and clip limit for one CLAHE pass. Built per call; nothing is
/// shared between runs.
#[derive(Debug, Clone, Copy)]
pub struct Clahe {
    pub clip_limit: f64,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl Clahe {
    pub fn new(clip_limit: f64) -> Self {
        Self {
            clip_limit,
            tiles_x: 8,
            tiles_y: 8,
        }
    }

    /// Equalize `plane` (`width` x `height`, row-major) and return the result.
    ///
    /// Sizes not divisible by the grid are handled by reading the plane with
    /// reflect-101 borders, so every tile has the same area.
    pub fn apply(&self, plane: &[u8], width: u32, height: u32) -> Vec<u8> {
        if width == 0 || height == 0 {
            return plane.to_vec();
        }
        let (w, h) = (width as usize, height as usize);
        let tiles_x = self.tiles_x.max(1) as usize;
        let tiles_y = self.tiles_y.max(1) as usize;
        let tile_w = w.div_ceil(tiles_x);
        let tile_h = h.div_ceil(tiles_y);
        let tile_area = tile_w * tile_h;

        let clip = if self.clip_limit > 0.0 {
            ((self.clip_limit * tile_area as f64 / BINS as f64) as usize).max(1)
        } else {
            usize::MAX
        };

        let mut luts = Vec::with_capacity(tiles_x * tiles_y);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let mut hist = [0usize; BINS];
                for yy in 0..tile_h {
                    let y = reflect101((ty * tile_h + yy) as isize, h);
                    for xx in 0..tile_w {
                        let x = reflect101((tx * tile_w + xx) as isize, w);
                        hist[plane[y * w + x] as usize] += 1;
                    }
                }
                luts.push(tile_lut(&mut hist, clip, tile_area));
            }
        }

        let mut out = vec![0u8; plane.len()];
        for y in 0..h {
            let tyf = y as f32 / tile_h as f32 - 0.5;
            let ty1 = tyf.floor() as isize;
            let ya = tyf - ty1 as f32;
            let ty2 = (ty1 + 1).min(tiles_y as isize - 1) as usize;
            let ty1 = ty1.max(0) as usize;

            for x in 0..w {
                let txf = x as f32 / tile_w as f32 - 0.5;
                let tx1 = txf.floor() as isize;
                let xa = txf - tx1 as f32;
                let tx2 = (tx1 + 1).min(tiles_x as isize - 1) as usize;
                let tx1 = tx1.max(0) as usize;

                let v = plane[y * w + x] as usize;
                let lut = |tx: usize, ty: usize| luts[ty * tiles_x + tx][v] as f32;
                let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
                let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
                let res = top * (1.0 - ya) + bottom * ya;
                out[y * w + x] = res.round().clamp(0.0, 255.0) as u8;
            }
        }
        out
    }
}

/// Clip the histogram, hand the excess back evenly, and integrate into a
/// lookup table. A tile holding a single value maps to itself.
fn tile_lut(hist: &mut [usize; BINS], clip: usize, tile_area: usize) -> [u8; BINS] {
    let mut identity = [0u8; BINS];
    for (i, v) in identity.iter_mut().enumerate() {
        *v = i as u8;
    }
    if hist.iter().filter(|&&c| c > 0).count() <= 1 {
        return identity;
    }

    if clip < tile_area {
        let mut excess = 0usize;
        for count in hist.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }

        let batch = excess / BINS;
        let mut residual = excess - batch * BINS;
        for count in hist.iter_mut() {
            *count += batch;
        }
        if residual > 0 {
            let step = (BINS / residual).max(1);
            let mut i = 0;
            while i < BINS && residual > 0 {
                hist[i] += 1;
                residual -= 1;
                i += step;
            }
        }
    }

    let scale = 255.0 / tile_area as f64;
    let mut lut = [0u8; BINS];
    let mut sum = 0usize;
    for (i, count) in hist.iter().enumerate() {
        sum += count;
        lut[i] = (sum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Mirror an index into `0..n` without repeating the edge sample.
pub(crate) fn reflect101(mut i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}
