use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};

/// Dense 8-bit, 3-channel image stored in blue-green-red order.
///
/// Every pipeline stage reads and writes this layout; the swap to
/// red-green-blue happens only when handing pixels to an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrImage {
    /// Wrap an interleaved BGR buffer. Returns `None` if the length does not
    /// match `width * height * 3`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// An image filled with a single BGR colour.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let data = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self { width, height, data }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Decoded images of any colour type are flattened to 8-bit RGB (alpha
    /// dropped, gray expanded) and reordered to BGR.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        Self::from_rgb(&img.to_rgb8())
    }

    pub fn from_rgb(rgb: &RgbImage) -> Self {
        let mut data = rgb.as_raw().clone();
        swap_red_blue(&mut data);
        Self {
            width: rgb.width(),
            height: rgb.height(),
            data,
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        let mut data = self.data.clone();
        swap_red_blue(&mut data);
        // Length is an invariant of the type.
        ImageBuffer::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// View the BGR bytes as an `image` buffer for channel-agnostic library
    /// routines (resampling). The pixel type says RGB but holds B,G,R.
    pub(crate) fn as_channel_agnostic(&self) -> Option<ImageBuffer<Rgb<u8>, &[u8]>> {
        ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
    }

    pub(crate) fn from_channel_agnostic(buf: ImageBuffer<Rgb<u8>, Vec<u8>>) -> Self {
        let (width, height) = buf.dimensions();
        Self {
            width,
            height,
            data: buf.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(3)
    }
}

fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}
