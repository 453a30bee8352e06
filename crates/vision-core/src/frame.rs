//! Frame and motion-field types passed between capabilities.

use image::{GrayImage, Luma, RgbImage};

/// Rec.601 luma weights in 14-bit fixed point (0.299, 0.587, 0.114).
const LUMA_WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const LUMA_SHIFT: u32 = 14;

/// A decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based decode position, counted by the session driver.
    pub index: u64,
    /// Pixel data in RGB order.
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Rec.601 luma conversion used for optical flow.
    pub fn to_gray(&self) -> GrayImage {
        let (width, height) = self.image.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let [r, g, b] = self.image.get_pixel(x, y).0;
            let weighted = LUMA_WEIGHTS[0] * u32::from(r)
                + LUMA_WEIGHTS[1] * u32::from(g)
                + LUMA_WEIGHTS[2] * u32::from(b);
            // The weights sum to 1 << LUMA_SHIFT, so the result fits a u8.
            Luma([((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
        })
    }
}

/// Dense per-pixel motion between two grayscale frames.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionField {
    width: u32,
    height: u32,
    /// Row-major `(dx, dy)` displacement per pixel.
    vectors: Vec<(f32, f32)>,
}

impl MotionField {
    /// Build a field, checking that the vector count matches the dimensions.
    pub fn new(width: u32, height: u32, vectors: Vec<(f32, f32)>) -> Option<Self> {
        if vectors.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            vectors,
        })
    }

    /// A field with no motion anywhere.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            vectors: vec![(0.0, 0.0); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Displacement at `(x, y)`, if inside the field.
    pub fn vector(&self, x: u32, y: u32) -> Option<(f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.vectors[y as usize * self.width as usize + x as usize])
    }

    /// Euclidean displacement length at `(x, y)`.
    pub fn magnitude(&self, x: u32, y: u32) -> Option<f64> {
        self.vector(x, y)
            .map(|(dx, dy)| (dx as f64).hypot(dy as f64))
    }
}
