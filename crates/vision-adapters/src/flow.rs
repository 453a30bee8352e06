//! Dense Lucas–Kanade optical flow.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use proctor_common::error::{ProctorError, ProctorResult};
use proctor_vision_core::{MotionField, OpticalFlowEstimator};

/// Sobel kernels sum to 8 across the differencing axis.
const SOBEL_NORMALIZATION: f64 = 8.0;

/// Structure tensors with a determinant below this are treated as flat.
const MIN_DETERMINANT: f64 = 1e-6;

/// Per-pixel least-squares flow over a square window.
#[derive(Debug, Clone, Copy)]
pub struct LucasKanadeFlow {
    /// Window half-width. The window is `2 * radius + 1` pixels square,
    /// clipped at the image border.
    pub window_radius: u32,
}

impl Default for LucasKanadeFlow {
    fn default() -> Self {
        Self { window_radius: 7 }
    }
}

impl OpticalFlowEstimator for LucasKanadeFlow {
    fn estimate(&self, previous: &GrayImage, current: &GrayImage) -> ProctorResult<MotionField> {
        if previous.dimensions() != current.dimensions() {
            return Err(ProctorError::processing(format!(
                "optical flow needs equal frame sizes, got {:?} and {:?}",
                previous.dimensions(),
                current.dimensions()
            )));
        }
        let (width, height) = previous.dimensions();
        if width == 0 || height == 0 {
            return Ok(MotionField::zeros(width, height));
        }

        let gx = horizontal_sobel(previous);
        let gy = vertical_sobel(previous);

        let n = width as usize * height as usize;
        let mut xx = Vec::with_capacity(n);
        let mut yy = Vec::with_capacity(n);
        let mut xy = Vec::with_capacity(n);
        let mut xt = Vec::with_capacity(n);
        let mut yt = Vec::with_capacity(n);
        for y in 0..height {
            for x in 0..width {
                let ix = f64::from(gx.get_pixel(x, y)[0]) / SOBEL_NORMALIZATION;
                let iy = f64::from(gy.get_pixel(x, y)[0]) / SOBEL_NORMALIZATION;
                let it = f64::from(current.get_pixel(x, y)[0])
                    - f64::from(previous.get_pixel(x, y)[0]);
                xx.push(ix * ix);
                yy.push(iy * iy);
                xy.push(ix * iy);
                xt.push(ix * it);
                yt.push(iy * it);
            }
        }

        let sxx = SummedArea::new(&xx, width, height);
        let syy = SummedArea::new(&yy, width, height);
        let sxy = SummedArea::new(&xy, width, height);
        let sxt = SummedArea::new(&xt, width, height);
        let syt = SummedArea::new(&yt, width, height);

        let r = self.window_radius;
        let mut vectors = Vec::with_capacity(n);
        for y in 0..height {
            let (y0, y1) = (y.saturating_sub(r), (y + r + 1).min(height));
            for x in 0..width {
                let (x0, x1) = (x.saturating_sub(r), (x + r + 1).min(width));
                let a = sxx.sum(x0, y0, x1, y1);
                let b = sxy.sum(x0, y0, x1, y1);
                let c = syy.sum(x0, y0, x1, y1);
                let p = sxt.sum(x0, y0, x1, y1);
                let q = syt.sum(x0, y0, x1, y1);

                let det = a * c - b * b;
                if det.abs() < MIN_DETERMINANT {
                    vectors.push((0.0, 0.0));
                    continue;
                }
                let u = (-c * p + b * q) / det;
                let v = (b * p - a * q) / det;
                vectors.push((u as f32, v as f32));
            }
        }

        MotionField::new(width, height, vectors)
            .ok_or_else(|| ProctorError::processing("optical flow produced a malformed field"))
    }
}

/// Summed-area table over a row-major grid, with a zero guard row and column.
struct SummedArea {
    table: Vec<f64>,
    stride: usize,
}

impl SummedArea {
    fn new(values: &[f64], width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        let stride = w + 1;
        let mut table = vec![0.0; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0.0;
            for x in 0..w {
                row += values[y * w + x];
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row;
            }
        }
        Self { table, stride }
    }

    /// Sum over `[x0, x1) x [y0, y1)`.
    fn sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> f64 {
        let at = |x: u32, y: u32| self.table[y as usize * self.stride + x as usize];
        at(x1, y1) - at(x0, y1) - at(x1, y0) + at(x0, y0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blob(width: u32, height: u32, cx: f64, cy: f64) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
            Luma([(20.0 + 200.0 * (-d2 / 18.0).exp()).round() as u8])
        })
    }

    #[test]
    fn test_identical_frames_have_no_motion() {
        let frame = blob(32, 32, 16.0, 16.0);
        let field = LucasKanadeFlow::default().estimate(&frame, &frame).unwrap();
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(field.magnitude(x, y), Some(0.0));
            }
        }
    }

    #[test]
    fn test_shifted_blob_moves_right() {
        let previous = blob(32, 32, 15.0, 16.0);
        let current = blob(32, 32, 16.0, 16.0);
        let field = LucasKanadeFlow::default().estimate(&previous, &current).unwrap();

        let (u, v) = field.vector(15, 16).unwrap();
        assert!(u > 0.3 && u < 1.7, "u = {u}");
        assert!(v.abs() < 0.3, "v = {v}");
    }

    #[test]
    fn test_mismatched_sizes_are_rejected() {
        let err = LucasKanadeFlow::default()
            .estimate(&GrayImage::new(8, 8), &GrayImage::new(8, 9))
            .unwrap_err();
        assert!(matches!(err, ProctorError::Processing { .. }));
    }

    #[test]
    fn test_summed_area_window_sum() {
        let values: Vec<f64> = (0..12).map(f64::from).collect();
        let table = SummedArea::new(&values, 4, 3);
        assert_eq!(table.sum(0, 0, 4, 3), 66.0);
        assert_eq!(table.sum(1, 1, 3, 3), 5.0 + 6.0 + 9.0 + 10.0);
        assert_eq!(table.sum(2, 2, 2, 3), 0.0);
    }
}
