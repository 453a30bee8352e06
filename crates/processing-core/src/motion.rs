//! Out-of-frame hand activity ("airspace") from motion at the frame edges.

use image::GrayImage;

use proctor_common::error::ProctorResult;
use proctor_vision_core::{MotionField, OpticalFlowEstimator};

/// Width of the left and right bands, in columns.
pub const EDGE_BAND_WIDTH: u32 = 40;

/// Combined edge motion above which a frame counts as hand activity.
pub const EDGE_MOTION_THRESHOLD: f64 = 2.5;

/// Mean motion magnitude over the left band plus the same over the right
/// band. Frames narrower than a band use the whole width for both. An empty
/// field scores 0.
pub fn edge_motion(field: &MotionField) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let width = field.width();
    let band = EDGE_BAND_WIDTH.min(width);
    band_mean(field, 0..band) + band_mean(field, width - band..width)
}

fn band_mean(field: &MotionField, columns: std::ops::Range<u32>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for y in 0..field.height() {
        for x in columns.clone() {
            if let Some(m) = field.magnitude(x, y) {
                sum += m;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Tracks the previous sampled frame and scores motion against it.
#[derive(Debug, Default)]
pub struct EdgeMotionDetector {
    previous: Option<GrayImage>,
}

impl EdgeMotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `current` against the previous sampled frame, then remember it.
    ///
    /// Returns `None` for the first frame and after a resolution change.
    pub fn observe(
        &mut self,
        estimator: &dyn OpticalFlowEstimator,
        current: GrayImage,
    ) -> ProctorResult<Option<f64>> {
        let score = match self.previous.as_ref() {
            Some(previous) if previous.dimensions() == current.dimensions() => {
                let field = estimator.estimate(previous, &current)?;
                Some(edge_motion(&field))
            }
            Some(previous) => {
                tracing::debug!(
                    from = ?previous.dimensions(),
                    to = ?current.dimensions(),
                    "Frame size changed, skipping motion for this frame"
                );
                None
            }
            None => None,
        };
        self.previous = Some(current);
        Ok(score)
    }

    pub fn is_hand_activity(score: Option<f64>) -> bool {
        score.is_some_and(|s| s > EDGE_MOTION_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn field_with_columns(width: u32, height: u32, magnitude: impl Fn(u32) -> f32) -> MotionField {
        let vectors = (0..height)
            .flat_map(|_| (0..width).map(|x| (magnitude(x), 0.0)))
            .collect();
        MotionField::new(width, height, vectors).unwrap()
    }

    #[test]
    fn test_edge_motion_sums_band_means() {
        let field = field_with_columns(100, 4, |x| {
            if x < 40 {
                1.0
            } else if x >= 60 {
                2.0
            } else {
                50.0
            }
        });
        assert!((edge_motion(&field) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_frame_uses_whole_width_twice() {
        let field = field_with_columns(10, 2, |_| 1.5);
        assert!((edge_motion(&field) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_field_scores_zero() {
        assert_eq!(edge_motion(&MotionField::zeros(0, 0)), 0.0);
    }

    struct ConstantFlow {
        calls: Cell<u32>,
        magnitude: f32,
    }

    impl OpticalFlowEstimator for ConstantFlow {
        fn estimate(&self, previous: &GrayImage, _current: &GrayImage) -> ProctorResult<MotionField> {
            self.calls.set(self.calls.get() + 1);
            let (w, h) = previous.dimensions();
            Ok(MotionField::new(w, h, vec![(self.magnitude, 0.0); (w * h) as usize]).unwrap())
        }
    }

    #[test]
    fn test_first_frame_has_no_score() {
        let flow = ConstantFlow {
            calls: Cell::new(0),
            magnitude: 2.0,
        };
        let mut detector = EdgeMotionDetector::new();

        let first = detector.observe(&flow, GrayImage::new(50, 10)).unwrap();
        assert_eq!(first, None);
        assert_eq!(flow.calls.get(), 0);

        let second = detector.observe(&flow, GrayImage::new(50, 10)).unwrap();
        assert_eq!(second, Some(4.0));
        assert!(EdgeMotionDetector::is_hand_activity(second));
        assert!(!EdgeMotionDetector::is_hand_activity(first));
    }

    #[test]
    fn test_resolution_change_skips_one_frame() {
        let flow = ConstantFlow {
            calls: Cell::new(0),
            magnitude: 1.0,
        };
        let mut detector = EdgeMotionDetector::new();
        detector.observe(&flow, GrayImage::new(50, 10)).unwrap();
        assert_eq!(detector.observe(&flow, GrayImage::new(60, 10)).unwrap(), None);
        assert_eq!(detector.observe(&flow, GrayImage::new(60, 10)).unwrap(), Some(2.0));
        assert_eq!(flow.calls.get(), 1);
    }
}
