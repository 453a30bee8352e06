//! Abstract interfaces for the external vision collaborators.

use image::{GrayImage, RgbImage};

use proctor_common::error::ProctorResult;
use proctor_session_model::{Detection, FaceLandmarks};

use crate::frame::{Frame, MotionField};
use crate::release::Release;

/// Sequential frame reader. Opening happens in the implementor's constructor,
/// so a source that exists has already been opened successfully.
pub trait VideoSource: Release {
    /// Read the next frame. `Ok(None)` marks end of stream, which includes
    /// a frame the decoder could not produce.
    fn read_frame(&mut self) -> ProctorResult<Option<RgbImage>>;
}

/// Object detector.
pub trait ObjectDetector {
    /// Detect objects in a frame, keeping only instances whose confidence is
    /// strictly above `min_confidence`.
    fn detect(&mut self, frame: &Frame, min_confidence: f32) -> ProctorResult<Vec<Detection>>;
}

/// Facial landmark tracker (single face).
pub trait LandmarkTracker: Release {
    /// Track the face in a frame. `Ok(None)` when no face is found.
    fn track(&mut self, frame: &Frame) -> ProctorResult<Option<FaceLandmarks>>;
}

/// Dense optical flow between two grayscale frames of equal size.
pub trait OpticalFlowEstimator {
    fn estimate(&self, previous: &GrayImage, current: &GrayImage) -> ProctorResult<MotionField>;
}

/// A face embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEmbedding(pub Vec<f32>);

impl FaceEmbedding {
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }
}

/// Computes an embedding for a reference face image.
pub trait ReferenceFaceMatcher {
    /// `Ok(None)` when the image contains no usable face.
    fn embed(&self, reference: &RgbImage) -> ProctorResult<Option<FaceEmbedding>>;
}
