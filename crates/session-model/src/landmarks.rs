//! Facial landmark contracts.
//!
//! The landmark tracker returns the refined face mesh: 468 surface points
//! followed by 10 iris points. Coordinates are normalized to the frame
//! (`x` across, `y` down) and `z` is relative depth.

use serde::{Deserialize, Serialize};

/// Number of points in a refined (iris-enabled) face mesh.
pub const REFINED_MESH_LEN: usize = 478;

/// A single landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Landmark {
    /// Normalized X coordinate [0.0, 1.0].
    pub x: f64,
    /// Normalized Y coordinate [0.0, 1.0].
    pub y: f64,
    /// Relative depth.
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Pixel position, truncated toward zero.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i64, i64) {
        (
            (self.x * width as f64) as i64,
            (self.y * height as f64) as i64,
        )
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f64; 3] {
    fn from(l: Landmark) -> Self {
        [l.x, l.y, l.z]
    }
}

/// A complete refined face mesh for one face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    /// Wrap a tracker result, rejecting meshes without iris refinement.
    pub fn new(points: Vec<Landmark>) -> Result<Self, ModelError> {
        if points.len() < REFINED_MESH_LEN {
            return Err(ModelError::IncompleteMesh {
                expected: REFINED_MESH_LEN,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Landmark at a mesh index.
    ///
    /// Every index below [`REFINED_MESH_LEN`] is present by construction.
    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl TryFrom<Vec<Landmark>> for FaceLandmarks {
    type Error = ModelError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<FaceLandmarks> for Vec<Landmark> {
    fn from(face: FaceLandmarks) -> Self {
        face.points
    }
}

/// Errors raised when constructing model values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Face mesh has {actual} points, expected at least {expected}")]
    IncompleteMesh { expected: usize, actual: usize },
}
