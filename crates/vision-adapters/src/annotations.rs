//! Replay of recorded detector and landmark results.
//!
//! One JSON object per line, keyed by the 1-based decode index of the frame:
//!
//! ```text
//! # comment lines and blank lines are skipped
//! {"frame": 5, "detections": [{"class_id": 67, "confidence": 0.91}], "landmarks": [[0.5, 0.5, 0.0], ...]}
//! ```
//!
//! Frames without a line have no detections and no face.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use proctor_common::error::{ProctorError, ProctorResult};
use proctor_session_model::{Detection, FaceLandmarks};
use proctor_vision_core::{Frame, LandmarkTracker, ObjectDetector, Release};

/// Recorded results for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotation {
    pub frame: u64,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub landmarks: Option<FaceLandmarks>,
}

/// All recorded annotations for a video.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTrack {
    frames: BTreeMap<u64, FrameAnnotation>,
}

impl AnnotationTrack {
    /// Parse JSONL annotations. Errors name the offending line.
    pub fn parse(jsonl: &str) -> ProctorResult<Self> {
        let mut frames = BTreeMap::new();
        for (number, line) in jsonl.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let annotation: FrameAnnotation = serde_json::from_str(line).map_err(|e| {
                ProctorError::annotations(format!("line {}: {e}", number + 1))
            })?;
            let frame = annotation.frame;
            if frames.insert(frame, annotation).is_some() {
                return Err(ProctorError::annotations(format!(
                    "line {}: duplicate annotation for frame {frame}",
                    number + 1
                )));
            }
        }
        Ok(Self { frames })
    }

    pub fn load(path: &Path) -> ProctorResult<Self> {
        if !path.exists() {
            return Err(ProctorError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let track = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            frames = track.len(),
            "Loaded frame annotations"
        );
        Ok(track)
    }

    pub fn get(&self, frame: u64) -> Option<&FrameAnnotation> {
        self.frames.get(&frame)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Split into a detector and a tracker sharing this track.
    pub fn into_capabilities(self) -> (AnnotatedDetector, AnnotatedTracker) {
        let shared = Arc::new(self);
        (
            AnnotatedDetector {
                track: Arc::clone(&shared),
            },
            AnnotatedTracker {
                track: shared,
                released: false,
            },
        )
    }
}

/// Object detector answering from an [`AnnotationTrack`]. Detections at or
/// below the confidence floor are dropped.
#[derive(Debug, Clone)]
pub struct AnnotatedDetector {
    track: Arc<AnnotationTrack>,
}

impl ObjectDetector for AnnotatedDetector {
    fn detect(&mut self, frame: &Frame, min_confidence: f32) -> ProctorResult<Vec<Detection>> {
        Ok(self
            .track
            .get(frame.index)
            .map(|a| {
                a.detections
                    .iter()
                    .copied()
                    .filter(|d| d.confidence > min_confidence)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Landmark tracker answering from an [`AnnotationTrack`].
#[derive(Debug)]
pub struct AnnotatedTracker {
    track: Arc<AnnotationTrack>,
    released: bool,
}

impl LandmarkTracker for AnnotatedTracker {
    fn track(&mut self, frame: &Frame) -> ProctorResult<Option<FaceLandmarks>> {
        if self.released {
            return Err(ProctorError::inference("landmark tracker used after release"));
        }
        Ok(self
            .track
            .get(frame.index)
            .and_then(|a| a.landmarks.clone()))
    }
}

impl Release for AnnotatedTracker {
    fn release(&mut self) {
        self.released = true;
    }
}
