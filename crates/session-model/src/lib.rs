//! Proctor Session Model
//!
//! Defines the data contracts shared by the analysis pipeline and its callers:
//! - **Landmarks / Detections:** what the external vision models hand back per frame
//! - **Summary:** session-level ratios, eye intent, and forbidden objects
//! - **Events:** rule-engine findings with their severity
//! - **Verdict:** the single JSON object emitted per video (success or failure)
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the frame
//! dimensions, with depth on the tracker's own relative scale.

pub mod detection;
pub mod event;
pub mod landmarks;
pub mod summary;
pub mod verdict;

pub use detection::*;
pub use event::*;
pub use landmarks::*;
pub use summary::*;
pub use verdict::*;
