//! # proctor-processing-core
//!
//! Pure analysis for proctoring sessions.
//!
//! Responsibilities:
//! - Frame sampling
//! - Per-frame signal extraction (objects, head pose, facial cues, edge motion)
//! - The sliding gaze window and eye-intent classification
//! - Session statistics and the event rule table
//! - The session driver tying them together
//!
//! Nothing here decodes video or runs a model; those arrive as capabilities
//! from `proctor-vision-core`.

pub mod facial_cues;
pub mod head_pose;
pub mod intent;
pub mod motion;
pub mod objects;
pub mod rules;
pub mod sampler;
pub mod session;
pub mod stats;
pub mod window;

pub use session::SessionDriver;
