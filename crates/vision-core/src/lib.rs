//! Proctor vision capability contracts.
//!
//! The analysis pipeline never talks to a decoder or a model directly. It
//! consumes the opaque capabilities defined here, so concrete backends
//! (decoders, detectors, trackers, flow estimators) can be swapped without
//! touching the processing core.

pub mod capability;
pub mod frame;
pub mod release;

pub use capability::*;
pub use frame::*;
pub use release::*;
