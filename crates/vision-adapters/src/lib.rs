//! Proctor vision adapters
//!
//! Concrete implementations of the `proctor-vision-core` capabilities:
//! - **Frame directories:** pre-extracted image sequences
//! - **ffmpeg:** video files streamed frame by frame from an ffmpeg child process
//! - **Annotation replay:** detector and landmark results recorded as JSONL
//! - **Optical flow:** dense Lucas–Kanade

pub mod annotations;
pub mod ffmpeg;
pub mod flow;
pub mod frames_dir;

pub use annotations::*;
pub use ffmpeg::*;
pub use flow::*;
pub use frames_dir::*;

use std::path::Path;

use proctor_common::error::ProctorResult;
use proctor_vision_core::VideoSource;

/// Open `path` as a video source: a directory is read as a frame sequence,
/// anything else is decoded with ffmpeg.
pub fn open_video_source(path: &Path) -> ProctorResult<Box<dyn VideoSource>> {
    if path.is_dir() {
        Ok(Box::new(FrameDirectorySource::open(path)?))
    } else {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}
