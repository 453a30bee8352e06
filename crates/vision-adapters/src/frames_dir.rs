//! Image-sequence video source.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::RgbImage;

use proctor_common::error::{ProctorError, ProctorResult};
use proctor_vision_core::{Release, VideoSource};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Reads every image in a directory, in file-name order.
#[derive(Debug)]
pub struct FrameDirectorySource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
    released: bool,
}

impl FrameDirectorySource {
    pub fn open(dir: &Path) -> ProctorResult<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ProctorError::video_open(dir, e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ProctorError::video_open(dir, e.to_string()))?
                .path();
            if is_frame_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        tracing::debug!(dir = %dir.display(), frames = files.len(), "Opened frame directory");
        Ok(Self {
            dir: dir.to_path_buf(),
            pending: files.into(),
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                FRAME_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
}

impl VideoSource for FrameDirectorySource {
    fn read_frame(&mut self) -> ProctorResult<Option<RgbImage>> {
        if self.released {
            return Ok(None);
        }
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        match image::open(&path) {
            Ok(img) => Ok(Some(img.to_rgb8())),
            Err(e) => {
                // An undecodable frame ends the stream.
                tracing::warn!(path = %path.display(), "Frame could not be decoded: {}", e);
                self.pending.clear();
                Ok(None)
            }
        }
    }
}

impl Release for FrameDirectorySource {
    fn release(&mut self) {
        self.pending.clear();
        self.released = true;
    }
}
