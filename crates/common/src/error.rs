//! Error types shared across Proctor crates.

use std::path::PathBuf;

/// Top-level error type for Proctor operations.
#[derive(Debug, thiserror::Error)]
pub enum ProctorError {
    #[error("Cannot open video {path}: {message}")]
    VideoOpen { path: PathBuf, message: String },

    #[error("No frames were analyzed ({decoded_frames} decoded)")]
    NoFramesAnalyzed { decoded_frames: u64 },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Inference error: {message}")]
    Inference { message: String },

    #[error("Annotation error: {message}")]
    Annotations { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ProctorError.
pub type ProctorResult<T> = Result<T, ProctorError>;

impl ProctorError {
    pub fn video_open(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::VideoOpen {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference {
            message: msg.into(),
        }
    }

    pub fn annotations(msg: impl Into<String>) -> Self {
        Self::Annotations {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error describes bad input rather than a failure while
    /// processing otherwise valid input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::VideoOpen { .. } | Self::NoFramesAnalyzed { .. } | Self::FileNotFound { .. }
        )
    }
}
