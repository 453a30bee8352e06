//! Application configuration.
//!
//! Configuration is layered once at startup and then treated as immutable:
//! built-in defaults, an optional JSON file, `PROCTOR_*` environment
//! variables, and finally explicit command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProctorError, ProctorResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis thresholds and sampling policy.
    pub analysis: AnalysisConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Tunable analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Confidence floor handed to the object detector.
    pub conf_threshold: f32,

    /// Absolute yaw above which a frame counts as looking away.
    pub gaze_threshold_x: f64,

    /// Absolute pitch above which a frame counts as looking away.
    pub gaze_threshold_y: f64,

    /// Mouth openness ratio above which a frame counts as talking.
    pub mouth_open_threshold: f64,

    /// Analyze every Nth decoded frame.
    pub sample_every: u32,

    /// Accepted for compatibility; no rule reads it yet.
    pub face_mismatch_threshold: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "proctor=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.25,
            gaze_threshold_x: 10.0,
            gaze_threshold_y: 8.0,
            mouth_open_threshold: 0.3,
            sample_every: 5,
            face_mismatch_threshold: 0.2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Explicit per-invocation overrides (usually from CLI flags).
#[derive(Debug, Clone, Default)]
pub struct AnalysisOverrides {
    pub conf_threshold: Option<f32>,
    pub gaze_threshold_x: Option<f64>,
    pub gaze_threshold_y: Option<f64>,
    pub mouth_open_threshold: Option<f64>,
    pub sample_every: Option<u32>,
    pub face_mismatch_threshold: Option<f64>,
}

pub const ENV_CONF_THRESHOLD: &str = "PROCTOR_CONF_THRESHOLD";
pub const ENV_GAZE_THRESHOLD_X: &str = "PROCTOR_GAZE_THRESHOLD_X";
pub const ENV_GAZE_THRESHOLD_Y: &str = "PROCTOR_GAZE_THRESHOLD_Y";
pub const ENV_MOUTH_THRESHOLD: &str = "PROCTOR_MOUTH_THRESHOLD";
pub const ENV_SAMPLE_EVERY: &str = "PROCTOR_SAMPLE_EVERY";
pub const ENV_FACE_MISMATCH_THRESHOLD: &str = "PROCTOR_FACE_MISMATCH_THRESHOLD";

impl AnalysisConfig {
    /// Apply `PROCTOR_*` overrides read through `lookup`.
    ///
    /// A variable that is set but does not parse is an error rather than
    /// being silently ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ProctorResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_env(&lookup, ENV_CONF_THRESHOLD)? {
            self.conf_threshold = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_GAZE_THRESHOLD_X)? {
            self.gaze_threshold_x = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_GAZE_THRESHOLD_Y)? {
            self.gaze_threshold_y = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_MOUTH_THRESHOLD)? {
            self.mouth_open_threshold = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_SAMPLE_EVERY)? {
            self.sample_every = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_FACE_MISMATCH_THRESHOLD)? {
            self.face_mismatch_threshold = v;
        }
        Ok(())
    }

    /// Apply explicit overrides on top of the current values.
    pub fn apply_overrides(&mut self, overrides: &AnalysisOverrides) {
        if let Some(v) = overrides.conf_threshold {
            self.conf_threshold = v;
        }
        if let Some(v) = overrides.gaze_threshold_x {
            self.gaze_threshold_x = v;
        }
        if let Some(v) = overrides.gaze_threshold_y {
            self.gaze_threshold_y = v;
        }
        if let Some(v) = overrides.mouth_open_threshold {
            self.mouth_open_threshold = v;
        }
        if let Some(v) = overrides.sample_every {
            self.sample_every = v;
        }
        if let Some(v) = overrides.face_mismatch_threshold {
            self.face_mismatch_threshold = v;
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> ProctorResult<()> {
        if self.sample_every == 0 {
            return Err(ProctorError::config("sample_every must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.conf_threshold) {
            return Err(ProctorError::config(format!(
                "conf_threshold must be within [0, 1], got {}",
                self.conf_threshold
            )));
        }
        let thresholds = [
            ("gaze_threshold_x", self.gaze_threshold_x),
            ("gaze_threshold_y", self.gaze_threshold_y),
            ("mouth_open_threshold", self.mouth_open_threshold),
            ("face_mismatch_threshold", self.face_mismatch_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ProctorError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> ProctorResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ProctorError::config(format!("{key}={raw:?} is invalid: {e}"))),
    }
}

impl AppConfig {
    /// Load config from an explicit file. Missing keys take default values.
    pub fn load_from(path: &Path) -> ProctorResult<Self> {
        if !path.exists() {
            return Err(ProctorError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ProctorError::config(format!("Failed to parse config at {}: {e}", path.display()))
        })
    }

    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Build the effective configuration for one invocation.
    ///
    /// `explicit` replaces the standard config file location when given.
    pub fn resolve(
        explicit: Option<&Path>,
        overrides: &AnalysisOverrides,
    ) -> ProctorResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from(path)?,
            None => Self::load(),
        };
        config.analysis.apply_env(|key| std::env::var(key).ok())?;
        config.analysis.apply_overrides(overrides);
        config.analysis.validate()?;
        Ok(config)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("proctor").join("config.json")
}
