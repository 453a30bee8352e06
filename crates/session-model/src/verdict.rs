//! The single JSON object emitted per analyzed video.
//!
//! A run either completes with a summary and its events, or fails with a
//! diagnostic and no summary at all. There are no partial results.

use serde::{Deserialize, Serialize};

use crate::event::ProctorEvent;
use crate::summary::Summary;

/// Successful analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: Summary,
    pub events: Vec<ProctorEvent>,
}

/// Failure output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub error: String,
    /// The error followed by its chain of causes, one per line.
    pub trace: String,
}

impl FailureReport {
    pub fn new(error: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            trace: trace.into(),
        }
    }

    /// Build a report from an error and its `source()` chain.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut trace = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str("\ncaused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            error: err.to_string(),
            trace,
        }
    }
}

/// Discriminated outcome of one invocation, converted to JSON at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verdict {
    Completed(AnalysisReport),
    Failed(FailureReport),
}

impl Verdict {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) => 0,
            Self::Failed(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl<E> From<Result<AnalysisReport, E>> for Verdict
where
    E: std::error::Error + 'static,
{
    fn from(result: Result<AnalysisReport, E>) -> Self {
        match result {
            Ok(report) => Self::Completed(report),
            Err(err) => Self::Failed(FailureReport::from_error(&err)),
        }
    }
}
