//! Rule-engine events.
//!
//! Each event carries the full session summary as payload for downstream
//! consumers. Events are created once and never mutated.

use serde::{Deserialize, Serialize};

use crate::summary::Summary;

/// Event type identifiers as consumed by the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProctorPhone,
    ProctorMultiplePeople,
    ProctorReflection,
    /// Hand activity at the horizontal frame edges.
    ProctorAirspace,
    ProctorEyeIntent,
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Warning,
    Critical,
}

/// Event body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub level: EventLevel,
    pub message: String,
    pub summary: Summary,
}

/// A single rule-engine finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctorEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: EventPayload,
}

impl ProctorEvent {
    pub fn new(
        kind: EventKind,
        level: EventLevel,
        message: impl Into<String>,
        summary: Summary,
    ) -> Self {
        Self {
            kind,
            payload: EventPayload {
                level,
                message: message.into(),
                summary,
            },
        }
    }

    pub fn level(&self) -> EventLevel {
        self.payload.level
    }

    pub fn message(&self) -> &str {
        &self.payload.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{EyeIntent, Ratios};

    #[test]
    fn test_event_json_format() {
        let summary = Summary {
            frames: 10,
            eye_intent: EyeIntent::Confidence,
            forbidden_objects: vec![],
            ratios: Ratios::default(),
        };
        let event = ProctorEvent::new(
            EventKind::ProctorAirspace,
            EventLevel::Warning,
            "Out-of-frame hand activity",
            summary,
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "proctor_airspace");
        assert_eq!(value["payload"]["level"], "warning");
        assert_eq!(value["payload"]["message"], "Out-of-frame hand activity");
        assert_eq!(value["payload"]["summary"]["frames"], 10);
        assert_eq!(value["payload"]["summary"]["eye_intent"], "confidence");
    }

    #[test]
    fn test_levels_order_by_severity() {
        assert!(EventLevel::Critical > EventLevel::Warning);
        assert!(EventLevel::Warning > EventLevel::Info);
    }
}
