//! Session-level summary: the read-only result of one analysis run.

use serde::{Deserialize, Serialize};

/// Categorical reading of sustained gaze and blink dynamics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeIntent {
    /// Fewer samples than the classifier needs.
    InsufficientData,
    /// Fixed gaze with almost no blinking.
    MemorizedAnswer,
    /// Wandering gaze with frequent blinking.
    Confusion,
    /// Steady head with few blinks.
    Confidence,
    /// Wandering gaze without the blink signature of confusion.
    ReadingOrSearching,
    /// Nothing distinctive.
    Neutral,
}

impl EyeIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "insufficient_data",
            Self::MemorizedAnswer => "memorized_answer",
            Self::Confusion => "confusion",
            Self::Confidence => "confidence",
            Self::ReadingOrSearching => "reading_or_searching",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for EyeIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-signal trigger ratios, each `counter / processed frames`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    pub looking_away: f64,
    pub talking: f64,
    pub phone: f64,
    pub multi_face: f64,
    pub hand_motion: f64,
    pub reflection: f64,
}

impl Ratios {
    /// All six ratios in wire order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.looking_away,
            self.talking,
            self.phone,
            self.multi_face,
            self.hand_motion,
            self.reflection,
        ]
    }
}

/// The session summary carried by the verdict and by every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of sampled (analyzed) frames.
    pub frames: u64,
    pub eye_intent: EyeIntent,
    /// Distinct forbidden object labels, sorted.
    pub forbidden_objects: Vec<String>,
    pub ratios: Ratios,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_intent_labels() {
        for intent in [
            EyeIntent::InsufficientData,
            EyeIntent::MemorizedAnswer,
            EyeIntent::Confusion,
            EyeIntent::Confidence,
            EyeIntent::ReadingOrSearching,
            EyeIntent::Neutral,
        ] {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.as_str()));
        }
    }

    #[test]
    fn test_summary_wire_shape() {
        let summary = Summary {
            frames: 4,
            eye_intent: EyeIntent::Neutral,
            forbidden_objects: vec!["book".to_string()],
            ratios: Ratios {
                phone: 0.25,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"frames":4,"eye_intent":"neutral","forbidden_objects":["book"],"#,
                r#""ratios":{"looking_away":0.0,"talking":0.0,"phone":0.25,"#,
                r#""multi_face":0.0,"hand_motion":0.0,"reflection":0.0}}"#
            )
        );
    }
}
