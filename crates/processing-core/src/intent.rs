//! Session-level eye intent from the gaze window.

use proctor_session_model::EyeIntent;

use crate::window::GazeWindow;

/// Fewer face-present samples than this yields [`EyeIntent::InsufficientData`].
pub const MIN_INTENT_SAMPLES: usize = 10;

const MEMORIZED_MAX_GAZE_VAR: f64 = 0.0005;
const MEMORIZED_MAX_BLINK_RATE: f64 = 0.05;
const CONFUSION_MIN_GAZE_VAR: f64 = 0.005;
const CONFUSION_MIN_BLINK_RATE: f64 = 0.2;
const CONFIDENCE_MAX_YAW_VAR: f64 = 2.0;
const CONFIDENCE_MAX_BLINK_RATE: f64 = 0.1;
const READING_MIN_GAZE_VAR: f64 = 0.003;

/// Window statistics the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentFeatures {
    pub yaw_variance: f64,
    pub gaze_variance: f64,
    pub blink_rate: f64,
    pub samples: usize,
}

impl IntentFeatures {
    pub fn from_window(window: &GazeWindow) -> Self {
        let samples = window.len();
        let blinks = window.blink().filter(|&b| b).count();
        Self {
            yaw_variance: population_variance(window.yaw()),
            gaze_variance: population_variance(window.gaze_x()),
            blink_rate: if samples == 0 {
                0.0
            } else {
                blinks as f64 / samples as f64
            },
            samples,
        }
    }

    /// First matching rule wins.
    pub fn classify(&self) -> EyeIntent {
        if self.samples < MIN_INTENT_SAMPLES {
            return EyeIntent::InsufficientData;
        }
        if self.gaze_variance < MEMORIZED_MAX_GAZE_VAR && self.blink_rate < MEMORIZED_MAX_BLINK_RATE
        {
            return EyeIntent::MemorizedAnswer;
        }
        if self.gaze_variance > CONFUSION_MIN_GAZE_VAR && self.blink_rate > CONFUSION_MIN_BLINK_RATE {
            return EyeIntent::Confusion;
        }
        if self.yaw_variance < CONFIDENCE_MAX_YAW_VAR && self.blink_rate < CONFIDENCE_MAX_BLINK_RATE {
            return EyeIntent::Confidence;
        }
        if self.gaze_variance > READING_MIN_GAZE_VAR {
            return EyeIntent::ReadingOrSearching;
        }
        EyeIntent::Neutral
    }
}

/// Classify the current window contents.
pub fn classify_intent(window: &GazeWindow) -> EyeIntent {
    IntentFeatures::from_window(window).classify()
}

/// Mean squared deviation from the mean (divides by `n`). 0 for no values.
pub fn population_variance<I>(values: I) -> f64
where
    I: ExactSizeIterator<Item = f64> + Clone,
{
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
}
