//! Session counters and the end-of-stream summary.

use std::collections::BTreeSet;

use proctor_session_model::{EyeIntent, Ratios, Summary};

use crate::objects::ObjectTally;

/// Everything one sampled frame contributes to the counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSignals {
    pub objects: ObjectTally,
    pub looking_away: bool,
    pub talking: bool,
    pub reflection: bool,
    pub hand_motion: bool,
}

/// Running counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatistics {
    pub processed_frames: u64,
    pub looking_away: u64,
    pub talking: u64,
    /// Phone instances, not phone frames.
    pub phone: u64,
    pub multi_face: u64,
    pub reflection: u64,
    pub hand_motion: u64,
    pub forbidden_objects: BTreeSet<&'static str>,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sampled frame into the counters.
    pub fn record(&mut self, signals: &FrameSignals) {
        self.processed_frames += 1;
        self.phone += u64::from(signals.objects.phones);
        if signals.objects.has_multiple_people() {
            self.multi_face += 1;
        }
        self.forbidden_objects
            .extend(signals.objects.forbidden.iter().map(|class| class.label()));
        self.looking_away += u64::from(signals.looking_away);
        self.talking += u64::from(signals.talking);
        self.reflection += u64::from(signals.reflection);
        self.hand_motion += u64::from(signals.hand_motion);
    }

    /// Counter over processed frames.
    ///
    /// Total over all inputs: 0 when nothing was processed, and capped at 1
    /// since the per-instance phone counter may exceed the frame count.
    pub fn ratio(&self, counter: u64) -> f64 {
        if self.processed_frames == 0 {
            return 0.0;
        }
        (counter as f64 / self.processed_frames as f64).min(1.0)
    }

    pub fn ratios(&self) -> Ratios {
        Ratios {
            looking_away: self.ratio(self.looking_away),
            talking: self.ratio(self.talking),
            phone: self.ratio(self.phone),
            multi_face: self.ratio(self.multi_face),
            hand_motion: self.ratio(self.hand_motion),
            reflection: self.ratio(self.reflection),
        }
    }

    pub fn summarize(&self, eye_intent: EyeIntent) -> Summary {
        Summary {
            frames: self.processed_frames,
            eye_intent,
            forbidden_objects: self
                .forbidden_objects
                .iter()
                .map(|label| label.to_string())
                .collect(),
            ratios: self.ratios(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_session_model::Detection;
    use proptest::prelude::*;

    fn frame(detections: &[Detection]) -> FrameSignals {
        FrameSignals {
            objects: ObjectTally::from_detections(detections),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_frames_yield_zero_ratios() {
        let stats = SessionStatistics::new();
        assert_eq!(stats.ratios(), Ratios::default());
        let summary = stats.summarize(EyeIntent::InsufficientData);
        assert_eq!(summary.frames, 0);
    }

    #[test]
    fn test_book_in_five_frames_is_listed_once() {
        let mut stats = SessionStatistics::new();
        for _ in 0..5 {
            stats.record(&frame(&[Detection::new(73, 0.8)]));
        }
        stats.record(&frame(&[Detection::new(62, 0.8), Detection::new(63, 0.8)]));
        let summary = stats.summarize(EyeIntent::Neutral);
        assert_eq!(summary.forbidden_objects, vec!["book", "laptop", "tv"]);
        assert_eq!(summary.frames, 6);
    }

    #[test]
    fn test_ratio_is_counter_over_frames() {
        let mut stats = SessionStatistics::new();
        stats.record(&FrameSignals {
            looking_away: true,
            talking: true,
            ..Default::default()
        });
        stats.record(&FrameSignals::default());
        stats.record(&FrameSignals {
            looking_away: true,
            hand_motion: true,
            ..Default::default()
        });
        stats.record(&frame(&[Detection::new(0, 0.9), Detection::new(0, 0.9)]));

        let ratios = stats.ratios();
        assert_eq!(ratios.looking_away, 0.5);
        assert_eq!(ratios.talking, 0.25);
        assert_eq!(ratios.hand_motion, 0.25);
        assert_eq!(ratios.multi_face, 0.25);
        assert_eq!(ratios.phone, 0.0);
    }

    #[test]
    fn test_phone_ratio_is_capped() {
        let mut stats = SessionStatistics::new();
        stats.record(&frame(&[
            Detection::new(67, 0.9),
            Detection::new(67, 0.9),
            Detection::new(67, 0.9),
        ]));
        assert_eq!(stats.phone, 3);
        assert_eq!(stats.ratios().phone, 1.0);
    }

    proptest! {
        #[test]
        fn ratios_stay_in_unit_interval(
            frames in prop::collection::vec(
                (
                    prop::collection::vec((0u32..80, 0.0f32..1.0), 0..6),
                    any::<bool>(),
                    any::<bool>(),
                    any::<bool>(),
                    any::<bool>(),
                ),
                0..40,
            )
        ) {
            let mut stats = SessionStatistics::new();
            for (dets, away, talking, reflection, hand) in &frames {
                let detections: Vec<Detection> =
                    dets.iter().map(|&(id, c)| Detection::new(id, c)).collect();
                stats.record(&FrameSignals {
                    objects: ObjectTally::from_detections(&detections),
                    looking_away: *away,
                    talking: *talking,
                    reflection: *reflection,
                    hand_motion: *hand,
                });
            }
            prop_assert_eq!(stats.processed_frames, frames.len() as u64);
            for r in stats.ratios().values() {
                prop_assert!((0.0..=1.0).contains(&r));
            }
            let summary = stats.summarize(EyeIntent::Neutral);
            let mut sorted = summary.forbidden_objects.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted, summary.forbidden_objects);
        }
    }
}
