//! Fixed rule table mapping the summary to events.

use proctor_session_model::{EventKind, EventLevel, EyeIntent, ProctorEvent, Ratios, Summary};

/// A threshold on one summary ratio. Fires when the ratio is strictly above
/// the threshold.
#[derive(Debug, Clone, Copy)]
pub struct RatioRule {
    pub kind: EventKind,
    pub level: EventLevel,
    pub message: &'static str,
    pub threshold: f64,
    pub ratio: fn(&Ratios) -> f64,
}

/// Ratio rules, in emission order.
pub const RATIO_RULES: [RatioRule; 4] = [
    RatioRule {
        kind: EventKind::ProctorPhone,
        level: EventLevel::Critical,
        message: "Phone detected",
        threshold: 0.05,
        ratio: |r| r.phone,
    },
    RatioRule {
        kind: EventKind::ProctorMultiplePeople,
        level: EventLevel::Critical,
        message: "Multiple people detected",
        threshold: 0.1,
        ratio: |r| r.multi_face,
    },
    RatioRule {
        kind: EventKind::ProctorReflection,
        level: EventLevel::Warning,
        message: "Suspicious reflections detected",
        threshold: 0.05,
        ratio: |r| r.reflection,
    },
    RatioRule {
        kind: EventKind::ProctorAirspace,
        level: EventLevel::Warning,
        message: "Out-of-frame hand activity",
        threshold: 0.1,
        ratio: |r| r.hand_motion,
    },
];

/// Intents worth surfacing to a reviewer.
pub fn is_flagged_intent(intent: EyeIntent) -> bool {
    matches!(
        intent,
        EyeIntent::MemorizedAnswer | EyeIntent::ReadingOrSearching
    )
}

/// Evaluate every rule in order. Each event embeds a copy of the summary.
pub fn evaluate(summary: &Summary) -> Vec<ProctorEvent> {
    let mut events: Vec<ProctorEvent> = RATIO_RULES
        .iter()
        .filter(|rule| (rule.ratio)(&summary.ratios) > rule.threshold)
        .map(|rule| ProctorEvent::new(rule.kind, rule.level, rule.message, summary.clone()))
        .collect();

    if is_flagged_intent(summary.eye_intent) {
        events.push(ProctorEvent::new(
            EventKind::ProctorEyeIntent,
            EventLevel::Info,
            format!("Eye intent: {}", summary.eye_intent),
            summary.clone(),
        ));
    }
    events
}
