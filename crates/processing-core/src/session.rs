//! The session driver: one pass over a video, one report.

use std::num::NonZeroU32;

use image::RgbImage;

use proctor_common::config::AnalysisConfig;
use proctor_common::error::{ProctorError, ProctorResult};
use proctor_session_model::AnalysisReport;
use proctor_vision_core::{
    Frame, LandmarkTracker, ObjectDetector, OpticalFlowEstimator,
    ReferenceFaceMatcher, ReleaseGuard, VideoSource,
};

use crate::facial_cues::{gaze_x, is_blink, is_reflection, mouth_ratio};
use crate::head_pose::estimate_head_pose;
use crate::intent::classify_intent;
use crate::motion::EdgeMotionDetector;
use crate::objects::ObjectTally;
use crate::rules;
use crate::sampler::FrameSampler;
use crate::stats::{FrameSignals, SessionStatistics};
use crate::window::{GazeSample, GazeWindow};

/// Runs the full pipeline over one video source.
///
/// A driver is single-use: [`SessionDriver::run`] consumes it and releases
/// the landmark tracker when it returns.
pub struct SessionDriver {
    config: AnalysisConfig,
    sampler: FrameSampler,
    detector: Box<dyn ObjectDetector>,
    tracker: Box<dyn LandmarkTracker>,
    flow: Box<dyn OpticalFlowEstimator>,
    matcher: Option<Box<dyn ReferenceFaceMatcher>>,
    reference: Option<RgbImage>,
}

impl std::fmt::Debug for SessionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionDriver")
            .field("config", &self.config)
            .field("has_face_matcher", &self.matcher.is_some())
            .field("has_reference", &self.reference.is_some())
            .finish_non_exhaustive()
    }
}

impl SessionDriver {
    /// Build a driver. The configuration is validated here, before any frame
    /// is read.
    pub fn new(
        config: AnalysisConfig,
        detector: Box<dyn ObjectDetector>,
        tracker: Box<dyn LandmarkTracker>,
        flow: Box<dyn OpticalFlowEstimator>,
    ) -> ProctorResult<Self> {
        config.validate()?;
        let every = NonZeroU32::new(config.sample_every)
            .ok_or_else(|| ProctorError::config("sample_every must be at least 1"))?;
        Ok(Self {
            sampler: FrameSampler::new(every),
            config,
            detector,
            tracker,
            flow,
            matcher: None,
            reference: None,
        })
    }

    pub fn with_face_matcher(mut self, matcher: Box<dyn ReferenceFaceMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Reference face image for the candidate.
    pub fn with_reference(mut self, reference: RgbImage) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every sampled frame of `source` and build the report.
    ///
    /// The source and the tracker are released on every exit path. Any
    /// capability error aborts the whole session with no partial result.
    pub fn run(self, source: &mut dyn VideoSource) -> ProctorResult<AnalysisReport> {
        let Self {
            config,
            sampler,
            mut detector,
            mut tracker,
            flow,
            matcher,
            reference,
        } = self;

        let mut source = ReleaseGuard::new(source, "video source");
        let mut tracker = ReleaseGuard::new(tracker.as_mut(), "landmark tracker");

        match embed_reference(matcher.as_deref(), reference.as_ref())? {
            ReferenceOutcome::NotSupplied => {}
            ReferenceOutcome::NoMatcher => {
                tracing::warn!("Reference image supplied but no face matcher is configured; skipping it")
            }
            ReferenceOutcome::NoFace => tracing::warn!("Reference image produced no face embedding"),
            ReferenceOutcome::Embedded { dimensions } => tracing::info!(
                dimensions,
                "Reference face embedded (not compared against frames)"
            ),
        }

        tracing::info!(
            sample_every = sampler.every(),
            conf_threshold = config.conf_threshold,
            "Starting session analysis"
        );

        let mut stats = SessionStatistics::new();
        let mut window = GazeWindow::default();
        let mut motion = EdgeMotionDetector::new();
        let mut decoded: u64 = 0;

        while let Some(image) = source.read_frame()? {
            decoded += 1;
            if !sampler.should_sample(decoded) {
                continue;
            }
            let frame = Frame::new(decoded, image);

            let objects = ObjectTally::from_detections(
                &detector.detect(&frame, config.conf_threshold)?,
            );
            let mut signals = FrameSignals {
                objects,
                ..Default::default()
            };

            if let Some(face) = tracker.track(&frame)? {
                let pose = estimate_head_pose(&face, frame.width(), frame.height());
                signals.looking_away = pose.is_looking_away(&config);
                signals.talking = mouth_ratio(&face) > config.mouth_open_threshold;
                signals.reflection = is_reflection(&frame.image, &face);
                window.push(GazeSample {
                    yaw: pose.yaw,
                    pitch: pose.pitch,
                    blink: is_blink(&face),
                    gaze_x: gaze_x(&face),
                });
            }

            let score = motion.observe(flow.as_ref(), frame.to_gray())?;
            signals.hand_motion = EdgeMotionDetector::is_hand_activity(score);

            tracing::trace!(frame = frame.index, ?signals, "Frame analyzed");
            stats.record(&signals);
        }

        if stats.processed_frames == 0 {
            return Err(ProctorError::NoFramesAnalyzed {
                decoded_frames: decoded,
            });
        }

        let summary = stats.summarize(classify_intent(&window));
        let events = rules::evaluate(&summary);

        tracing::info!(
            decoded_frames = decoded,
            processed_frames = summary.frames,
            eye_intent = %summary.eye_intent,
            events = events.len(),
            "Session analysis complete"
        );

        Ok(AnalysisReport { summary, events })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceOutcome {
    NotSupplied,
    NoMatcher,
    NoFace,
    Embedded { dimensions: usize },
}

fn embed_reference(
    matcher: Option<&dyn ReferenceFaceMatcher>,
    reference: Option<&RgbImage>,
) -> ProctorResult<ReferenceOutcome> {
    let Some(reference) = reference else {
        return Ok(ReferenceOutcome::NotSupplied);
    };
    let Some(matcher) = matcher else {
        return Ok(ReferenceOutcome::NoMatcher);
    };
    Ok(match matcher.embed(reference)? {
        Some(embedding) => ReferenceOutcome::Embedded {
            dimensions: embedding.dimensions(),
        },
        None => ReferenceOutcome::NoFace,
    })
}
