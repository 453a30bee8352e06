use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use image::{GrayImage, RgbImage};

use proctor_common::config::AnalysisConfig;
use proctor_common::error::{ProctorError, ProctorResult};
use proctor_processing_core::SessionDriver;
use proctor_session_model::{
    AnalysisReport, Detection, EventKind, EyeIntent, FaceLandmarks, Landmark, Verdict,
    REFINED_MESH_LEN,
};
use proctor_vision_core::{
    FaceEmbedding, Frame, LandmarkTracker, MotionField, ObjectDetector, OpticalFlowEstimator,
    ReferenceFaceMatcher, Release, VideoSource,
};

struct ScriptedSource {
    frames: VecDeque<RgbImage>,
    releases: Rc<Cell<u32>>,
}

impl ScriptedSource {
    fn black(count: usize, releases: Rc<Cell<u32>>) -> Self {
        Self {
            frames: (0..count).map(|_| RgbImage::new(64, 48)).collect(),
            releases,
        }
    }
}

impl Release for ScriptedSource {
    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

impl VideoSource for ScriptedSource {
    fn read_frame(&mut self) -> ProctorResult<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

#[derive(Default)]
struct ScriptedDetector {
    by_frame: HashMap<u64, Vec<Detection>>,
    fail_at: Option<u64>,
    seen: Rc<RefCell<Vec<u64>>>,
}

impl ObjectDetector for ScriptedDetector {
    fn detect(&mut self, frame: &Frame, min_confidence: f32) -> ProctorResult<Vec<Detection>> {
        self.seen.borrow_mut().push(frame.index);
        if self.fail_at == Some(frame.index) {
            return Err(ProctorError::inference("detector crashed"));
        }
        Ok(self
            .by_frame
            .get(&frame.index)
            .map(|dets| {
                dets.iter()
                    .copied()
                    .filter(|d| d.confidence > min_confidence)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct ScriptedTracker {
    face: Option<FaceLandmarks>,
    /// When set, the face is only found on these decode indices.
    only_on: Option<Vec<u64>>,
    releases: Rc<Cell<u32>>,
}

impl Release for ScriptedTracker {
    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

impl LandmarkTracker for ScriptedTracker {
    fn track(&mut self, frame: &Frame) -> ProctorResult<Option<FaceLandmarks>> {
        match &self.only_on {
            Some(indices) if !indices.contains(&frame.index) => Ok(None),
            _ => Ok(self.face.clone()),
        }
    }
}

struct ConstantFlow(f32);

impl OpticalFlowEstimator for ConstantFlow {
    fn estimate(&self, previous: &GrayImage, _current: &GrayImage) -> ProctorResult<MotionField> {
        let (w, h) = previous.dimensions();
        Ok(MotionField::new(w, h, vec![(self.0, 0.0); (w * h) as usize]).unwrap())
    }
}

struct CountingMatcher(Rc<Cell<u32>>);

impl ReferenceFaceMatcher for CountingMatcher {
    fn embed(&self, _reference: &RgbImage) -> ProctorResult<Option<FaceEmbedding>> {
        self.0.set(self.0.get() + 1);
        Ok(Some(FaceEmbedding(vec![0.0; 128])))
    }
}

fn steady_face() -> FaceLandmarks {
    let mut points = vec![Landmark::new(0.5, 0.5, 0.0); REFINED_MESH_LEN];
    points[1] = Landmark::new(0.50, 0.50, 0.0);
    points[152] = Landmark::new(0.50, 0.80, 0.0);
    points[33] = Landmark::new(0.35, 0.39, 0.0);
    points[263] = Landmark::new(0.65, 0.39, 0.0);
    points[61] = Landmark::new(0.42, 0.65, 0.0);
    points[291] = Landmark::new(0.58, 0.65, 0.0);
    points[133] = Landmark::new(0.45, 0.39, 0.0);
    points[159] = Landmark::new(0.40, 0.38, 0.0);
    points[145] = Landmark::new(0.40, 0.40, 0.0);
    FaceLandmarks::new(points).unwrap()
}

fn config(sample_every: u32) -> AnalysisConfig {
    AnalysisConfig {
        sample_every,
        ..Default::default()
    }
}

fn run_with(
    sample_every: u32,
    decoded: usize,
    detector: ScriptedDetector,
    tracker: ScriptedTracker,
    flow: f32,
) -> ProctorResult<AnalysisReport> {
    let driver = SessionDriver::new(
        config(sample_every),
        Box::new(detector),
        Box::new(tracker),
        Box::new(ConstantFlow(flow)),
    )?;
    let mut source = ScriptedSource::black(decoded, Rc::new(Cell::new(0)));
    driver.run(&mut source)
}

#[test]
fn twenty_three_frames_every_fifth_processes_four() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let detector = ScriptedDetector {
        seen: seen.clone(),
        ..Default::default()
    };
    let report = run_with(5, 23, detector, ScriptedTracker::default(), 0.0).unwrap();

    assert_eq!(report.summary.frames, 4);
    assert_eq!(*seen.borrow(), vec![5, 10, 15, 20]);
    assert_eq!(report.summary.eye_intent, EyeIntent::InsufficientData);
    assert!(report.events.is_empty());
}

#[test]
fn phone_at_exactly_five_percent_raises_no_event() {
    let mut by_frame = HashMap::new();
    by_frame.insert(5, vec![Detection::new(67, 0.9)]);
    let detector = ScriptedDetector {
        by_frame,
        ..Default::default()
    };
    let report = run_with(5, 100, detector, ScriptedTracker::default(), 0.0).unwrap();

    assert_eq!(report.summary.frames, 20);
    assert_eq!(report.summary.ratios.phone, 0.05);
    assert!(report.events.is_empty());
}

#[test]
fn two_phones_in_one_frame_count_twice() {
    let mut by_frame = HashMap::new();
    by_frame.insert(5, vec![Detection::new(67, 0.9), Detection::new(67, 0.8)]);
    let detector = ScriptedDetector {
        by_frame,
        ..Default::default()
    };
    let report = run_with(5, 100, detector, ScriptedTracker::default(), 0.0).unwrap();

    assert_eq!(report.summary.ratios.phone, 0.1);
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].kind, EventKind::ProctorPhone);
}

#[test]
fn detections_below_confidence_floor_are_dropped() {
    let mut by_frame = HashMap::new();
    by_frame.insert(1, vec![Detection::new(67, 0.2), Detection::new(73, 0.3)]);
    let detector = ScriptedDetector {
        by_frame,
        ..Default::default()
    };
    let report = run_with(1, 4, detector, ScriptedTracker::default(), 0.0).unwrap();

    assert_eq!(report.summary.ratios.phone, 0.0);
    assert_eq!(report.summary.forbidden_objects, vec!["book".to_string()]);
}

#[test]
fn steady_face_is_classified_as_memorized_answer() {
    let tracker = ScriptedTracker {
        face: Some(steady_face()),
        ..Default::default()
    };
    let report = run_with(5, 60, ScriptedDetector::default(), tracker, 0.0).unwrap();

    assert_eq!(report.summary.frames, 12);
    assert_eq!(report.summary.eye_intent, EyeIntent::MemorizedAnswer);
    assert_eq!(report.summary.ratios.looking_away, 0.0);
    assert_eq!(report.summary.ratios.talking, 0.0);
    assert_eq!(report.summary.ratios.reflection, 0.0);

    let last = report.events.last().unwrap();
    assert_eq!(last.kind, EventKind::ProctorEyeIntent);
    assert_eq!(last.message(), "Eye intent: memorized_answer");
}

#[test]
fn frames_without_a_face_do_not_fill_the_gaze_window() {
    let face_on = |count: u64| ScriptedTracker {
        face: Some(steady_face()),
        only_on: Some((1..=count).map(|i| i * 5).collect()),
        ..Default::default()
    };

    let nine = run_with(5, 110, ScriptedDetector::default(), face_on(9), 0.0).unwrap();
    assert_eq!(nine.summary.frames, 22);
    assert_eq!(nine.summary.eye_intent, EyeIntent::InsufficientData);
    assert!(nine.events.is_empty());

    let ten = run_with(5, 110, ScriptedDetector::default(), face_on(10), 0.0).unwrap();
    assert_eq!(ten.summary.frames, 22);
    assert_eq!(ten.summary.eye_intent, EyeIntent::MemorizedAnswer);
}

#[test]
fn edge_motion_counts_from_second_sampled_frame() {
    let report = run_with(1, 10, ScriptedDetector::default(), ScriptedTracker::default(), 2.0)
        .unwrap();

    assert_eq!(report.summary.ratios.hand_motion, 0.9);
    assert!(report
        .events
        .iter()
        .any(|e| e.kind == EventKind::ProctorAirspace));
}

#[test]
fn capability_failure_aborts_and_releases_everything() {
    let source_releases = Rc::new(Cell::new(0));
    let tracker_releases = Rc::new(Cell::new(0));
    let driver = SessionDriver::new(
        config(5),
        Box::new(ScriptedDetector {
            fail_at: Some(10),
            ..Default::default()
        }),
        Box::new(ScriptedTracker {
            releases: tracker_releases.clone(),
            ..Default::default()
        }),
        Box::new(ConstantFlow(0.0)),
    )
    .unwrap();
    let mut source = ScriptedSource::black(30, source_releases.clone());

    let err = driver.run(&mut source).unwrap_err();
    assert!(matches!(err, ProctorError::Inference { .. }));
    assert_eq!(source_releases.get(), 1);
    assert_eq!(tracker_releases.get(), 1);

    let verdict: Verdict = Err::<AnalysisReport, _>(err).into();
    assert_eq!(verdict.exit_code(), 1);
}

#[test]
fn too_short_video_is_an_input_error() {
    let source_releases = Rc::new(Cell::new(0));
    let driver = SessionDriver::new(
        config(5),
        Box::new(ScriptedDetector::default()),
        Box::new(ScriptedTracker::default()),
        Box::new(ConstantFlow(0.0)),
    )
    .unwrap();
    let mut source = ScriptedSource::black(3, source_releases.clone());

    let err = driver.run(&mut source).unwrap_err();
    assert!(matches!(
        err,
        ProctorError::NoFramesAnalyzed { decoded_frames: 3 }
    ));
    assert!(err.is_input_error());
    assert_eq!(source_releases.get(), 1);
}

#[test]
fn invalid_config_is_rejected_before_reading() {
    let result = SessionDriver::new(
        config(0),
        Box::new(ScriptedDetector::default()),
        Box::new(ScriptedTracker::default()),
        Box::new(ConstantFlow(0.0)),
    );
    assert!(matches!(result, Err(ProctorError::Config { .. })));
}

#[test]
fn reference_face_is_embedded_once() {
    let calls = Rc::new(Cell::new(0));
    let driver = SessionDriver::new(
        config(1),
        Box::new(ScriptedDetector::default()),
        Box::new(ScriptedTracker::default()),
        Box::new(ConstantFlow(0.0)),
    )
    .unwrap()
    .with_face_matcher(Box::new(CountingMatcher(calls.clone())))
    .with_reference(RgbImage::new(8, 8));

    let mut source = ScriptedSource::black(2, Rc::new(Cell::new(0)));
    let report = driver.run(&mut source).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(report.summary.frames, 2);
}

#[test]
fn reference_without_a_matcher_does_not_block_analysis() {
    let driver = SessionDriver::new(
        config(1),
        Box::new(ScriptedDetector::default()),
        Box::new(ScriptedTracker::default()),
        Box::new(ConstantFlow(0.0)),
    )
    .unwrap()
    .with_reference(RgbImage::new(8, 8));

    let mut source = ScriptedSource::black(3, Rc::new(Cell::new(0)));
    let report = driver.run(&mut source).unwrap();
    assert_eq!(report.summary.frames, 3);
}

#[test]
fn identical_inputs_give_identical_json() {
    let script = || {
        let mut by_frame = HashMap::new();
        by_frame.insert(5, vec![Detection::new(0, 0.9), Detection::new(0, 0.8)]);
        by_frame.insert(10, vec![Detection::new(63, 0.9), Detection::new(62, 0.9)]);
        ScriptedDetector {
            by_frame,
            ..Default::default()
        }
    };
    let tracker = || ScriptedTracker {
        face: Some(steady_face()),
        ..Default::default()
    };

    let a = run_with(5, 40, script(), tracker(), 3.0).unwrap();
    let b = run_with(5, 40, script(), tracker(), 3.0).unwrap();
    assert_eq!(a, b);

    let json_a = Verdict::Completed(a).to_json(false).unwrap();
    let json_b = Verdict::Completed(b).to_json(false).unwrap();
    assert_eq!(json_a, json_b);
    assert!(json_a.contains(r#""forbidden_objects":["laptop","tv"]"#));
}
