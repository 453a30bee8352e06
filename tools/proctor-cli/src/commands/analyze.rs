//! Analyze a session video and print the verdict.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use image::RgbImage;

use proctor_common::config::{AnalysisOverrides, AppConfig};
use proctor_common::error::{ProctorError, ProctorResult};
use proctor_processing_core::SessionDriver;
use proctor_session_model::{AnalysisReport, Verdict};
use proctor_vision_adapters::{open_video_source, AnnotationTrack, LucasKanadeFlow};

pub struct AnalyzeArgs {
    pub video: PathBuf,
    pub annotations: PathBuf,
    pub reference: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub overrides: AnalysisOverrides,
    pub pretty: bool,
}

/// Every outcome, success or failure, is a single JSON object on stdout.
pub fn run(args: AnalyzeArgs) -> ExitCode {
    let verdict: Verdict = analyze(&args).into();

    if let Verdict::Failed(failure) = &verdict {
        tracing::error!("Analysis failed: {}", failure.error);
    }

    match verdict.to_json(args.pretty) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: failed to serialize verdict: {e}");
            return ExitCode::FAILURE;
        }
    }

    if verdict.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn analyze(args: &AnalyzeArgs) -> ProctorResult<AnalysisReport> {
    let config = AppConfig::resolve(args.config.as_deref(), &args.overrides)?;

    let (detector, tracker) = AnnotationTrack::load(&args.annotations)?.into_capabilities();
    let mut driver = SessionDriver::new(
        config.analysis,
        Box::new(detector),
        Box::new(tracker),
        Box::new(LucasKanadeFlow::default()),
    )?;

    if let Some(reference) = args.reference.as_deref().map(load_reference).transpose()?.flatten() {
        driver = driver.with_reference(reference);
    }

    let mut source = open_video_source(&args.video)?;
    tracing::info!(video = %args.video.display(), "Analyzing session");
    driver.run(source.as_mut())
}

/// A missing reference image is skipped, an unreadable one is an error.
fn load_reference(path: &Path) -> ProctorResult<Option<RgbImage>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Reference image not found, skipping");
        return Ok(None);
    }
    let image = image::open(path).map_err(|e| {
        ProctorError::decode(format!("reference image {}: {e}", path.display()))
    })?;
    Ok(Some(image.to_rgb8()))
}
