//! Proctor CLI — analyze proctoring session videos.
//!
//! Usage:
//!   proctor analyze <VIDEO> --annotations <FILE>   Print the JSON verdict
//!   proctor config                                 Show the effective configuration
//!
//! Only the verdict is written to stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use proctor_common::config::{AnalysisOverrides, AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "proctor",
    about = "Integrity signal analysis for proctored exam recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a session video
    Analyze {
        /// Video file, or a directory of extracted frames
        video: PathBuf,

        /// Recorded detector and landmark results (JSONL)
        #[arg(long)]
        annotations: PathBuf,

        /// Reference face image of the candidate
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Config file (replaces the default location)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Analyze every Nth decoded frame
        #[arg(long)]
        sample_every: Option<u32>,

        /// Detector confidence floor [0.0, 1.0]
        #[arg(long)]
        conf_threshold: Option<f32>,

        /// Yaw threshold for looking away
        #[arg(long)]
        gaze_threshold_x: Option<f64>,

        /// Pitch threshold for looking away
        #[arg(long)]
        gaze_threshold_y: Option<f64>,

        /// Mouth openness threshold for talking
        #[arg(long)]
        mouth_threshold: Option<f64>,

        /// Pretty-print the verdict
        #[arg(long)]
        pretty: bool,
    },

    /// Show the effective configuration
    Config {
        /// Config file (replaces the default location)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    fn config_path(&self) -> Option<&std::path::Path> {
        match &self.command {
            Commands::Analyze { config, .. } | Commands::Config { config } => config.as_deref(),
        }
    }

    /// Logging settings from the config file, if it loads, with `-v` on top.
    fn logging_config(&self) -> LoggingConfig {
        let mut logging = match self.config_path() {
            Some(path) => AppConfig::load_from(path).unwrap_or_default().logging,
            None => AppConfig::load().logging,
        };
        if self.verbose {
            logging.level = "debug".to_string();
        }
        logging
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    proctor_common::logging::init_logging(&cli.logging_config());

    match cli.command {
        Commands::Analyze {
            video,
            annotations,
            reference,
            config,
            sample_every,
            conf_threshold,
            gaze_threshold_x,
            gaze_threshold_y,
            mouth_threshold,
            pretty,
        } => commands::analyze::run(commands::analyze::AnalyzeArgs {
            video,
            annotations,
            reference,
            config,
            overrides: AnalysisOverrides {
                conf_threshold,
                gaze_threshold_x,
                gaze_threshold_y,
                mouth_open_threshold: mouth_threshold,
                sample_every,
                face_mismatch_threshold: None,
            },
            pretty,
        }),
        Commands::Config { config } => match commands::config::run(config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}
