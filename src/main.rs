// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use form_analyzer::analysis::{AnalysisOutcome, FormAnalyzer};
use form_analyzer::config::AnalyzerConfig;
use form_analyzer::export::ReportExporter;
use form_analyzer::pose_bridge::{read_landmark_file, CommandEstimator, PoseEstimator};
use form_analyzer::rules::{FormRules, RuleRegistry};

#[derive(Parser)]
#[command(name = "form_analyzer")]
#[command(about = "Scores exercise form from pose-landmark streams", long_about = None)]
struct Cli {
    /// JSON file overriding analyzer defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a landmark CSV (frame,timestamp,landmark,x,y,z)
    Analyze {
        #[arg(long)]
        landmarks: PathBuf,
        #[arg(long)]
        exercise: String,
        #[arg(long)]
        checkpoints: Option<String>,
        /// Frame rate used when rows carry no timestamp
        #[arg(long)]
        fps: Option<f64>,
        /// Also write report.json and frame_scores.csv to a session directory
        #[arg(long)]
        export: bool,
        /// Export root; defaults to the configured output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run an external pose estimator over a video, then analyze it
    Video {
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        exercise: String,
        #[arg(long)]
        checkpoints: Option<String>,
        /// Program that prints landmark CSV for the video given as last argument
        #[arg(long)]
        estimator: String,
        #[arg(long = "estimator-arg")]
        estimator_args: Vec<String>,
        #[arg(long)]
        fps: Option<f64>,
        #[arg(long)]
        export: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List registered exercises and their checkpoints
    Rules,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };

    match cli.command {
        Commands::Analyze {
            landmarks,
            exercise,
            checkpoints,
            fps,
            export,
            out,
        } => {
            let export_dir = resolve_export_dir(export, out, &config);
            let fps = fps.unwrap_or(config.default_fps);
            let stream = read_landmark_file(&landmarks, fps)
                .with_context(|| format!("Failed to read landmarks from {}", landmarks.display()))?;
            info!("Loaded {} frames from {}", stream.frames.len(), landmarks.display());

            let analyzer = FormAnalyzer::new(config);
            let outcome = analyzer
                .run(&stream.frames, &exercise, checkpoints.as_deref())
                .context("Form analysis failed")?;
            finish(&outcome, export_dir)?;
        }
        Commands::Video {
            video,
            exercise,
            checkpoints,
            estimator,
            estimator_args,
            fps,
            export,
            out,
        } => {
            let export_dir = resolve_export_dir(export, out, &config);
            let fps = fps.unwrap_or(config.default_fps);
            let estimator: Arc<dyn PoseEstimator> =
                Arc::new(CommandEstimator::new(estimator, estimator_args, fps));
            let timeout = Duration::from_secs(config.estimator_timeout_secs);

            let analyzer = FormAnalyzer::new(config);
            let outcome = tokio::time::timeout(
                timeout,
                analyzer.analyze_video_file(&video, &exercise, checkpoints, estimator),
            )
            .await
            .with_context(|| format!("Video analysis timed out after {:?}", timeout))?
            .with_context(|| format!("Failed to analyze {}", video.display()))?;
            finish(&outcome, export_dir)?;
        }
        Commands::Rules => {
            for (id, rules) in RuleRegistry::global().exercises() {
                let names: Vec<_> = rules.checkpoints().iter().map(|c| c.name()).collect();
                println!("{:<10} {}", id, names.join(", "));
            }
        }
    }

    Ok(())
}

fn resolve_export_dir(export: bool, out: Option<PathBuf>, config: &AnalyzerConfig) -> Option<PathBuf> {
    match out {
        Some(dir) => Some(dir),
        None if export => Some(config.output_directory.clone()),
        None => None,
    }
}

fn finish(outcome: &AnalysisOutcome, export_dir: Option<PathBuf>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.report)?);

    if let Some(dir) = export_dir {
        let paths = ReportExporter::new(dir, None).export(outcome)?;
        eprintln!("Report written to {}", paths.report.display());
        eprintln!("Frame scores written to {}", paths.frames.display());
    }
    Ok(())
}
