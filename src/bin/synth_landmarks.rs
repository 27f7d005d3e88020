// src/bin/synth_landmarks.rs - Writes a synthetic landmark CSV for trying the analyzer
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use form_analyzer::pose_bridge::write_landmark_csv;
use form_analyzer::synthetic::{pushup_stream, squat_stream};

#[derive(Clone, Copy, ValueEnum)]
enum Movement {
    PushUp,
    Squat,
}

#[derive(Parser)]
#[command(name = "synth_landmarks")]
#[command(about = "Generate a synthetic pose-landmark stream", long_about = None)]
struct Args {
    #[arg(long, value_enum, default_value = "push-up")]
    movement: Movement,
    #[arg(long, default_value_t = 90)]
    frames: usize,
    #[arg(long, default_value_t = 3)]
    reps: usize,
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    /// Output file; stdout when omitted
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let stream = match args.movement {
        Movement::PushUp => pushup_stream(args.frames, args.reps, args.fps),
        Movement::Squat => squat_stream(args.frames, args.reps, args.fps),
    };

    match &args.out {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_landmark_csv(file, &stream.frames)?;
            eprintln!("✓ Wrote {} frames to {}", stream.frames.len(), path.display());
        }
        None => write_landmark_csv(std::io::stdout().lock(), &stream.frames)?,
    }

    Ok(())
}
