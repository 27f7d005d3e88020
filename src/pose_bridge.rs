// src/pose_bridge.rs - Boundary to the external pose-estimation model
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::landmarks::{FrameLandmarks, Landmark, PoseFrame, PoseLandmark, PoseStream};

/// Anything that turns a video file into per-frame landmarks. Dropping the
/// returned future must abandon the work.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, video: &Path) -> Result<PoseStream>;
}

/// One row of the long-format landmark CSV: `frame,timestamp,landmark,x,y,z`.
#[derive(Debug, Serialize, Deserialize)]
struct LandmarkRow {
    frame: usize,
    timestamp: Option<f64>,
    landmark: String,
    x: f64,
    y: f64,
    z: f64,
}

/// Parses a landmark CSV. Frames come back in index order; frames without
/// rows (no detection) are simply missing.
pub fn read_landmark_csv<R: Read>(reader: R, fps: f64) -> Result<PoseStream> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(AnalysisError::MalformedStream {
            row: 0,
            message: format!("invalid frame rate {}", fps),
        });
    }

    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut frames: BTreeMap<usize, (Option<f64>, FrameLandmarks)> = BTreeMap::new();

    for (i, row) in csv_reader.deserialize::<LandmarkRow>().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let row = row.map_err(|e| AnalysisError::MalformedStream {
            row: line,
            message: e.to_string(),
        })?;
        let name: PoseLandmark = row.landmark.parse()?;

        let entry = frames
            .entry(row.frame)
            .or_insert_with(|| (None, FrameLandmarks::new()));
        if entry.0.is_none() {
            entry.0 = row.timestamp;
        }
        entry.1.insert(name, Landmark::new(row.x, row.y, row.z));
    }

    let frames: Vec<PoseFrame> = frames
        .into_iter()
        .map(|(index, (timestamp, landmarks))| PoseFrame {
            index,
            timestamp: timestamp.unwrap_or(index as f64 / fps),
            landmarks,
        })
        .collect();

    debug!("Parsed {} detected frames", frames.len());
    Ok(PoseStream { fps, frames })
}

pub fn read_landmark_file(path: impl AsRef<Path>, fps: f64) -> Result<PoseStream> {
    let file = std::fs::File::open(path.as_ref())?;
    read_landmark_csv(file, fps)
}

pub fn write_landmark_csv<W: Write>(writer: W, frames: &[PoseFrame]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for frame in frames {
        for (name, lm) in frame.landmarks.iter() {
            csv_writer.serialize(LandmarkRow {
                frame: frame.index,
                timestamp: Some(frame.timestamp),
                landmark: name.name().to_string(),
                x: lm.x,
                y: lm.y,
                z: lm.z,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Runs an external landmark extractor as `<program> <args...> <video>` and
/// reads the landmark CSV it prints on stdout. The child is killed if the
/// estimate is dropped before it exits.
#[derive(Debug, Clone)]
pub struct CommandEstimator {
    program: String,
    args: Vec<String>,
    fps: f64,
}

impl CommandEstimator {
    pub fn new(program: impl Into<String>, args: Vec<String>, fps: f64) -> Self {
        Self {
            program: program.into(),
            args,
            fps,
        }
    }
}

#[async_trait]
impl PoseEstimator for CommandEstimator {
    async fn estimate(&self, video: &Path) -> Result<PoseStream> {
        if !video.exists() {
            return Err(AnalysisError::VideoNotFound(video.to_path_buf()));
        }

        info!("Running pose estimator {} on {}", self.program, video.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(video)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AnalysisError::Estimator(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::Estimator(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        read_landmark_csv(output.stdout.as_slice(), self.fps)
    }
}
