// src/analysis.rs - End-to-end form analysis pipeline
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::feedback::{generate_feedback, FeedbackReport};
use crate::landmarks::PoseFrame;
use crate::pose_bridge::PoseEstimator;
use crate::quality::{analyze_timing, average_scores, quality_metrics, MovementAnalysis};
use crate::scoring::{FrameRecord, FrameScorer};
use crate::staging::StagedVideo;

/// Report plus the per-frame records it was built from.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub exercise: String,
    pub records: Vec<FrameRecord>,
    pub report: FeedbackReport,
}

#[derive(Debug, Clone, Default)]
pub struct FormAnalyzer {
    config: AnalyzerConfig,
}

impl FormAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Angles and checkpoint scores for every frame, in input order.
    pub fn score_frames(&self, frames: &[PoseFrame], exercise: &str) -> Vec<FrameRecord> {
        let scorer = FrameScorer::new(exercise);
        if scorer.rules().is_generic() {
            info!("No rule set for {:?}, using generic scores", exercise);
        }
        debug!("Scoring {} frames with {:?} rules", frames.len(), scorer.rules());
        frames.iter().map(|frame| scorer.record(frame)).collect()
    }

    pub fn analyze_movement(&self, records: &[FrameRecord], exercise: &str) -> MovementAnalysis {
        let rep_count = if records.len() < self.config.min_frames_for_reps {
            debug!(
                "Only {} frames (need {}), not counting reps",
                records.len(),
                self.config.min_frames_for_reps
            );
            0
        } else {
            self.config.cycle_counter().count(records, exercise)
        };

        MovementAnalysis {
            rep_count,
            timing: analyze_timing(records, rep_count, self.config.controlled_tempo_secs),
            average_scores: average_scores(records),
            quality: quality_metrics(records),
        }
    }

    /// Full pipeline over frames with a detected pose. `checkpoints` is an
    /// opaque client configuration string; it is recorded but does not
    /// change scoring.
    pub fn run(
        &self,
        frames: &[PoseFrame],
        exercise: &str,
        checkpoints: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        if frames.is_empty() {
            return Err(AnalysisError::NoPoseDetected);
        }
        if let Some(checkpoints) = checkpoints {
            debug!("Checkpoint configuration supplied: {}", checkpoints);
        }

        let records = self.score_frames(frames, exercise);
        let analysis = self.analyze_movement(&records, exercise);
        let report = generate_feedback(&analysis);

        info!(
            "Analyzed {} frames of {}: {} reps, overall {:.1} ({:?} risk)",
            records.len(),
            exercise,
            report.rep_count,
            report.overall_score,
            report.risk_level
        );

        Ok(AnalysisOutcome {
            exercise: exercise.to_string(),
            records,
            report,
        })
    }

    pub fn analyze(
        &self,
        frames: &[PoseFrame],
        exercise: &str,
        checkpoints: Option<&str>,
    ) -> Result<FeedbackReport> {
        self.run(frames, exercise, checkpoints).map(|outcome| outcome.report)
    }

    /// Stages the uploaded bytes, runs pose estimation, then analysis.
    /// Dropping the future (e.g. on timeout) stops the estimator and removes
    /// the staged file.
    pub async fn analyze_video(
        &self,
        video: Vec<u8>,
        extension: &str,
        exercise: &str,
        checkpoints: Option<String>,
        estimator: Arc<dyn PoseEstimator>,
    ) -> Result<AnalysisOutcome> {
        let staged = StagedVideo::write_in(self.config.staging_dir(), &video, extension)?;
        let stream = estimator.estimate(staged.path()).await?;
        drop(staged);
        info!("Pose estimator returned {} frames", stream.frames.len());

        let analyzer = self.clone();
        let exercise = exercise.to_string();
        tokio::task::spawn_blocking(move || {
            analyzer.run(&stream.frames, &exercise, checkpoints.as_deref())
        })
        .await
        .map_err(|e| AnalysisError::Task(e.to_string()))?
    }

    /// Reads a video from disk and hands it to [`FormAnalyzer::analyze_video`].
    pub async fn analyze_video_file(
        &self,
        path: &Path,
        exercise: &str,
        checkpoints: Option<String>,
        estimator: Arc<dyn PoseEstimator>,
    ) -> Result<AnalysisOutcome> {
        if !path.exists() {
            return Err(AnalysisError::VideoNotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.analyze_video(bytes, extension, exercise, checkpoints, estimator)
            .await
    }
}
