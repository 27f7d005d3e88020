// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Nothing to analyze: the pose model found no body in any frame.
    #[error("No pose detected in video")]
    NoPoseDetected,

    #[error("Unknown landmark name: {0}")]
    UnknownLandmark(String),

    #[error("Malformed landmark stream at row {row}: {message}")]
    MalformedStream { row: usize, message: String },

    #[error("Pose estimator failed: {0}")]
    Estimator(String),

    #[error("Analysis task failed: {0}")]
    Task(String),

    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Local failure inside one checkpoint evaluation. Never escapes the frame
/// scorer; it is logged and replaced by the neutral score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckpointError {
    #[error("missing landmark {0}")]
    MissingLandmark(crate::landmarks::PoseLandmark),

    #[error("non-finite score")]
    NonFinite,
}

/// Local failure computing a single joint angle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AngleError {
    #[error("zero-length segment")]
    DegenerateSegment,

    #[error("non-finite coordinates")]
    NonFinite,
}
