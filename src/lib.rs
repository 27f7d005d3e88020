// src/lib.rs
pub mod analysis;
pub mod angles;
pub mod config;
pub mod error;
pub mod export;
pub mod feedback;
pub mod landmarks;
pub mod pose_bridge;
pub mod quality;
pub mod reps;
pub mod rules;
pub mod scoring;
pub mod staging;
pub mod synthetic;

pub use analysis::{AnalysisOutcome, FormAnalyzer};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use feedback::{FeedbackReport, RiskLevel};
pub use landmarks::{FrameLandmarks, Landmark, PoseFrame, PoseLandmark, PoseStream};
pub use pose_bridge::{CommandEstimator, PoseEstimator};
