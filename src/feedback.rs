// src/feedback.rs - Converts movement analysis into the user-facing report
use serde::{Deserialize, Serialize};

use crate::quality::{MovementAnalysis, QualityMetrics, TimingAnalysis};
use crate::rules::Checkpoint;
use crate::scoring::CheckpointScores;

/// Overall score when no checkpoint was ever scored.
const DEFAULT_OVERALL: f64 = 50.0;
const QUALITY_WARNING_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FeedbackStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            FeedbackStatus::Excellent
        } else if score >= 75.0 {
            FeedbackStatus::Good
        } else if score >= 60.0 {
            FeedbackStatus::Fair
        } else {
            FeedbackStatus::Poor
        }
    }

    fn message(self, name: &str) -> String {
        match self {
            FeedbackStatus::Excellent => format!("Excellent {}!", name),
            FeedbackStatus::Good => format!("Good {}, minor adjustments needed.", name),
            FeedbackStatus::Fair => format!("Fair {}, focus on improvement.", name),
            FeedbackStatus::Poor => format!("Poor {}, needs significant work.", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 80.0 {
            RiskLevel::Low
        } else if overall >= 60.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub checkpoint: Checkpoint,
    pub score: f64,
    pub feedback: String,
    pub status: FeedbackStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub overall_score: f64,
    pub feedback: Vec<FeedbackEntry>,
    pub improvements: Vec<String>,
    pub risk_level: RiskLevel,
    pub rep_count: u32,
    pub timing_analysis: TimingAnalysis,
    pub form_breakdown: CheckpointScores,
    pub quality_metrics: QualityMetrics,
}

pub fn mean_score(average_scores: &CheckpointScores) -> f64 {
    if average_scores.is_empty() {
        return DEFAULT_OVERALL;
    }
    average_scores.values().sum::<f64>() / average_scores.len() as f64
}

/// Reported overall score: the mean rounded to one decimal.
pub fn overall_score(average_scores: &CheckpointScores) -> f64 {
    (mean_score(average_scores) * 10.0).round() / 10.0
}

pub fn generate_feedback(analysis: &MovementAnalysis) -> FeedbackReport {
    // Risk is tiered on the unrounded mean.
    let mean = mean_score(&analysis.average_scores);

    let mut feedback = Vec::with_capacity(analysis.average_scores.len());
    let mut improvements = Vec::new();

    for (&checkpoint, &score) in &analysis.average_scores {
        let name = checkpoint.display_name();
        let status = FeedbackStatus::from_score(score);

        if status == FeedbackStatus::Poor {
            improvements.push(format!("Work on {}", name));
        }

        feedback.push(FeedbackEntry {
            checkpoint,
            score,
            feedback: status.message(&name),
            status,
        });
    }

    if analysis.quality.consistency < QUALITY_WARNING_THRESHOLD {
        improvements.push("Focus on consistent movement patterns".to_string());
    }
    if analysis.quality.smoothness < QUALITY_WARNING_THRESHOLD {
        improvements.push("Work on smoother, more controlled movements".to_string());
    }

    FeedbackReport {
        overall_score: overall_score(&analysis.average_scores),
        feedback,
        improvements,
        risk_level: RiskLevel::from_score(mean),
        rep_count: analysis.rep_count,
        timing_analysis: analysis.timing.clone(),
        form_breakdown: analysis.average_scores.clone(),
        quality_metrics: analysis.quality.clone(),
    }
}
