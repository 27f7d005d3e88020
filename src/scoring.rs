// src/scoring.rs - Per-frame form scoring and the immutable frame record
use std::collections::BTreeMap;
use tracing::warn;

use crate::angles::{calculate_angles, JointAngles};
use crate::error::CheckpointError;
use crate::landmarks::{FrameLandmarks, PoseFrame};
use crate::rules::{Checkpoint, FormRules, RuleRegistry, RuleSet, NEUTRAL_SCORE};

/// Checkpoint -> score in [0, 100], ordered by checkpoint.
pub type CheckpointScores = BTreeMap<Checkpoint, f64>;

/// Everything derived from one detected frame. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame: usize,
    pub landmarks: FrameLandmarks,
    pub angles: JointAngles,
    pub form_scores: CheckpointScores,
    pub timestamp: f64,
}

impl FrameRecord {
    /// Mean of this frame's checkpoint scores.
    pub fn average_score(&self) -> Option<f64> {
        if self.form_scores.is_empty() {
            return None;
        }
        Some(self.form_scores.values().sum::<f64>() / self.form_scores.len() as f64)
    }
}

/// Scores frames for one exercise. The rule set is resolved once up front.
#[derive(Debug, Clone, Copy)]
pub struct FrameScorer {
    rules: RuleSet,
}

impl FrameScorer {
    pub fn new(exercise: &str) -> Self {
        Self {
            rules: RuleRegistry::global().lookup(exercise),
        }
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    pub fn score(&self, landmarks: &FrameLandmarks, angles: &JointAngles) -> CheckpointScores {
        let mut scores = CheckpointScores::new();

        for &checkpoint in self.rules.checkpoints() {
            let score = self
                .rules
                .evaluate(checkpoint, landmarks, angles)
                .and_then(|s| if s.is_finite() { Ok(s) } else { Err(CheckpointError::NonFinite) })
                .unwrap_or_else(|e| {
                    warn!("Checkpoint {} failed ({}), using neutral score", checkpoint, e);
                    NEUTRAL_SCORE
                });
            scores.insert(checkpoint, score.clamp(0.0, 100.0));
        }

        scores
    }

    /// Angle calculation plus scoring for one detected frame.
    pub fn record(&self, frame: &PoseFrame) -> FrameRecord {
        let angles = calculate_angles(&frame.landmarks);
        let form_scores = self.score(&frame.landmarks, &angles);

        FrameRecord {
            frame: frame.index,
            landmarks: frame.landmarks.clone(),
            angles,
            form_scores,
            timestamp: frame.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::Joint;
    use crate::landmarks::{Landmark, PoseLandmark};
    use crate::rules::GENERIC_SCORES;

    fn all_at(x: f64, y: f64) -> FrameLandmarks {
        PoseLandmark::ALL
            .iter()
            .map(|&name| (name, Landmark::new(x, y, 0.0)))
            .collect()
    }

    #[test]
    fn unknown_exercise_gets_generic_scores() {
        let scores = FrameScorer::new("Burpee").score(&FrameLandmarks::new(), &JointAngles::new());
        let expected: CheckpointScores = GENERIC_SCORES.into_iter().collect();
        assert_eq!(scores, expected);
    }

    #[test]
    fn missing_landmarks_fall_back_to_neutral() {
        let scores = FrameScorer::new("squat").score(&FrameLandmarks::new(), &JointAngles::new());
        assert_eq!(scores[&Checkpoint::KneeTracking], NEUTRAL_SCORE);
        assert_eq!(scores[&Checkpoint::BackPosition], NEUTRAL_SCORE);
        // Depth only needs angles, which default to 90 degrees.
        assert_eq!(scores[&Checkpoint::Depth], 100.0);
    }

    #[test]
    fn scores_stay_in_range_for_degenerate_input() {
        let degenerate = [
            all_at(0.0, 0.0),
            all_at(f64::NAN, 0.5),
            all_at(f64::INFINITY, f64::NEG_INFINITY),
            all_at(1e300, -1e300),
            FrameLandmarks::new(),
        ];
        let wild_angles = [
            JointAngles::new(),
            Joint::ALL.iter().map(|&j| (j, 0.0)).collect(),
            Joint::ALL.iter().map(|&j| (j, 180.0)).collect(),
            Joint::ALL.iter().map(|&j| (j, f64::NAN)).collect(),
            Joint::ALL.iter().map(|&j| (j, -720.0)).collect(),
        ];

        for exercise in ["push_up", "squat", "plank", "yoga"] {
            let scorer = FrameScorer::new(exercise);
            for landmarks in &degenerate {
                for angles in &wild_angles {
                    for (checkpoint, score) in scorer.score(landmarks, angles) {
                        assert!(
                            (0.0..=100.0).contains(&score),
                            "{exercise}/{checkpoint} scored {score}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn record_keeps_frame_metadata() {
        let frame = PoseFrame {
            index: 7,
            timestamp: 0.25,
            landmarks: all_at(0.5, 0.5),
        };
        let record = FrameScorer::new("plank").record(&frame);
        assert_eq!(record.frame, 7);
        assert_eq!(record.timestamp, 0.25);
        assert_eq!(record.form_scores.len(), 3);
        // Every segment has zero length, so no angle survives.
        assert!(record.angles.is_empty());
        assert!(record.average_score().is_some());
    }
}
