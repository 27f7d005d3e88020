// src/rules.rs - Exercise rule registry and per-checkpoint biomechanical scoring
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::angles::{Joint, JointAngles};
use crate::error::CheckpointError;
use crate::landmarks::{FrameLandmarks, Landmark, PoseLandmark};

/// Score given to a checkpoint whose evaluation failed.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// A separately scored aspect of an exercise. Declaration order is the order
/// used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    // push-up
    BodyAlignment,
    ElbowPosition,
    RangeOfMotion,
    // squat
    KneeTracking,
    Depth,
    BackPosition,
    // plank
    Alignment,
    HipPosition,
    ShoulderStability,
    // generic fallback
    Posture,
    Symmetry,
    Stability,
}

impl Checkpoint {
    pub fn name(self) -> &'static str {
        match self {
            Checkpoint::BodyAlignment => "body_alignment",
            Checkpoint::ElbowPosition => "elbow_position",
            Checkpoint::RangeOfMotion => "range_of_motion",
            Checkpoint::KneeTracking => "knee_tracking",
            Checkpoint::Depth => "depth",
            Checkpoint::BackPosition => "back_position",
            Checkpoint::Alignment => "alignment",
            Checkpoint::HipPosition => "hip_position",
            Checkpoint::ShoulderStability => "shoulder_stability",
            Checkpoint::Posture => "posture",
            Checkpoint::Symmetry => "symmetry",
            Checkpoint::Stability => "stability",
        }
    }

    pub fn display_name(self) -> String {
        self.name().replace('_', " ")
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait FormRules {
    fn checkpoints(&self) -> &'static [Checkpoint];

    fn evaluate(
        &self,
        checkpoint: Checkpoint,
        landmarks: &FrameLandmarks,
        angles: &JointAngles,
    ) -> Result<f64, CheckpointError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSet {
    PushUp,
    Squat,
    Plank,
    Generic,
}

const PUSH_UP_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::BodyAlignment,
    Checkpoint::ElbowPosition,
    Checkpoint::RangeOfMotion,
];
const SQUAT_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::KneeTracking,
    Checkpoint::Depth,
    Checkpoint::BackPosition,
];
const PLANK_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::Alignment,
    Checkpoint::HipPosition,
    Checkpoint::ShoulderStability,
];
const GENERIC_CHECKPOINTS: &[Checkpoint] = &[
    Checkpoint::Posture,
    Checkpoint::Symmetry,
    Checkpoint::Stability,
];

pub const GENERIC_SCORES: [(Checkpoint, f64); 3] = [
    (Checkpoint::Posture, 75.0),
    (Checkpoint::Symmetry, 80.0),
    (Checkpoint::Stability, 70.0),
];

impl RuleSet {
    pub fn is_generic(self) -> bool {
        self == RuleSet::Generic
    }
}

impl FormRules for RuleSet {
    fn checkpoints(&self) -> &'static [Checkpoint] {
        match self {
            RuleSet::PushUp => PUSH_UP_CHECKPOINTS,
            RuleSet::Squat => SQUAT_CHECKPOINTS,
            RuleSet::Plank => PLANK_CHECKPOINTS,
            RuleSet::Generic => GENERIC_CHECKPOINTS,
        }
    }

    fn evaluate(
        &self,
        checkpoint: Checkpoint,
        landmarks: &FrameLandmarks,
        angles: &JointAngles,
    ) -> Result<f64, CheckpointError> {
        match (self, checkpoint) {
            (RuleSet::PushUp, Checkpoint::BodyAlignment) => body_alignment(landmarks, 200.0),
            (RuleSet::PushUp, Checkpoint::ElbowPosition) => Ok(pushup_elbows(angles)),
            (RuleSet::PushUp, Checkpoint::RangeOfMotion) => Ok(pushup_range_of_motion(angles)),
            (RuleSet::Squat, Checkpoint::KneeTracking) => squat_knee_tracking(landmarks),
            (RuleSet::Squat, Checkpoint::Depth) => Ok(squat_depth(angles)),
            (RuleSet::Squat, Checkpoint::BackPosition) => squat_back(landmarks),
            // Stricter variant of the push-up line check.
            (RuleSet::Plank, Checkpoint::Alignment) => body_alignment(landmarks, 300.0),
            (RuleSet::Plank, Checkpoint::HipPosition) => Ok(plank_hips(angles)),
            (RuleSet::Plank, Checkpoint::ShoulderStability) => plank_shoulders(landmarks),
            (RuleSet::Generic, _) => Ok(GENERIC_SCORES
                .iter()
                .find(|(c, _)| *c == checkpoint)
                .map(|(_, s)| *s)
                .unwrap_or(NEUTRAL_SCORE)),
            // Checkpoint from another exercise.
            _ => Ok(NEUTRAL_SCORE),
        }
    }
}

/// Lowercase, with spaces and hyphens collapsed to underscores.
pub fn normalize_exercise_id(name: &str) -> String {
    name.to_lowercase().replace(['-', ' '], "_")
}

pub struct RuleRegistry {
    rules: HashMap<&'static str, RuleSet>,
}

static REGISTRY: Lazy<RuleRegistry> = Lazy::new(RuleRegistry::builtin);

impl RuleRegistry {
    fn builtin() -> Self {
        let mut rules = HashMap::new();
        rules.insert("push_up", RuleSet::PushUp);
        rules.insert("squat", RuleSet::Squat);
        rules.insert("plank", RuleSet::Plank);
        Self { rules }
    }

    pub fn global() -> &'static RuleRegistry {
        &REGISTRY
    }

    /// Rule set for an exercise name in any casing/separator style.
    pub fn lookup(&self, exercise: &str) -> RuleSet {
        self.rules
            .get(normalize_exercise_id(exercise).as_str())
            .copied()
            .unwrap_or(RuleSet::Generic)
    }

    pub fn exercises(&self) -> Vec<(&'static str, RuleSet)> {
        let mut entries: Vec<_> = self.rules.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}

fn point(landmarks: &FrameLandmarks, name: PoseLandmark) -> Result<&Landmark, CheckpointError> {
    landmarks
        .get(name)
        .ok_or(CheckpointError::MissingLandmark(name))
}

fn mean_y(
    landmarks: &FrameLandmarks,
    left: PoseLandmark,
    right: PoseLandmark,
) -> Result<f64, CheckpointError> {
    Ok((point(landmarks, left)?.y + point(landmarks, right)?.y) / 2.0)
}

fn mean_angle(angles: &JointAngles, left: Joint, right: Joint, default: f64) -> f64 {
    let l = angles.get(&left).copied().unwrap_or(default);
    let r = angles.get(&right).copied().unwrap_or(default);
    (l + r) / 2.0
}

fn horizontal_offset_score(
    landmarks: &FrameLandmarks,
    pairs: [(PoseLandmark, PoseLandmark); 2],
    tolerance: f64,
) -> Result<f64, CheckpointError> {
    let mut total = 0.0;
    for (a, b) in pairs {
        let offset = (point(landmarks, a)?.x - point(landmarks, b)?.x).abs();
        total += (100.0 - offset / tolerance * 100.0).max(0.0);
    }
    Ok(total / 2.0)
}

/// Hip deviation from the shoulder-ankle midline relative to body height.
fn body_alignment(landmarks: &FrameLandmarks, penalty: f64) -> Result<f64, CheckpointError> {
    use PoseLandmark::*;
    let shoulder_y = mean_y(landmarks, LeftShoulder, RightShoulder)?;
    let hip_y = mean_y(landmarks, LeftHip, RightHip)?;
    let ankle_y = mean_y(landmarks, LeftAnkle, RightAnkle)?;

    let total_height = (shoulder_y - ankle_y).abs();
    let hip_deviation = (hip_y - (shoulder_y + ankle_y) / 2.0).abs();

    if total_height > 0.0 {
        Ok((100.0 - hip_deviation / total_height * penalty).max(0.0))
    } else {
        Ok(NEUTRAL_SCORE)
    }
}

fn pushup_elbows(angles: &JointAngles) -> f64 {
    const IDEAL: (f64, f64) = (45.0, 90.0);

    let score_angle = |angle: f64| {
        if (IDEAL.0..=IDEAL.1).contains(&angle) {
            100.0
        } else {
            let deviation = (angle - IDEAL.0).abs().min((angle - IDEAL.1).abs());
            (100.0 - deviation * 2.0).max(0.0)
        }
    };

    let left = score_angle(angles.get(&Joint::LeftElbow).copied().unwrap_or(90.0));
    let right = score_angle(angles.get(&Joint::RightElbow).copied().unwrap_or(90.0));
    (left + right) / 2.0
}

fn pushup_range_of_motion(angles: &JointAngles) -> f64 {
    let elbow = mean_angle(angles, Joint::LeftElbow, Joint::RightElbow, 90.0);
    if (45.0..=60.0).contains(&elbow) {
        100.0
    } else if (30.0..=75.0).contains(&elbow) {
        80.0
    } else {
        60.0
    }
}

fn squat_knee_tracking(landmarks: &FrameLandmarks) -> Result<f64, CheckpointError> {
    use PoseLandmark::*;
    // 10% of frame width
    horizontal_offset_score(
        landmarks,
        [(LeftKnee, LeftAnkle), (RightKnee, RightAnkle)],
        0.1,
    )
}

fn squat_depth(angles: &JointAngles) -> f64 {
    let knee = mean_angle(angles, Joint::LeftKnee, Joint::RightKnee, 90.0);
    if knee <= 90.0 {
        100.0
    } else if knee <= 110.0 {
        80.0
    } else if knee <= 130.0 {
        60.0
    } else {
        40.0
    }
}

fn squat_back(landmarks: &FrameLandmarks) -> Result<f64, CheckpointError> {
    let lean = (point(landmarks, PoseLandmark::LeftShoulder)?.x
        - point(landmarks, PoseLandmark::LeftHip)?.x)
        .abs();
    Ok(if lean < 0.1 {
        100.0
    } else if lean < 0.2 {
        80.0
    } else {
        60.0
    })
}

fn plank_hips(angles: &JointAngles) -> f64 {
    let hip = mean_angle(angles, Joint::LeftHip, Joint::RightHip, 180.0);
    (100.0 - (180.0 - hip).abs() * 2.0).max(0.0)
}

fn plank_shoulders(landmarks: &FrameLandmarks) -> Result<f64, CheckpointError> {
    use PoseLandmark::*;
    horizontal_offset_score(
        landmarks,
        [(LeftShoulder, LeftElbow), (RightShoulder, RightElbow)],
        0.05,
    )
}
