// src/angles.rs - Joint angles from three-point landmark geometry
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::AngleError;
use crate::landmarks::{FrameLandmarks, PoseLandmark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftElbow,
    RightElbow,
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    LeftShoulder,
    RightShoulder,
}

impl Joint {
    pub const ALL: [Joint; 8] = [
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftShoulder,
        Joint::RightShoulder,
    ];

    /// (first, vertex, third) landmarks; the angle is measured at the vertex.
    pub fn triple(self) -> (PoseLandmark, PoseLandmark, PoseLandmark) {
        use PoseLandmark::*;
        match self {
            Joint::LeftElbow => (LeftShoulder, LeftElbow, LeftWrist),
            Joint::RightElbow => (RightShoulder, RightElbow, RightWrist),
            Joint::LeftKnee => (LeftHip, LeftKnee, LeftAnkle),
            Joint::RightKnee => (RightHip, RightKnee, RightAnkle),
            Joint::LeftHip => (LeftShoulder, LeftHip, LeftKnee),
            Joint::RightHip => (RightShoulder, RightHip, RightKnee),
            Joint::LeftShoulder => (LeftElbow, LeftShoulder, LeftHip),
            Joint::RightShoulder => (RightElbow, RightShoulder, RightHip),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Degrees per joint. Joints that could not be measured are absent.
pub type JointAngles = BTreeMap<Joint, f64>;

/// Angle in degrees at `vertex` between the segments to `first` and `third`.
pub fn angle_at(
    first: Vector2<f64>,
    vertex: Vector2<f64>,
    third: Vector2<f64>,
) -> Result<f64, AngleError> {
    let v1 = first - vertex;
    let v2 = third - vertex;

    if !(v1.iter().chain(v2.iter()).all(|c| c.is_finite())) {
        return Err(AngleError::NonFinite);
    }

    let mag1 = v1.norm();
    let mag2 = v2.norm();

    if mag1 == 0.0 || mag2 == 0.0 {
        return Err(AngleError::DegenerateSegment);
    }

    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    Ok(cos_angle.acos().to_degrees())
}

/// Computes every joint angle whose three landmarks are present.
pub fn calculate_angles(landmarks: &FrameLandmarks) -> JointAngles {
    let mut angles = JointAngles::new();

    for joint in Joint::ALL {
        let (a, b, c) = joint.triple();
        let (Some(p1), Some(p2), Some(p3)) = (landmarks.get(a), landmarks.get(b), landmarks.get(c))
        else {
            continue;
        };

        match angle_at(p1.planar(), p2.planar(), p3.planar()) {
            Ok(degrees) => {
                angles.insert(joint, degrees);
            }
            Err(e) => debug!("Skipping {} angle: {}", joint, e),
        }
    }

    angles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    #[test]
    fn right_angle_is_ninety_degrees() {
        let angle = angle_at(
            Vector2::new(0.5, 0.3),
            Vector2::new(0.5, 0.5),
            Vector2::new(0.7, 0.5),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn straight_and_folded_segments_hit_the_bounds() {
        let straight = angle_at(
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
        )
        .unwrap();
        assert!((straight - 180.0).abs() < 1e-9);

        let folded = angle_at(
            Vector2::new(2.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(3.0, 0.0),
        )
        .unwrap();
        assert!(folded.abs() < 1e-9);
    }

    #[test]
    fn angles_stay_in_range_for_scattered_points() {
        let coords = [-1.3, -0.2, 0.0, 0.15, 0.5, 0.99, 2.4];
        for &ax in &coords {
            for &by in &coords {
                for &cx in &coords {
                    let result = angle_at(
                        Vector2::new(ax, by),
                        Vector2::new(0.31, -0.07),
                        Vector2::new(cx, ax * 0.5),
                    );
                    if let Ok(angle) = result {
                        assert!((0.0..=180.0).contains(&angle), "angle {angle} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn depth_is_ignored() {
        let mut set = FrameLandmarks::new();
        set.insert(PoseLandmark::LeftShoulder, Landmark::new(0.5, 0.3, -4.0));
        set.insert(PoseLandmark::LeftElbow, Landmark::new(0.5, 0.5, 0.0));
        set.insert(PoseLandmark::LeftWrist, Landmark::new(0.7, 0.5, 9.0));
        let angles = calculate_angles(&set);
        assert!((angles[&Joint::LeftElbow] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_segment_is_an_error() {
        let p = Vector2::new(0.4, 0.4);
        assert_eq!(angle_at(p, p, Vector2::new(0.1, 0.2)), Err(AngleError::DegenerateSegment));
        assert_eq!(
            angle_at(Vector2::new(f64::NAN, 0.0), p, Vector2::new(0.1, 0.2)),
            Err(AngleError::NonFinite)
        );
    }

    #[test]
    fn missing_landmarks_omit_only_their_angle() {
        let mut set = FrameLandmarks::new();
        set.insert(PoseLandmark::LeftHip, lm(0.5, 0.5));
        set.insert(PoseLandmark::LeftKnee, lm(0.5, 0.7));
        set.insert(PoseLandmark::LeftAnkle, lm(0.5, 0.9));
        set.insert(PoseLandmark::RightShoulder, lm(0.6, 0.3));

        let angles = calculate_angles(&set);
        assert_eq!(angles.len(), 1);
        assert!((angles[&Joint::LeftKnee] - 180.0).abs() < 1e-9);
        assert!(!angles.contains_key(&Joint::RightElbow));
    }

    #[test]
    fn degenerate_angle_does_not_block_the_others() {
        let mut set = FrameLandmarks::new();
        // Left elbow collapsed onto the wrist.
        set.insert(PoseLandmark::LeftShoulder, lm(0.3, 0.3));
        set.insert(PoseLandmark::LeftElbow, lm(0.3, 0.5));
        set.insert(PoseLandmark::LeftWrist, lm(0.3, 0.5));
        set.insert(PoseLandmark::RightShoulder, lm(0.6, 0.3));
        set.insert(PoseLandmark::RightElbow, lm(0.6, 0.5));
        set.insert(PoseLandmark::RightWrist, lm(0.8, 0.5));

        let angles = calculate_angles(&set);
        assert!(!angles.contains_key(&Joint::LeftElbow));
        assert!((angles[&Joint::RightElbow] - 90.0).abs() < 1e-9);
    }
}
