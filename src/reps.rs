// src/reps.rs - Repetition counting from cyclic joint-angle patterns
use tracing::debug;

use crate::angles::{Joint, JointAngles};
use crate::scoring::FrameRecord;

const MISSING_ANGLE: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementFamily {
    Push,
    Squat,
    Other,
}

impl MovementFamily {
    /// Substring match on the raw exercise name, so "pushup" and
    /// "Goblet Squat" still count as push and squat movements.
    pub fn detect(exercise: &str) -> Self {
        let lower = exercise.to_lowercase();
        if lower.contains("push") {
            MovementFamily::Push
        } else if lower.contains("squat") {
            MovementFamily::Squat
        } else {
            MovementFamily::Other
        }
    }

    fn joints(self) -> Option<(Joint, Joint)> {
        match self {
            MovementFamily::Push => Some((Joint::LeftElbow, Joint::RightElbow)),
            MovementFamily::Squat => Some((Joint::LeftKnee, Joint::RightKnee)),
            MovementFamily::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CycleCounter {
    pub smoothing_radius: usize,
    pub frames_per_estimated_rep: usize,
}

impl Default for CycleCounter {
    fn default() -> Self {
        Self {
            smoothing_radius: 3,
            frames_per_estimated_rep: 30,
        }
    }
}

impl CycleCounter {
    /// Repetitions in a full, ordered frame sequence. Callers handle the
    /// too-short case before getting here.
    pub fn count(&self, frames: &[FrameRecord], exercise: &str) -> u32 {
        let family = MovementFamily::detect(exercise);

        let Some((left, right)) = family.joints() else {
            let estimate = (frames.len() / self.frames_per_estimated_rep.max(1)).max(1);
            debug!("No cycle detection for {:?}, estimating {} reps", exercise, estimate);
            return estimate as u32;
        };

        let series: Vec<f64> = frames
            .iter()
            .map(|f| mean_joint_angle(&f.angles, left, right))
            .collect();

        let reps = self.count_cycles(&series).max(1);
        debug!("Detected {} reps for {:?} over {} frames", reps, family, frames.len());
        reps
    }

    pub fn count_cycles(&self, series: &[f64]) -> u32 {
        let smoothed = moving_average(series, self.smoothing_radius);
        let minima = local_minima(&smoothed);
        filter_minima(&minima, smoothed.len() / 10).len() as u32
    }
}

fn mean_joint_angle(angles: &JointAngles, left: Joint, right: Joint) -> f64 {
    let l = angles.get(&left).copied().unwrap_or(MISSING_ANGLE);
    let r = angles.get(&right).copied().unwrap_or(MISSING_ANGLE);
    (l + r) / 2.0
}

/// Centered moving average; the window shrinks at the edges.
pub fn moving_average(values: &[f64], radius: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(radius);
            let end = (i + radius + 1).min(values.len());
            let window = &values[start..end];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

pub fn local_minima(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] < values[i - 1] && values[i] < values[i + 1])
        .collect()
}

/// Greedy left-to-right filter: keep a minimum only if it is at least
/// `min_distance` frames after the last kept one.
pub fn filter_minima(minima: &[usize], min_distance: usize) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for &m in minima {
        match kept.last() {
            Some(&last) if m - last < min_distance => {}
            _ => kept.push(m),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::FrameLandmarks;
    use std::f64::consts::PI;

    fn records(elbow_series: &[f64]) -> Vec<FrameRecord> {
        elbow_series
            .iter()
            .enumerate()
            .map(|(i, &a)| FrameRecord {
                frame: i,
                landmarks: FrameLandmarks::new(),
                angles: JointAngles::from([(Joint::LeftElbow, a), (Joint::RightElbow, a)]),
                form_scores: Default::default(),
                timestamp: i as f64 / 30.0,
            })
            .collect()
    }

    fn troughs(len: usize, cycles: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 107.5 + 62.5 * (2.0 * PI * cycles as f64 * i as f64 / len as f64).cos())
            .collect()
    }

    #[test]
    fn smoothing_shrinks_window_at_edges() {
        let smoothed = moving_average(&[0.0, 6.0, 0.0, 6.0, 0.0], 1);
        assert_eq!(smoothed, vec![3.0, 2.0, 4.0, 2.0, 3.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn minima_are_strict_and_interior() {
        assert_eq!(local_minima(&[1.0, 0.0, 1.0, 1.0, 0.5, 0.5, 2.0]), vec![1]);
        assert!(local_minima(&[0.0, 1.0]).is_empty());
    }

    #[test]
    fn close_minima_are_merged() {
        assert_eq!(filter_minima(&[2, 4, 9, 10, 21], 5), vec![2, 9, 21]);
        assert_eq!(filter_minima(&[3, 4], 0), vec![3, 4]);
    }

    #[test]
    fn monotonic_series_floors_at_one_rep() {
        let falling: Vec<f64> = (0..40).map(|i| 170.0 - i as f64 * 2.0).collect();
        let counter = CycleCounter::default();
        assert_eq!(counter.count_cycles(&falling), 0);
        assert_eq!(counter.count(&records(&falling), "push_up"), 1);
    }

    #[test]
    fn counts_separated_troughs() {
        let counter = CycleCounter::default();
        assert_eq!(counter.count_cycles(&troughs(30, 3)), 3);
        assert_eq!(counter.count_cycles(&troughs(120, 4)), 4);
        assert_eq!(counter.count_cycles(&troughs(300, 5)), 5);
    }

    #[test]
    fn noise_inside_one_rep_is_not_double_counted() {
        // Two dips 3 frames apart inside a 60-frame series (min distance 6).
        let mut series = vec![160.0; 60];
        for (i, v) in [(20, 100.0), (21, 60.0), (22, 100.0), (24, 100.0), (25, 55.0), (26, 100.0)] {
            series[i] = v;
        }
        let counter = CycleCounter {
            smoothing_radius: 0,
            ..CycleCounter::default()
        };
        assert_eq!(counter.count_cycles(&series), 1);
    }

    #[test]
    fn family_detection_uses_substrings() {
        assert_eq!(MovementFamily::detect("Diamond Push-Up"), MovementFamily::Push);
        assert_eq!(MovementFamily::detect("pushup"), MovementFamily::Push);
        assert_eq!(MovementFamily::detect("GOBLET_SQUAT"), MovementFamily::Squat);
        assert_eq!(MovementFamily::detect("plank"), MovementFamily::Other);
    }

    #[test]
    fn unknown_family_uses_length_estimate() {
        let counter = CycleCounter::default();
        assert_eq!(counter.count(&records(&[90.0; 20]), "plank"), 1);
        assert_eq!(counter.count(&records(&[90.0; 95]), "plank"), 3);
    }

    #[test]
    fn knees_drive_squats() {
        let series = troughs(120, 4);
        let frames: Vec<FrameRecord> = series
            .iter()
            .enumerate()
            .map(|(i, &a)| FrameRecord {
                frame: i,
                landmarks: FrameLandmarks::new(),
                angles: JointAngles::from([(Joint::LeftKnee, a), (Joint::RightKnee, a)]),
                form_scores: Default::default(),
                timestamp: i as f64 / 30.0,
            })
            .collect();
        let counter = CycleCounter::default();
        assert_eq!(counter.count(&frames, "squat"), 4);
        // Elbows are missing here, so the push signal is flat.
        assert_eq!(counter.count(&frames, "push_up"), 1);
    }
}
