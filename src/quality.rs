// src/quality.rs - Timing, consistency and smoothness over a scored frame sequence
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::landmarks::PoseLandmark;
use crate::rules::Checkpoint;
use crate::scoring::{CheckpointScores, FrameRecord};

/// Joints whose frame-to-frame motion feeds the smoothness metric.
const TRACKED_JOINTS: [PoseLandmark; 4] = [
    PoseLandmark::LeftElbow,
    PoseLandmark::RightElbow,
    PoseLandmark::LeftKnee,
    PoseLandmark::RightKnee,
];

// Uncalibrated scale factors, kept for compatibility with existing scores.
const CONSISTENCY_STDDEV_WEIGHT: f64 = 2.0;
const SMOOTHNESS_VARIANCE_WEIGHT: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    Controlled,
    Fast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingAnalysis {
    pub total_duration: f64,
    pub average_rep_time: f64,
    pub tempo: Tempo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub consistency: f64,
    pub smoothness: f64,
    pub overall_quality: f64,
}

/// Aggregate of a full frame sequence, before feedback text is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementAnalysis {
    pub rep_count: u32,
    pub timing: TimingAnalysis,
    pub average_scores: CheckpointScores,
    pub quality: QualityMetrics,
}

pub fn analyze_timing(frames: &[FrameRecord], rep_count: u32, controlled_threshold: f64) -> TimingAnalysis {
    let total_duration = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => last.timestamp - first.timestamp,
        _ => 0.0,
    };
    let average_rep_time = total_duration / rep_count.max(1) as f64;

    TimingAnalysis {
        total_duration,
        average_rep_time,
        tempo: if average_rep_time > controlled_threshold {
            Tempo::Controlled
        } else {
            Tempo::Fast
        },
    }
}

/// Mean score per checkpoint over the frames in which it appears.
pub fn average_scores(frames: &[FrameRecord]) -> CheckpointScores {
    let mut sums: BTreeMap<Checkpoint, (f64, usize)> = BTreeMap::new();
    for frame in frames {
        for (&checkpoint, &score) in &frame.form_scores {
            let entry = sums.entry(checkpoint).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(checkpoint, (total, count))| (checkpoint, total / count as f64))
        .collect()
}

pub fn quality_metrics(frames: &[FrameRecord]) -> QualityMetrics {
    let consistency = consistency(frames);
    let smoothness = smoothness(frames);

    QualityMetrics {
        consistency,
        smoothness,
        overall_quality: (consistency + smoothness) / 2.0,
    }
}

/// Penalizes spread of the per-frame average score (population stddev).
pub fn consistency(frames: &[FrameRecord]) -> f64 {
    let frame_averages: Vec<f64> = frames.iter().filter_map(FrameRecord::average_score).collect();
    if frame_averages.len() < 2 {
        return 100.0;
    }

    let std_dev = population_variance(&frame_averages).sqrt();
    (100.0 - std_dev * CONSISTENCY_STDDEV_WEIGHT).clamp(0.0, 100.0)
}

/// Penalizes variance of the mean joint displacement between frames.
pub fn smoothness(frames: &[FrameRecord]) -> f64 {
    if frames.len() < 3 {
        return 100.0;
    }

    let velocities: Vec<f64> = frames
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let changes: Vec<f64> = TRACKED_JOINTS
                .iter()
                .filter_map(|&joint| {
                    let before = prev.landmarks.get(joint)?;
                    let after = curr.landmarks.get(joint)?;
                    Some((after.planar() - before.planar()).norm())
                })
                .collect();

            if changes.is_empty() {
                None
            } else {
                Some(changes.iter().sum::<f64>() / changes.len() as f64)
            }
        })
        .collect();

    if velocities.len() < 2 {
        return 100.0;
    }

    let score = 100.0 - population_variance(&velocities) * SMOOTHNESS_VARIANCE_WEIGHT;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

fn population_variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{FrameLandmarks, Landmark};

    fn record(i: usize, scores: &[(Checkpoint, f64)], elbow_x: f64) -> FrameRecord {
        let mut landmarks = FrameLandmarks::new();
        landmarks.insert(PoseLandmark::LeftElbow, Landmark::new(elbow_x, 0.5, 0.0));
        FrameRecord {
            frame: i,
            landmarks,
            angles: Default::default(),
            form_scores: scores.iter().copied().collect(),
            timestamp: i as f64 / 30.0,
        }
    }

    #[test]
    fn timing_uses_first_and_last_timestamps() {
        let frames: Vec<_> = (0..91).map(|i| record(i, &[], 0.5)).collect();
        let timing = analyze_timing(&frames, 1, 2.0);
        assert!((timing.total_duration - 3.0).abs() < 1e-9);
        assert_eq!(timing.tempo, Tempo::Controlled);

        let timing = analyze_timing(&frames, 3, 2.0);
        assert!((timing.average_rep_time - 1.0).abs() < 1e-9);
        assert_eq!(timing.tempo, Tempo::Fast);

        // Zero reps divides by one.
        let timing = analyze_timing(&frames, 0, 2.0);
        assert!((timing.average_rep_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn exactly_two_seconds_is_fast() {
        let frames: Vec<_> = (0..61).map(|i| record(i, &[], 0.5)).collect();
        assert_eq!(analyze_timing(&frames, 1, 2.0).tempo, Tempo::Fast);
    }

    #[test]
    fn averages_skip_unobserved_checkpoints() {
        let frames = vec![
            record(0, &[(Checkpoint::Depth, 100.0)], 0.5),
            record(1, &[(Checkpoint::Depth, 60.0), (Checkpoint::KneeTracking, 40.0)], 0.5),
        ];
        let avg = average_scores(&frames);
        assert_eq!(avg[&Checkpoint::Depth], 80.0);
        assert_eq!(avg[&Checkpoint::KneeTracking], 40.0);
        assert!(!avg.contains_key(&Checkpoint::BackPosition));
    }

    #[test]
    fn consistency_uses_population_stddev() {
        let frames = vec![
            record(0, &[(Checkpoint::Depth, 60.0)], 0.5),
            record(1, &[(Checkpoint::Depth, 80.0)], 0.5),
        ];
        // stddev 10 -> 100 - 20
        assert!((consistency(&frames) - 80.0).abs() < 1e-9);

        let single = vec![record(0, &[(Checkpoint::Depth, 10.0)], 0.5)];
        assert_eq!(consistency(&single), 100.0);

        let erratic: Vec<_> = (0..10)
            .map(|i| record(i, &[(Checkpoint::Depth, if i % 2 == 0 { 0.0 } else { 100.0 })], 0.5))
            .collect();
        assert_eq!(consistency(&erratic), 0.0);
    }

    #[test]
    fn steady_motion_is_perfectly_smooth() {
        let frames: Vec<_> = (0..10).map(|i| record(i, &[], 0.1 + i as f64 * 0.01)).collect();
        assert!((smoothness(&frames) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn jerky_motion_loses_smoothness() {
        let xs = [0.1, 0.1, 0.5, 0.5, 0.1, 0.1, 0.5];
        let frames: Vec<_> = xs.iter().enumerate().map(|(i, &x)| record(i, &[], x)).collect();
        // velocities alternate 0 / 0.4 -> variance near 0.04 -> 100 - 40
        let s = smoothness(&frames);
        assert!(s < 70.0 && s > 50.0, "smoothness {s}");
    }

    #[test]
    fn short_sequences_are_smooth() {
        let frames = vec![record(0, &[], 0.1), record(1, &[], 0.9)];
        assert_eq!(smoothness(&frames), 100.0);
    }

    #[test]
    fn overall_quality_is_the_mean() {
        let frames = vec![
            record(0, &[(Checkpoint::Depth, 60.0)], 0.5),
            record(1, &[(Checkpoint::Depth, 80.0)], 0.5),
        ];
        let q = quality_metrics(&frames);
        assert!((q.overall_quality - (q.consistency + q.smoothness) / 2.0).abs() < 1e-12);
    }
}
