// src/synthetic.rs - Deterministic landmark streams for demos and tests
use nalgebra::Vector2;
use std::f64::consts::PI;

use crate::landmarks::{FrameLandmarks, Landmark, PoseFrame, PoseLandmark, PoseStream};

const SEGMENT: f64 = 0.15;
/// Right side is offset slightly so left/right points never coincide.
const SIDES: [(Side, f64); 2] = [(Side::Left, 0.0), (Side::Right, 0.01)];

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn pick(self, left: PoseLandmark, right: PoseLandmark) -> PoseLandmark {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

/// Joint angle in degrees at frame `i`: starts at `hi`, bottoms out at `lo`
/// once per cycle.
pub fn oscillating_angle(i: usize, frames: usize, cycles: usize, lo: f64, hi: f64) -> f64 {
    let mid = (hi + lo) / 2.0;
    let amp = (hi - lo) / 2.0;
    let phase = 2.0 * PI * cycles as f64 * i as f64 / frames.max(1) as f64;
    mid + amp * phase.cos()
}

fn put(set: &mut FrameLandmarks, name: PoseLandmark, p: Vector2<f64>) {
    set.insert(name, Landmark::new(p.x, p.y, 0.0));
}

fn stream(frames: usize, fps: f64, build: impl Fn(usize) -> FrameLandmarks) -> PoseStream {
    PoseStream {
        fps,
        frames: (0..frames)
            .map(|i| PoseFrame {
                index: i,
                timestamp: i as f64 / fps,
                landmarks: build(i),
            })
            .collect(),
    }
}

/// Side-on push-up with a rigid plank and the elbow swinging 170 -> 45 deg.
pub fn pushup_stream(frames: usize, cycles: usize, fps: f64) -> PoseStream {
    use PoseLandmark::*;

    stream(frames, fps, |i| {
        let theta = oscillating_angle(i, frames, cycles, 45.0, 170.0).to_radians();
        let mut set = FrameLandmarks::new();

        for (side, dx) in SIDES {
            let elbow = Vector2::new(0.30 + dx, 0.55);
            let wrist = elbow + SEGMENT * Vector2::new(theta.sin(), -theta.cos());

            put(&mut set, side.pick(LeftShoulder, RightShoulder), Vector2::new(0.30 + dx, 0.40));
            put(&mut set, side.pick(LeftElbow, RightElbow), elbow);
            put(&mut set, side.pick(LeftWrist, RightWrist), wrist);
            put(&mut set, side.pick(LeftHip, RightHip), Vector2::new(0.55 + dx, 0.45));
            put(&mut set, side.pick(LeftKnee, RightKnee), Vector2::new(0.70 + dx, 0.475));
            put(&mut set, side.pick(LeftAnkle, RightAnkle), Vector2::new(0.85 + dx, 0.50));
        }
        set
    })
}

/// Front-on squat with knees over ankles and the knee bending 170 -> 80 deg.
pub fn squat_stream(frames: usize, cycles: usize, fps: f64) -> PoseStream {
    use PoseLandmark::*;

    stream(frames, fps, |i| {
        let theta = oscillating_angle(i, frames, cycles, 80.0, 170.0).to_radians();
        let mut set = FrameLandmarks::new();

        for (side, dx) in SIDES {
            let knee = Vector2::new(0.50 + dx, 0.70);
            let hip = knee + SEGMENT * Vector2::new(-theta.sin(), theta.cos());

            put(&mut set, side.pick(LeftKnee, RightKnee), knee);
            put(&mut set, side.pick(LeftAnkle, RightAnkle), Vector2::new(0.50 + dx, 0.85));
            put(&mut set, side.pick(LeftHip, RightHip), hip);
            put(&mut set, side.pick(LeftShoulder, RightShoulder), hip + Vector2::new(0.05, -0.25));
        }
        set
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::{calculate_angles, Joint};

    #[test]
    fn pushup_elbow_follows_the_oscillation() {
        let s = pushup_stream(30, 3, 30.0);
        for (i, frame) in s.frames.iter().enumerate() {
            let expected = oscillating_angle(i, 30, 3, 45.0, 170.0);
            let angles = calculate_angles(&frame.landmarks);
            assert!((angles[&Joint::LeftElbow] - expected).abs() < 1e-6);
            assert!((angles[&Joint::RightElbow] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn squat_knee_follows_the_oscillation() {
        let s = squat_stream(40, 2, 20.0);
        assert!((s.frames[10].timestamp - 0.5).abs() < 1e-12);
        for (i, frame) in s.frames.iter().enumerate() {
            let expected = oscillating_angle(i, 40, 2, 80.0, 170.0);
            let angles = calculate_angles(&frame.landmarks);
            assert!((angles[&Joint::LeftKnee] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn oscillation_spans_the_range() {
        assert!((oscillating_angle(0, 30, 3, 45.0, 170.0) - 170.0).abs() < 1e-9);
        assert!((oscillating_angle(5, 30, 3, 45.0, 170.0) - 45.0).abs() < 1e-9);
    }
}
