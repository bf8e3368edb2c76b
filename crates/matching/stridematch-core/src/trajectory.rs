#![allow(dead_code)]
//! Desired-trajectory synthesis.
//!
//! Each tick this blends three sources into the trajectory feature of the
//! live query: recorded history for past points, a velocity projection for
//! the near future, and the player's input direction for the far future. The
//! furthest point always carries the raw desired facing so the trajectory
//! tail states player intent exactly.

use crate::inputs::{CharacterFrame, MatcherInput};
use crate::library::TrajectoryPoint;
use crate::math::{interp_to, interp_to_vec, normalize_angle, Vec3};

/// Seconds between past-history snapshots.
pub const RECORD_SAMPLE_RATE: f32 = 0.03;

/// Input stick units are normalized; this converts them to world speed.
const INPUT_SPEED_SCALE: f32 = 120.0;

/// One recorded character state, newest at index 0. Ages continuously;
/// rewinding subtracts the recorded velocity over the remaining gap so a
/// short ring covers arbitrary rewind times without true animation history.
#[derive(Clone, Copy, Debug, Default)]
pub struct PastSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub age: f32,
}

/// Per-character synthesizer state.
#[derive(Debug)]
pub struct TrajectorySynthesizer {
    timings: Vec<f32>,
    first_future: usize,
    furthest_time: f32,
    history: Vec<PastSnapshot>,
    time_since_record: f32,
    desired: Vec<TrajectoryPoint>,
    smoothed_direction: Vec3,
    input_steady: Vec3,
    steady_bias: f32,
}

impl TrajectorySynthesizer {
    /// `timings` must be the library's sorted trajectory timings.
    pub fn new(timings: &[f32]) -> Self {
        let first_future = timings.iter().position(|t| *t >= 0.0).unwrap_or(0);
        let furthest_time = timings.last().copied().unwrap_or(0.0);

        // History ring sized for the oldest rewind the timings ask for.
        let history = if timings.first().copied().unwrap_or(0.0) < 0.0 {
            let max_history = timings[0].abs();
            let count = (max_history / RECORD_SAMPLE_RATE).ceil() as usize + 1;
            vec![PastSnapshot::default(); count]
        } else {
            Vec::new()
        };

        Self {
            first_future,
            furthest_time,
            history,
            time_since_record: 0.0,
            desired: timings
                .iter()
                .map(|&time_offset| TrajectoryPoint {
                    time_offset,
                    ..TrajectoryPoint::default()
                })
                .collect(),
            timings: timings.to_vec(),
            smoothed_direction: Vec3::ZERO,
            input_steady: Vec3::ZERO,
            steady_bias: 1.0,
        }
    }

    /// Rebuild the desired trajectory from the current frame and input, then
    /// advance the history recording.
    pub fn update(
        &mut self,
        dt: f32,
        frame: &CharacterFrame,
        input: &MatcherInput,
        turn_speed: f32,
        speed_multiplier: f32,
    ) {
        self.time_since_record += dt;

        self.smoothed_direction = interp_to_vec(
            self.smoothed_direction,
            input.desired_direction * (speed_multiplier * INPUT_SPEED_SCALE),
            dt,
            12.0,
        );

        // Steadiness: how far the raw input has drifted from a slow-moving
        // copy of itself, plus a penalty for active facing input.
        self.input_steady = interp_to_vec(self.input_steady, input.desired_direction, dt, 0.4);
        let input_jitter = input.desired_direction.dist_squared(self.input_steady);
        let facing_jitter = input.desired_facing.abs() * 0.02;
        self.steady_bias = 1.0 - (input_jitter + facing_jitter).clamp(0.0, 1.0);

        let last = self.timings.len().saturating_sub(1);
        for i in 0..self.timings.len() {
            let timing = self.timings[i];

            if timing < 0.0 {
                self.desired[i] = self.past_point(timing, frame);
            } else {
                let alpha = if self.furthest_time > 0.0 {
                    timing / self.furthest_time
                } else {
                    1.0
                };

                let projected = (frame.velocity * timing).rotate_yaw(-frame.yaw);
                let position = projected.lerp(self.smoothed_direction * timing, alpha);

                let facing = if i == last {
                    // The trajectory tail matches player intent exactly.
                    input.desired_facing
                } else {
                    interp_to(
                        turn_speed * timing,
                        input.desired_facing * timing,
                        alpha,
                        3.0,
                    )
                    .clamp(-90.0, 90.0)
                };

                self.desired[i] = TrajectoryPoint {
                    position,
                    facing,
                    time_offset: timing,
                };
            }
        }

        // Record after building, so the newest snapshot is never the one a
        // zero-age rewind would land on.
        if self.time_since_record > RECORD_SAMPLE_RATE && !self.history.is_empty() {
            self.time_since_record = 0.0;
            self.history.pop();
            self.history.insert(
                0,
                PastSnapshot {
                    position: frame.position,
                    velocity: frame.velocity,
                    yaw: frame.yaw,
                    age: 0.0,
                },
            );
        }

        for snapshot in &mut self.history {
            snapshot.age += dt;
        }
    }

    fn past_point(&self, timing: f32, frame: &CharacterFrame) -> TrajectoryPoint {
        let rewind = timing.abs();
        let index = (rewind / RECORD_SAMPLE_RATE).round() as usize;

        let mut point = TrajectoryPoint {
            time_offset: timing,
            ..TrajectoryPoint::default()
        };

        if let Some(snapshot) = self.history.get(index) {
            // A zero position is a default (never written) snapshot.
            if snapshot.position != Vec3::ZERO {
                let position = snapshot.position + snapshot.velocity * snapshot.age
                    - snapshot.velocity * rewind
                    - frame.position;
                point.position = position.rotate_yaw(-frame.yaw);
                point.facing = normalize_angle(snapshot.yaw - frame.yaw);
            }
        }

        point
    }

    /// The raw (unnormalized) desired trajectory built by the last update.
    #[inline]
    pub fn desired(&self) -> &[TrajectoryPoint] {
        &self.desired
    }

    /// Index of the first non-negative trajectory timing.
    #[inline]
    pub fn first_future_index(&self) -> usize {
        self.first_future
    }

    /// 1.0 when input has been steady recently, falling toward 0.0 under
    /// jittery direction or active facing input.
    #[inline]
    pub fn steady_bias(&self) -> f32 {
        self.steady_bias
    }

    /// Smoothed desired direction, world-speed scaled.
    #[inline]
    pub fn smoothed_direction(&self) -> Vec3 {
        self.smoothed_direction
    }

    /// Recorded history, newest first.
    #[inline]
    pub fn snapshots(&self) -> &[PastSnapshot] {
        &self.history
    }
}
