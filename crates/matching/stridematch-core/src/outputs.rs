#![allow(dead_code)]
//! Output contracts from the runtime matcher.
//!
//! `TickOutput` is what the host needs every tick to drive playback;
//! `Transition` describes an accepted switch; `DebugSnapshot` is a pull-based
//! view for presentation layers, produced on demand rather than pushed.

use serde::{Deserialize, Serialize};

use crate::ids::{PoseId, StateId};
use crate::library::{BoneFeature, TrajectoryPoint};
use crate::math::Vec3;

/// Playback directive for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Index of the state whose clip should play.
    pub state_index: usize,
    /// Index of the matched pose within that state.
    pub pose_index: usize,
    /// Clip time to play from.
    pub play_time: f32,
    pub looping: bool,

    /// Playback rate correction toward the desired trajectory speed.
    pub time_scale_warp: f32,
    /// Steering correction in degrees applied to the root.
    pub root_rotation_warp: f32,
    /// Spring-smoothed root translation warp velocity (ground plane).
    pub root_warp_velocity: Vec3,
    /// Yaw applied this tick from facing input.
    pub yaw_step: f32,

    /// Foot IK alphas for [left, right], 1.0 while the pose holds the foot
    /// planted.
    pub ik_alpha: [f32; 2],

    /// True on the tick an animation switch was accepted.
    pub switched: bool,
}

/// An accepted pose switch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub pose: PoseId,
    pub pose_index: usize,
    pub play_time: f32,
    pub blend_time: f32,
    pub cost: f32,
}

/// Read-only view of the matcher's internals for presentation layers.
/// Trajectories and bone features are denormalized back to raw units.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    pub state_index: usize,
    pub pose_index: usize,
    pub play_time: f32,
    pub last_cost: f32,
    pub steady_bias: f32,
    pub time_scale_warp: f32,
    pub root_rotation_warp: f32,
    pub current_trajectory: Vec<TrajectoryPoint>,
    pub desired_trajectory: Vec<TrajectoryPoint>,
    pub current_bones: Vec<BoneFeature>,
    pub foot_locks: [bool; 2],
}
