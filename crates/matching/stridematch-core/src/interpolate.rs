#![allow(dead_code)]
//! Continuous evaluation of a state's cached pose timeline.
//!
//! The cache is sampled at a fixed rate, so a query time maps to a
//! fractional index between two bracketing samples. Numeric features blend
//! linearly; facing blends shortest-arc; discrete fields snap to the nearest
//! sample. Out-of-range queries clamp to the last sample, no extrapolation.

use crate::hooks::LiveSkeletonSampler;
use crate::library::{MotionLibrary, PoseSample};
use crate::math::{lerp, yaw_nlerp};

/// Evaluate the pose of `state_index` at a continuous `time` into `out`.
///
/// `out` is a scratch sample reused across frames; its vectors are resized
/// as needed. When `live_bones` is present the bone features come from the
/// live skeleton (normalized here) rather than the offline cache.
pub fn evaluate_pose_sample(
    lib: &MotionLibrary,
    state_index: usize,
    time: f32,
    live_bones: Option<&dyn LiveSkeletonSampler>,
    out: &mut PoseSample,
) {
    let Some(state) = lib.states.get(state_index) else {
        return;
    };
    let poses = &state.cached_poses;
    if poses.is_empty() {
        return;
    }

    // Fractional sample index with the bracketing pair around it.
    let index_value = time / lib.sampling_rate;
    let earliest = index_value.floor() as isize;
    let latest = index_value.ceil() as isize;

    if earliest < 0 || latest as usize >= poses.len() {
        // Nothing to blend from/to; hold the last cached sample.
        *out = poses[poses.len() - 1].clone();
        return;
    }

    let current = &poses[earliest as usize];
    let next = &poses[latest as usize];
    let closest = &poses[index_value.round() as usize];
    let alpha = index_value - earliest as f32;

    // Discrete fields snap to the nearest sample.
    out.id = closest.id;
    out.state = closest.state;
    out.foot_locks = closest.foot_locks;
    out.time = time;

    out.root_velocity = current.root_velocity.lerp(next.root_velocity, alpha);

    // Rotational speed is assumed continuous across neighboring samples, so
    // a plain lerp is fine here; only facing needs wrap handling.
    out.root_rotation_speed = lerp(current.root_rotation_speed, next.root_rotation_speed, alpha);

    out.bones.clear();
    if let Some(sampler) = live_bones {
        // Live bone data arrives raw and is normalized on the fly.
        let live = sampler.bone_features();
        for (i, bone) in live.iter().enumerate().take(current.bones.len()) {
            out.bones.push(crate::library::BoneFeature {
                position: lib.bone_position_stats[i].normalize_vector(bone.position),
                velocity: lib.bone_velocity_stats[i].normalize_vector(bone.velocity),
            });
        }
    } else {
        for (bone, next_bone) in current.bones.iter().zip(&next.bones) {
            out.bones.push(crate::library::BoneFeature {
                position: bone.position.lerp(next_bone.position, alpha),
                velocity: bone.velocity.lerp(next_bone.velocity, alpha),
            });
        }
    }

    out.trajectory.clear();
    for (point, next_point) in current.trajectory.iter().zip(&next.trajectory) {
        out.trajectory.push(crate::library::TrajectoryPoint {
            position: point.position.lerp(next_point.position, alpha),
            facing: yaw_nlerp(point.facing, next_point.facing, alpha),
            time_offset: point.time_offset,
        });
    }
}
