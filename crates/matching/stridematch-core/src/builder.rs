#![allow(dead_code)]
//! Offline cache builder: samples every state's clip into pose samples,
//! extracts yaw-aligned root/bone features and trajectories, then runs the
//! normalization pass and marks the library built.

use crate::clip::ClipEvaluator;
use crate::error::MotionDataError;
use crate::ids::{ClipId, PoseId, StateId};
use crate::library::{
    AnimationState, BoneFeature, MotionLibrary, PoseSample, TrajectoryPoint, MATCH_INTERVAL,
};
use crate::normalize::normalize_library;

/// Length of the boundary velocity sample used when a trajectory point lands
/// outside the clip.
const BOUNDARY_SAMPLE_TIME: f32 = 0.1;

/// Poses keep a margin this far from the clip end so every sample still has
/// room for its velocity lookahead and some future trajectory.
const TRAILING_TRIM: f32 = 0.25;

/// Root-space radial speed under which a foot counts as planted.
const FOOT_PLANT_SPEED: f32 = 0.5;

/// Counts reported after a successful build.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuildReport {
    pub states_built: usize,
    pub poses_cached: usize,
}

struct BuildContext {
    sampling_rate: f32,
    timings: Vec<f32>,
    bones: Vec<String>,
    feet: [Option<String>; 2],
}

/// Rebuild the whole pose cache from the animation set.
///
/// Exclusive (`&mut`) access serializes rebuilds against live queries; a
/// matcher holding the library across this call is a compile error, not a
/// torn read.
pub fn build_library(
    lib: &mut MotionLibrary,
    clips: &dyn ClipEvaluator,
) -> Result<BuildReport, MotionDataError> {
    lib.validate()?;

    lib.trajectory_timings.sort_by(f32::total_cmp);

    let ctx = BuildContext {
        sampling_rate: lib.sampling_rate,
        timings: lib.trajectory_timings.clone(),
        bones: lib.matching_bones.clone(),
        feet: [lib.left_foot.clone(), lib.right_foot.clone()],
    };

    // A rebuild starts from raw features again.
    lib.normalized = false;
    lib.built = false;

    let mut next_pose = 0u32;
    let mut states_built = 0usize;

    for (index, state) in lib.states.iter_mut().enumerate() {
        state.id = StateId(index as u32);

        let Some(clip) = state.clip else {
            state.cached_poses.clear();
            continue;
        };

        build_state(state, clip, clips, &ctx, &mut next_pose);
        states_built += 1;
    }

    normalize_library(lib)?;

    lib.built = true;
    lib.outdated = false;

    let report = BuildReport {
        states_built,
        poses_cached: next_pose as usize,
    };
    log::info!(
        "motion cache built: {} states, {} poses",
        report.states_built,
        report.poses_cached
    );
    Ok(report)
}

fn build_state(
    state: &mut AnimationState,
    clip: ClipId,
    clips: &dyn ClipEvaluator,
    ctx: &BuildContext,
    next_pose: &mut u32,
) {
    state.cached_poses.clear();

    let clip_length = clips.clip_length(clip);
    state.clip_length = clip_length;

    let end_time = clip_length - MATCH_INTERVAL - TRAILING_TRIM;

    let mut time = 0.0f32;
    while time < end_time {
        let current_root = clips.root_transform_at(clip, time);
        let future_root = clips.root_transform_at(clip, time + MATCH_INTERVAL);

        let root_velocity = ((future_root.position - current_root.position)
            * (1.0 / MATCH_INTERVAL))
            .rotate_yaw(-current_root.yaw);
        let root_rotation_speed = (future_root.yaw - current_root.yaw) / MATCH_INTERVAL;

        // Foot plants: a foot whose clip-space radial motion stalls over the
        // lookahead is considered planted.
        let mut foot_locks = [false, false];
        for (foot, name) in ctx.feet.iter().enumerate() {
            let Some(name) = name else { continue };
            let a = clips.bone_transform_at(clip, name, time, false);
            let b = clips.bone_transform_at(clip, name, time + MATCH_INTERVAL, false);
            let radial_speed = (b.position.length() - a.position.length()).abs();
            foot_locks[foot] = radial_speed < FOOT_PLANT_SPEED;
        }

        let mut bones = Vec::with_capacity(ctx.bones.len());
        for name in &ctx.bones {
            let bone = clips.bone_transform_at(clip, name, time, false);
            let future_bone = clips.bone_transform_at(clip, name, time + MATCH_INTERVAL, false);

            let position = current_root.inverse_transform_position(bone.position);
            let future_position = future_root.inverse_transform_position(future_bone.position);

            bones.push(BoneFeature {
                position,
                velocity: (future_position - position) * (1.0 / MATCH_INTERVAL),
            });
        }

        let mut trajectory = Vec::with_capacity(ctx.timings.len());
        for &time_offset in &ctx.timings {
            let point_time = time + time_offset;

            let point = if point_time < 0.0 || point_time > end_time {
                extrapolate_point(clips, clip, clip_length, &current_root, time_offset)
            } else {
                let point_root = clips.root_transform_at(clip, point_time);
                let relative = (point_root.position - current_root.position)
                    .rotate_yaw(-current_root.yaw);
                TrajectoryPoint {
                    position: relative,
                    facing: crate::math::normalize_angle(point_root.yaw - current_root.yaw),
                    time_offset,
                }
            };
            trajectory.push(point);
        }

        state.cached_poses.push(PoseSample {
            id: PoseId(*next_pose),
            state: state.id,
            time,
            bones,
            root_velocity,
            root_rotation_speed,
            trajectory,
            foot_locks,
        });
        *next_pose += 1;

        time += ctx.sampling_rate;
    }
}

/// Estimate a trajectory point that falls outside the clip from a short
/// velocity sample at the nearest clip boundary.
///
/// The forward and backward cases are intentionally not symmetric: forward
/// keeps the fully yaw-aligned velocity, backward half-blends the unrotated
/// and rotated vectors. The cache format inherits this shape, so both sides
/// of a match see the same convention.
fn extrapolate_point(
    clips: &dyn ClipEvaluator,
    clip: ClipId,
    clip_length: f32,
    current_root: &crate::clip::ClipTransform,
    time_offset: f32,
) -> TrajectoryPoint {
    let position = if time_offset > 0.0 {
        // Forward: sample velocity just before the clip end.
        let a = clips
            .root_transform_at(clip, clip_length - BOUNDARY_SAMPLE_TIME)
            .position;
        let b = clips.root_transform_at(clip, clip_length).position;
        let velocity =
            ((b - a) * (1.0 / BOUNDARY_SAMPLE_TIME)).rotate_yaw(-current_root.yaw);
        velocity * time_offset.abs()
    } else {
        // Backward: sample velocity just after the clip start, pointing back
        // in time, and split the difference on the yaw alignment.
        let a = clips
            .root_transform_at(clip, BOUNDARY_SAMPLE_TIME)
            .position;
        let b = clips.root_transform_at(clip, 0.0).position;
        let velocity = (b - a) * (1.0 / BOUNDARY_SAMPLE_TIME);
        let raw = velocity * time_offset.abs();
        raw.lerp(raw.rotate_yaw(-current_root.yaw), 0.5)
    };

    TrajectoryPoint {
        position,
        // No facing change is assumed beyond the clip.
        facing: 0.0,
        time_offset,
    }
}
