#![allow(dead_code)]
//! Feature normalization pass.
//!
//! Aggregates per-channel mean and variance over every cached pose in two
//! full passes, then rewrites all feature fields in place as z-scores with
//! the user weights folded in. Heterogeneous units (cm, cm/s, degrees) end
//! up comparable inside one squared distance.

use crate::error::MotionDataError;
use crate::library::{ChannelStats, MotionLibrary};

/// Compute statistics and normalize the whole library in place.
///
/// Running this twice would silently corrupt the cached features, so an
/// already-normalized library is rejected outright.
pub fn normalize_library(lib: &mut MotionLibrary) -> Result<(), MotionDataError> {
    if lib.is_normalized() {
        return Err(MotionDataError::AlreadyNormalized);
    }

    let timing_count = lib.trajectory_timings.len();
    let bone_count = lib.matching_bones.len();

    lib.root_velocity_stats.reset();
    lib.root_rotation_stats.reset();
    lib.trajectory_position_stats = vec![ChannelStats::default(); timing_count];
    lib.trajectory_facing_stats = vec![ChannelStats::default(); timing_count];
    lib.bone_position_stats = vec![ChannelStats::default(); bone_count];
    lib.bone_velocity_stats = vec![ChannelStats::default(); bone_count];

    // Pass 1: sums and means.

    for state in &lib.states {
        for pose in &state.cached_poses {
            lib.root_velocity_stats.accumulate_vector(pose.root_velocity);
            lib.root_rotation_stats
                .accumulate_scalar(pose.root_rotation_speed);

            for (i, point) in pose.trajectory.iter().enumerate() {
                lib.trajectory_position_stats[i].accumulate_vector(point.position);
                lib.trajectory_facing_stats[i].accumulate_scalar(point.facing);
            }

            for (i, bone) in pose.bones.iter().enumerate() {
                lib.bone_position_stats[i].accumulate_vector(bone.position);
                lib.bone_velocity_stats[i].accumulate_vector(bone.velocity);
            }
        }
    }

    lib.root_velocity_stats.finish_mean();
    lib.root_rotation_stats.finish_mean();
    for stats in lib
        .trajectory_position_stats
        .iter_mut()
        .chain(lib.trajectory_facing_stats.iter_mut())
        .chain(lib.bone_position_stats.iter_mut())
        .chain(lib.bone_velocity_stats.iter_mut())
    {
        stats.finish_mean();
    }

    // Pass 2: variances.

    for state in &lib.states {
        for pose in &state.cached_poses {
            lib.root_velocity_stats
                .accumulate_vector_deviation(pose.root_velocity);
            lib.root_rotation_stats
                .accumulate_scalar_deviation(pose.root_rotation_speed);

            for (i, point) in pose.trajectory.iter().enumerate() {
                lib.trajectory_position_stats[i].accumulate_vector_deviation(point.position);
                lib.trajectory_facing_stats[i].accumulate_scalar_deviation(point.facing);
            }

            for (i, bone) in pose.bones.iter().enumerate() {
                lib.bone_position_stats[i].accumulate_vector_deviation(bone.position);
                lib.bone_velocity_stats[i].accumulate_vector_deviation(bone.velocity);
            }
        }
    }

    lib.root_velocity_stats
        .finish_variance(lib.root_velocity_weight);
    lib.root_rotation_stats.finish_variance(1.0);

    for i in 0..timing_count {
        let position_weight = lib.trajectory_weight
            * lib.trajectory_weights.get(i).copied().unwrap_or(1.0);
        let facing_weight = lib.trajectory_facing_weight
            * lib.trajectory_facing_weights.get(i).copied().unwrap_or(1.0);
        lib.trajectory_position_stats[i].finish_variance(position_weight);
        lib.trajectory_facing_stats[i].finish_variance(facing_weight);
    }

    for i in 0..bone_count {
        lib.bone_position_stats[i].finish_variance(lib.bone_position_weight);
        lib.bone_velocity_stats[i].finish_variance(lib.bone_velocity_weight);
    }

    // Pass 3: rewrite every feature in place as a weighted z-score.

    // Move the states out so the stats stay borrowable while mutating poses.
    let mut states = core::mem::take(&mut lib.states);
    for state in &mut states {
        for pose in &mut state.cached_poses {
            pose.root_velocity = lib.root_velocity_stats.normalize_vector(pose.root_velocity);
            pose.root_rotation_speed = lib.root_rotation_stats.normalize(pose.root_rotation_speed);

            lib.normalize_trajectory(&mut pose.trajectory);

            for (i, bone) in pose.bones.iter_mut().enumerate() {
                bone.position = lib.bone_position_stats[i].normalize_vector(bone.position);
                bone.velocity = lib.bone_velocity_stats[i].normalize_vector(bone.velocity);
            }
        }
    }
    lib.states = states;
    lib.normalized = true;

    Ok(())
}
