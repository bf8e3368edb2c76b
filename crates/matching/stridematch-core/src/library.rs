#![allow(dead_code)]
//! Motion library data model: states, cached pose samples, trajectories and
//! per-channel normalization statistics.
//!
//! The library is an authored asset. It is mutated by the offline builder and
//! the normalization pass, then read-only for every live matcher; rebuild
//! requires exclusive access (`&mut`), which is what keeps runtime queries
//! tear-free without locking.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::MotionDataError;
use crate::ids::{ClipId, PoseId, StateId};
use crate::math::Vec3;

/// Seconds between pose searches, and the lookahead used for velocity
/// extraction while building the cache.
pub const MATCH_INTERVAL: f32 = 0.03;

/// Remaining-clip threshold under which a non-looping state must hand over to
/// a loop, and the fallback blend window.
pub const MATCH_BLEND_TIME: f32 = 0.4;

/// One point of a trajectory: a root-relative, yaw-aligned position plus a
/// signed facing delta in degrees, at a fixed time offset (negative = past).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub position: Vec3,
    pub facing: f32,
    pub time_offset: f32,
}

/// Root-relative position and velocity of one tracked bone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoneFeature {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// One pose frozen in time, with its past/future trajectory. Immutable after
/// the build + normalization pass; the only mutable instance at runtime is
/// the per-matcher interpolated "current pose".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Unique across the whole library, assigned in build order.
    pub id: PoseId,
    pub state: StateId,
    /// Time within the owning clip, seconds.
    pub time: f32,
    pub bones: Vec<BoneFeature>,
    /// Root velocity, yaw-aligned (expressed relative to the facing at the
    /// sample time, so it is orientation-invariant).
    pub root_velocity: Vec3,
    /// Signed yaw speed of the root, degrees per second.
    pub root_rotation_speed: f32,
    pub trajectory: Vec<TrajectoryPoint>,
    /// Planted flags for [left, right] foot.
    pub foot_locks: [bool; 2],
}

/// One animation "state" as a traditional state machine would have it
/// (idle, walk loop, stop transition, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnimationState {
    pub id: StateId,
    pub clip: Option<ClipId>,
    /// Moving loop or idle animation.
    pub looping: bool,
    /// Transition into a stop/idle. Incompatible with `looping`.
    pub stopping: bool,
    /// Cached clip length, captured at build time so the runtime never has to
    /// reach back into the clip evaluator.
    #[serde(default)]
    pub clip_length: f32,
    /// Blend times for particular target states, keyed by state id.
    #[serde(default)]
    pub custom_blend_times: HashMap<u32, f32>,
    /// What gets matched against.
    #[serde(default)]
    pub cached_poses: Vec<PoseSample>,
}

impl AnimationState {
    pub fn new(clip: Option<ClipId>, looping: bool, stopping: bool) -> Self {
        Self {
            id: StateId(0),
            clip,
            looping,
            stopping,
            clip_length: 0.0,
            custom_blend_times: HashMap::new(),
            cached_poses: Vec::new(),
        }
    }
}

/// Per-channel z-score statistics plus the user weight folded into
/// normalization. Vector channels treat X/Y/Z as three samples of one shared
/// channel, so `count` advances by 3 per vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub count: f32,
    pub sum: f32,
    pub mean: f32,
    pub variance: f32,
    pub std_dev: f32,
    pub std_inverse: f32,
    pub user_weight: f32,
}

impl Default for ChannelStats {
    fn default() -> Self {
        Self {
            count: 0.0,
            sum: 0.0,
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            std_inverse: 0.0,
            user_weight: 1.0,
        }
    }
}

impl ChannelStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn accumulate_scalar(&mut self, v: f32) {
        self.count += 1.0;
        self.sum += v;
    }

    #[inline]
    pub fn accumulate_vector(&mut self, v: Vec3) {
        self.count += 3.0;
        self.sum += v.x + v.y + v.z;
    }

    pub fn finish_mean(&mut self) {
        if self.count > 0.0 {
            self.mean = self.sum / self.count;
        }
    }

    #[inline]
    pub fn accumulate_scalar_deviation(&mut self, v: f32) {
        let d = v - self.mean;
        self.variance += d * d;
    }

    #[inline]
    pub fn accumulate_vector_deviation(&mut self, v: Vec3) {
        let dx = v.x - self.mean;
        let dy = v.y - self.mean;
        let dz = v.z - self.mean;
        self.variance += dx * dx + dy * dy + dz * dz;
    }

    /// Finalize variance and derive the deviation pair. A zero-variance
    /// channel gets a standard deviation of exactly 1.0 so normalization
    /// degenerates to `(v - mean) * weight` instead of producing infinities.
    pub fn finish_variance(&mut self, user_weight: f32) {
        if self.count > 0.0 {
            self.variance /= self.count;
        }
        self.std_dev = if self.variance != 0.0 {
            self.variance.sqrt()
        } else {
            1.0
        };
        self.std_inverse = 1.0 / self.std_dev;
        self.user_weight = user_weight;
    }

    #[inline]
    pub fn normalize(&self, v: f32) -> f32 {
        (v - self.mean) * self.std_inverse * self.user_weight
    }

    #[inline]
    pub fn normalize_vector(&self, v: Vec3) -> Vec3 {
        Vec3 {
            x: self.normalize(v.x),
            y: self.normalize(v.y),
            z: self.normalize(v.z),
        }
    }

    #[inline]
    pub fn denormalize(&self, v: f32) -> f32 {
        self.std_dev * (v / self.user_weight) + self.mean
    }

    #[inline]
    pub fn denormalize_vector(&self, v: Vec3) -> Vec3 {
        Vec3 {
            x: self.denormalize(v.x),
            y: self.denormalize(v.y),
            z: self.denormalize(v.z),
        }
    }
}

/// The motion data asset: settings, weights, animation set and the cached,
/// normalized pose library.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionLibrary {
    /// Cache resolution in seconds. Should be larger than one frame; larger
    /// values trade match quality for memory.
    pub sampling_rate: f32,

    /// Default blend duration between states, seconds.
    pub blend_time: f32,

    /// Time offsets of the trajectory points, seconds, sorted ascending.
    /// The same shape is used for every cached pose and for the live query.
    pub trajectory_timings: Vec<f32>,

    /// Bones considered when comparing the present pose against candidates.
    /// Editing this list invalidates the cache.
    pub matching_bones: Vec<String>,

    /// Foot bones for plant detection, by name within `matching_bones`.
    pub left_foot: Option<String>,
    pub right_foot: Option<String>,

    // Weights and biases.
    pub root_velocity_weight: f32,
    pub bone_position_weight: f32,
    pub bone_velocity_weight: f32,
    pub trajectory_weight: f32,
    pub trajectory_weights: Vec<f32>,
    pub trajectory_facing_weight: f32,
    pub trajectory_facing_weights: Vec<f32>,

    /// How much to keep playing the same animation and frame.
    pub natural_bias: f32,
    /// How much to prefer loops when input is steady.
    pub loop_bias: f32,
    /// How much to prefer stopping animations when stopping.
    pub stopping_bias: f32,

    pub states: Vec<AnimationState>,

    // Normalization statistics, one channel per feature.
    pub root_velocity_stats: ChannelStats,
    pub root_rotation_stats: ChannelStats,
    pub bone_position_stats: Vec<ChannelStats>,
    pub bone_velocity_stats: Vec<ChannelStats>,
    pub trajectory_position_stats: Vec<ChannelStats>,
    pub trajectory_facing_stats: Vec<ChannelStats>,

    /// Set whenever authoring data changes; cleared only by a successful
    /// rebuild. Matching continues against a stale cache (with a warning).
    pub outdated: bool,

    pub(crate) normalized: bool,
    pub(crate) built: bool,
}

impl Default for MotionLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionLibrary {
    pub fn new() -> Self {
        Self {
            sampling_rate: 0.044,
            blend_time: 0.25,
            trajectory_timings: vec![-0.25, 0.25, 0.5, 0.75, 1.0],
            matching_bones: Vec::new(),
            left_foot: None,
            right_foot: None,
            root_velocity_weight: 1.0,
            bone_position_weight: 1.0,
            bone_velocity_weight: 1.0,
            trajectory_weight: 1.0,
            trajectory_weights: vec![0.5, 0.5, 0.5, 0.5, 1.0],
            trajectory_facing_weight: 1.0,
            trajectory_facing_weights: vec![1.0, 2.0, 2.0, 1.5, 1.0],
            natural_bias: 1.0,
            loop_bias: 1.0,
            stopping_bias: 1.0,
            states: Vec::new(),
            root_velocity_stats: ChannelStats::default(),
            root_rotation_stats: ChannelStats::default(),
            bone_position_stats: Vec::new(),
            bone_velocity_stats: Vec::new(),
            trajectory_position_stats: Vec::new(),
            trajectory_facing_stats: Vec::new(),
            outdated: false,
            normalized: false,
            built: false,
        }
    }

    /// Check the invariants that make matching possible at all. Violations
    /// are the MissingData class: the caller should disable matching, not
    /// panic.
    pub fn validate(&self) -> Result<(), MotionDataError> {
        if self.states.is_empty() {
            return Err(MotionDataError::NoStates);
        }
        if self.states[0].clip.is_none() {
            return Err(MotionDataError::MissingClip(0));
        }
        if self.trajectory_timings.is_empty() {
            return Err(MotionDataError::NoTrajectoryTimings);
        }
        if self.matching_bones.is_empty() {
            return Err(MotionDataError::NoMatchingBones);
        }
        Ok(())
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    #[inline]
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Flag the cache as stale after an authoring edit. Matching keeps
    /// working against the old cache until the next rebuild.
    pub fn mark_outdated(&mut self) {
        self.outdated = true;
    }

    pub fn total_pose_count(&self) -> usize {
        self.states.iter().map(|s| s.cached_poses.len()).sum()
    }

    /// Blend duration for a specific state pair: the source state's custom
    /// entry if present, otherwise the library default.
    pub fn blend_time_between(&self, from: StateId, to: StateId) -> f32 {
        self.states
            .iter()
            .find(|s| s.id == from)
            .and_then(|s| s.custom_blend_times.get(&to.0).copied())
            .unwrap_or(self.blend_time)
    }

    /// Normalize a trajectory in place with the cached per-offset statistics,
    /// so it can take part in a feature-space distance.
    pub fn normalize_trajectory(&self, trajectory: &mut [TrajectoryPoint]) {
        for (i, point) in trajectory.iter_mut().enumerate() {
            point.position = self.trajectory_position_stats[i].normalize_vector(point.position);
            point.facing = self.trajectory_facing_stats[i].normalize(point.facing);
        }
    }

    /// Restore a trajectory to raw, world-scale values.
    pub fn denormalize_trajectory(&self, trajectory: &mut [TrajectoryPoint]) {
        for (i, point) in trajectory.iter_mut().enumerate() {
            point.position = self.trajectory_position_stats[i].denormalize_vector(point.position);
            point.facing = self.trajectory_facing_stats[i].denormalize(point.facing);
        }
    }

    /// Restore bone features to raw, root-relative centimeters.
    pub fn denormalize_bones(&self, bones: &mut [BoneFeature]) {
        for (i, bone) in bones.iter_mut().enumerate() {
            bone.position = self.bone_position_stats[i].denormalize_vector(bone.position);
            bone.velocity = self.bone_velocity_stats[i].denormalize_vector(bone.velocity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_variance_channel_falls_back_to_unit_deviation() {
        let mut stats = ChannelStats::default();
        for _ in 0..8 {
            stats.accumulate_scalar(2.5);
        }
        stats.finish_mean();
        for _ in 0..8 {
            stats.accumulate_scalar_deviation(2.5);
        }
        stats.finish_variance(3.0);

        assert_eq!(stats.std_dev, 1.0);
        assert_eq!(stats.std_inverse, 1.0);
        // Degenerates to (v - mean) * weight.
        assert!((stats.normalize(4.5) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn blend_time_prefers_custom_entry() {
        let mut lib = MotionLibrary::new();
        let mut a = AnimationState::new(Some(ClipId(0)), true, false);
        a.id = StateId(0);
        a.custom_blend_times.insert(1, 0.125);
        let mut b = AnimationState::new(Some(ClipId(1)), false, true);
        b.id = StateId(1);
        lib.states = vec![a, b];

        assert!((lib.blend_time_between(StateId(0), StateId(1)) - 0.125).abs() < 1e-6);
        assert!((lib.blend_time_between(StateId(1), StateId(0)) - lib.blend_time).abs() < 1e-6);
    }
}
