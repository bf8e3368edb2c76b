#![allow(dead_code)]
//! Clip evaluation capability consumed by the offline builder.
//!
//! The playback engine owns clip storage and skeletal evaluation; the builder
//! only needs root motion and per-bone positions at arbitrary times, so this
//! trait is the entire surface between them.

use crate::ids::ClipId;
use crate::math::Vec3;

/// A position plus a yaw about the up axis. Enough to describe root motion
/// and bone placement for matching purposes; full orientations stay on the
/// engine side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClipTransform {
    pub position: Vec3,
    pub yaw: f32,
}

impl ClipTransform {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    /// Express a point relative to this transform (translate then un-rotate).
    #[inline]
    pub fn inverse_transform_position(&self, point: Vec3) -> Vec3 {
        (point - self.position).rotate_yaw(-self.yaw)
    }
}

/// Host-implemented clip sampler.
pub trait ClipEvaluator {
    /// Total clip length in seconds.
    fn clip_length(&self, clip: ClipId) -> f32;

    /// Accumulated root motion from the clip start to `time`.
    fn root_transform_at(&self, clip: ClipId, time: f32) -> ClipTransform;

    /// Bone transform at `time`. With `root_relative` the transform is
    /// already expressed in the frame of the root at that time; otherwise it
    /// is in clip space (root motion included).
    fn bone_transform_at(
        &self,
        clip: ClipId,
        bone: &str,
        time: f32,
        root_relative: bool,
    ) -> ClipTransform;
}
