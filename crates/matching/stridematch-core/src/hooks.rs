#![allow(dead_code)]
//! Collaborator contracts the matcher notifies or consumes at runtime.
//!
//! All three are optional per update so tests and headless hosts can run the
//! core without wiring a full character.

use crate::library::BoneFeature;
use crate::math::Vec3;

/// Transition-smoothing subsystem. The matcher only asks for blends and
/// tracks how many it has in flight; the blending itself happens elsewhere.
pub trait BlendRequester {
    fn request_blend(&mut self, duration_seconds: f32);
}

/// Live source of the character's current matching-bone features
/// (root-relative position and velocity, raw units). When present, the query
/// pose uses these instead of the interpolated offline data.
pub trait LiveSkeletonSampler {
    fn bone_features(&self) -> &[BoneFeature];
}

/// Receiver for foot-lock transitions. Invoked only on a rising or falling
/// edge of a foot's planted flag, never every frame.
pub trait FootLockSink {
    fn update_foot_lock(&mut self, foot: usize, locked: bool, world_position: Vec3);
}

/// Optional collaborators for one matcher update.
#[derive(Default)]
pub struct Hooks<'a> {
    pub blend: Option<&'a mut dyn BlendRequester>,
    pub live_bones: Option<&'a dyn LiveSkeletonSampler>,
    pub foot_lock: Option<&'a mut dyn FootLockSink>,
}
