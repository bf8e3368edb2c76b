#![allow(dead_code)]
//! Stridematch core (engine-agnostic)
//!
//! Motion matching: every fixed interval the matcher searches a precomputed
//! library of pose snapshots for the one whose feature vector (bone
//! positions/velocities, root velocity, past/future trajectory) best matches
//! a goal built from the live pose and the player's intent. The library is
//! built offline from clips, z-score normalized per channel, and shared
//! read-only across matcher instances; spring integrators smooth the warp
//! outputs applied after a match.
//!
//! Playback, skeletal evaluation and transition blending stay on the host
//! side behind the `ClipEvaluator`, `LiveSkeletonSampler`, `BlendRequester`
//! and `FootLockSink` contracts.

pub mod builder;
pub mod clip;
pub mod config;
pub mod error;
pub mod hooks;
pub mod ids;
pub mod inputs;
pub mod interpolate;
pub mod library;
pub mod matcher;
pub mod math;
pub mod normalize;
pub mod outputs;
pub mod spring;
pub mod trajectory;

// Re-exports for consumers (hosts and tests)
pub use builder::{build_library, BuildReport};
pub use clip::{ClipEvaluator, ClipTransform};
pub use config::Config;
pub use error::MotionDataError;
pub use hooks::{BlendRequester, FootLockSink, Hooks, LiveSkeletonSampler};
pub use ids::{ClipId, IdAllocator, PoseId, StateId};
pub use inputs::{CharacterFrame, MatcherInput};
pub use interpolate::evaluate_pose_sample;
pub use library::{
    AnimationState, BoneFeature, ChannelStats, MotionLibrary, PoseSample, TrajectoryPoint,
    MATCH_BLEND_TIME, MATCH_INTERVAL,
};
pub use matcher::Matcher;
pub use math::Vec3;
pub use normalize::normalize_library;
pub use outputs::{DebugSnapshot, TickOutput, Transition};
pub use trajectory::{PastSnapshot, TrajectorySynthesizer, RECORD_SAMPLE_RATE};
