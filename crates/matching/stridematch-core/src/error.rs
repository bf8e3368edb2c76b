#![allow(dead_code)]
//! Error taxonomy for motion data and matching.
//!
//! Malformed authoring data disables the system instead of crashing it; a
//! stale (outdated) cache is only a warning and never surfaces here.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MotionDataError {
    #[error("motion library has no animation states")]
    NoStates,

    #[error("animation state {0} has no clip associated")]
    MissingClip(usize),

    #[error("motion library has no trajectory timings")]
    NoTrajectoryTimings,

    #[error("motion library has no pose matching bones listed")]
    NoMatchingBones,

    #[error("motion library features are already normalized")]
    AlreadyNormalized,

    #[error("motion library cache has not been built")]
    NotBuilt,
}
