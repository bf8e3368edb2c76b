#![allow(dead_code)]
//! Input contracts for the runtime matcher.
//!
//! Hosts build these each tick: `MatcherInput` carries player intent,
//! `CharacterFrame` carries the character's simulated state.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Player intent for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherInput {
    /// Desired movement direction, unit-ish stick vector in the ground plane.
    pub desired_direction: Vec3,
    /// Desired facing change in degrees, signed.
    pub desired_facing: f32,
}

/// Character state sampled by the host before the animation update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterFrame {
    /// World position.
    pub position: Vec3,
    /// World yaw in degrees.
    pub yaw: f32,
    /// World-space velocity.
    pub velocity: Vec3,
}
