#![allow(dead_code)]
//! Runtime configuration for a matcher instance.
//!
//! Library-level tuning (weights, biases, timings) lives on the asset; this
//! is the per-character knob set.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scales the player's desired speed before trajectory synthesis.
    pub speed_multiplier: f32,

    /// Concurrent transition blends the blend collaborator can hold.
    pub max_active_blends: usize,

    /// Minimum seconds between accepted switches.
    pub min_blend_interval: f32,

    /// A same-state winner within this many seconds of the current play time
    /// counts as "the same location" and is not worth switching to.
    pub same_location_window: f32,

    /// Half-life for the root translation warp springs.
    pub warp_halflife: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            max_active_blends: 2,
            min_blend_interval: 0.1,
            same_location_window: 1.0,
            warp_halflife: 0.4,
        }
    }
}
