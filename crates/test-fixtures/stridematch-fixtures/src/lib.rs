//! Synthetic clip fixtures for the motion-matching core.
//!
//! Instead of shipping baked animation files, tests get analytic clips with
//! known root motion (straight walk, constant-rate turn, linear stop) and a
//! three-bone skeleton whose feet alternate plant/swing phases. Everything a
//! `ClipEvaluator` is asked for has a closed form, so expected feature
//! values can be derived by hand in assertions.

use stridematch_core::{
    AnimationState, ClipEvaluator, ClipId, ClipTransform, MotionLibrary, Vec3,
};

/// Gait cycle length for the stepping feet, seconds.
pub const STEP_PERIOD: f32 = 0.4;

/// Lateral offset of each foot from the root, world units.
pub const FOOT_SIDE_OFFSET: f32 = 15.0;

/// Pelvis height above the root.
pub const PELVIS_HEIGHT: f32 = 90.0;

#[derive(Clone, Copy, Debug)]
pub enum Motion {
    /// Constant speed along +X, no turning.
    Straight { speed: f32 },
    /// Constant speed along a circular arc turning `turn_rate` degrees/s.
    Turning { speed: f32, turn_rate: f32 },
    /// Linear deceleration from `speed` to rest at the clip end.
    Stopping { speed: f32 },
}

#[derive(Clone, Copy, Debug)]
pub struct ClipSpec {
    pub length: f32,
    pub motion: Motion,
}

/// A bag of analytic clips addressed by `ClipId` (the id indexes the bag).
#[derive(Clone, Debug, Default)]
pub struct SyntheticClips {
    clips: Vec<ClipSpec>,
}

impl SyntheticClips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: ClipSpec) -> ClipId {
        self.clips.push(spec);
        ClipId(self.clips.len() as u32 - 1)
    }

    fn spec(&self, clip: ClipId) -> ClipSpec {
        self.clips[clip.0 as usize]
    }

    fn root_at(&self, clip: ClipId, time: f32) -> ClipTransform {
        let spec = self.spec(clip);
        match spec.motion {
            Motion::Straight { speed } => {
                ClipTransform::new(Vec3::new(speed * time, 0.0, 0.0), 0.0)
            }
            Motion::Turning { speed, turn_rate } => {
                let yaw = turn_rate * time;
                let theta = yaw.to_radians();
                let radius = speed / turn_rate.to_radians();
                ClipTransform::new(
                    Vec3::new(radius * theta.sin(), radius * (1.0 - theta.cos()), 0.0),
                    yaw,
                )
            }
            Motion::Stopping { speed } => {
                let decel = speed / spec.length;
                let t = time.min(spec.length);
                ClipTransform::new(
                    Vec3::new(speed * t - 0.5 * decel * t * t, 0.0, 0.0),
                    0.0,
                )
            }
        }
    }

    /// World X of a stepping foot: planted for half of each gait cycle, then
    /// swinging forward at twice the travel speed so the stride catches up.
    fn stepping_foot_x(speed: f32, time: f32, phase: f32) -> f32 {
        let u = (time + phase * STEP_PERIOD).max(0.0);
        let cycle = (u / STEP_PERIOD).floor();
        let frac = u / STEP_PERIOD - cycle;
        let plant_x = speed * STEP_PERIOD * cycle;
        if frac < 0.5 {
            plant_x
        } else {
            plant_x + 2.0 * speed * STEP_PERIOD * (frac - 0.5)
        }
    }

    fn bone_world(&self, clip: ClipId, bone: &str, time: f32) -> Vec3 {
        let spec = self.spec(clip);
        let root = self.root_at(clip, time);

        match bone {
            "pelvis" => root.position + Vec3::new(0.0, 0.0, PELVIS_HEIGHT),
            "foot_l" | "foot_r" => {
                let side = if bone == "foot_l" {
                    FOOT_SIDE_OFFSET
                } else {
                    -FOOT_SIDE_OFFSET
                };
                match spec.motion {
                    Motion::Straight { speed } | Motion::Stopping { speed } => {
                        // Left leads by half a cycle.
                        let phase = if bone == "foot_l" { 0.5 } else { 0.0 };
                        Vec3::new(
                            Self::stepping_foot_x(speed, time, phase),
                            side,
                            0.0,
                        )
                    }
                    Motion::Turning { .. } => {
                        // Feet ride along with the root on the arc.
                        root.position + Vec3::new(0.0, side, 0.0).rotate_yaw(root.yaw)
                    }
                }
            }
            _ => root.position,
        }
    }
}

impl ClipEvaluator for SyntheticClips {
    fn clip_length(&self, clip: ClipId) -> f32 {
        self.spec(clip).length
    }

    fn root_transform_at(&self, clip: ClipId, time: f32) -> ClipTransform {
        self.root_at(clip, time)
    }

    fn bone_transform_at(
        &self,
        clip: ClipId,
        bone: &str,
        time: f32,
        root_relative: bool,
    ) -> ClipTransform {
        let world = self.bone_world(clip, bone, time);
        if root_relative {
            let root = self.root_at(clip, time);
            ClipTransform::new(root.inverse_transform_position(world), 0.0)
        } else {
            ClipTransform::new(world, 0.0)
        }
    }
}

/// The standard three-bone matching skeleton used across the test suites.
pub fn matching_bones() -> Vec<String> {
    vec!["pelvis".into(), "foot_l".into(), "foot_r".into()]
}

/// A library shell with the standard skeleton, a coarse 0.1 s cache
/// resolution and the given trajectory timings. States still need to be
/// added and the cache built.
pub fn library_shell(timings: &[f32]) -> MotionLibrary {
    let mut lib = MotionLibrary::new();
    lib.sampling_rate = 0.1;
    lib.trajectory_timings = timings.to_vec();
    lib.trajectory_weights = vec![1.0; timings.len()];
    lib.trajectory_facing_weights = vec![1.0; timings.len()];
    lib.matching_bones = matching_bones();
    lib.left_foot = Some("foot_l".into());
    lib.right_foot = Some("foot_r".into());
    // The asset defaults (1.0) make the currently playing frame free and pin
    // the search in place; tests want observable switches.
    lib.natural_bias = 0.2;
    lib.loop_bias = 0.2;
    lib
}

/// Two-state walk/stop setup: state 0 is a looping straight walk with five
/// cached poses, state 1 a non-looping stop with three.
pub fn walk_stop_library() -> (MotionLibrary, SyntheticClips) {
    let mut clips = SyntheticClips::new();
    let walk = clips.add(ClipSpec {
        length: 0.75,
        motion: Motion::Straight { speed: 120.0 },
    });
    let stop = clips.add(ClipSpec {
        length: 0.55,
        motion: Motion::Stopping { speed: 120.0 },
    });

    let mut lib = library_shell(&[-0.25, 0.25, 0.5]);
    lib.states.push(AnimationState::new(Some(walk), true, false));
    lib.states.push(AnimationState::new(Some(stop), false, true));

    (lib, clips)
}

/// Single looping walk state, useful where only one candidate clip matters.
pub fn walk_library() -> (MotionLibrary, SyntheticClips) {
    let mut clips = SyntheticClips::new();
    let walk = clips.add(ClipSpec {
        length: 0.75,
        motion: Motion::Straight { speed: 120.0 },
    });

    let mut lib = library_shell(&[-0.25, 0.25, 0.5]);
    lib.states.push(AnimationState::new(Some(walk), true, false));

    (lib, clips)
}

/// A walk loop plus a constant-rate turning loop.
pub fn walk_turn_library() -> (MotionLibrary, SyntheticClips) {
    let mut clips = SyntheticClips::new();
    let walk = clips.add(ClipSpec {
        length: 0.75,
        motion: Motion::Straight { speed: 120.0 },
    });
    let turn = clips.add(ClipSpec {
        length: 0.75,
        motion: Motion::Turning {
            speed: 120.0,
            turn_rate: 90.0,
        },
    });

    let mut lib = library_shell(&[-0.25, 0.25, 0.5]);
    lib.states.push(AnimationState::new(Some(walk), true, false));
    lib.states.push(AnimationState::new(Some(turn), true, false));

    (lib, clips)
}
