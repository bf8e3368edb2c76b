#![allow(dead_code)]
//! Runtime matcher: owns the per-character live state, runs the periodic
//! pose search, tracks blends and foot locks, and produces the playback
//! directive plus warp corrections each tick.
//!
//! A matcher only ever reads the shared [`MotionLibrary`]; many matchers may
//! update concurrently against one built library as long as each owns its
//! own instance.

use crate::config::Config;
use crate::error::MotionDataError;
use crate::hooks::Hooks;
use crate::ids::PoseId;
use crate::inputs::{CharacterFrame, MatcherInput};
use crate::interpolate::evaluate_pose_sample;
use crate::library::{
    MotionLibrary, PoseSample, TrajectoryPoint, MATCH_BLEND_TIME, MATCH_INTERVAL,
};
use crate::math::{interp_to, lerp, normalize_angle, square, Vec3};
use crate::outputs::{DebugSnapshot, TickOutput, Transition};
use crate::spring::CharacterSpringState;
use crate::trajectory::TrajectorySynthesizer;

const UP: Vec3 = Vec3 {
    x: 0.0,
    y: 0.0,
    z: 1.0,
};

/// Per-character motion matcher.
#[derive(Debug)]
pub struct Matcher {
    cfg: Config,
    trajectory: TrajectorySynthesizer,

    state_index: usize,
    pose_index: usize,
    play_time: f32,

    /// The currently evaluated pose from the cache (normalized basis). This
    /// is the goal vector's pose half during matching.
    current_pose: PoseSample,
    /// Normalized copy of the desired trajectory, rebuilt each tick.
    desired_normalized: Vec<TrajectoryPoint>,

    time_since_match: f32,
    time_since_blend: f32,
    last_best_cost: f32,

    /// Remaining durations of blends in flight, ours and host-reported.
    active_blends: Vec<f32>,

    anim_changed: bool,
    time_scale_warp: f32,
    root_rotation_warp: f32,
    yaw_step: f32,
    warp_spring_x: CharacterSpringState,
    warp_spring_y: CharacterSpringState,

    foot_locks: [bool; 2],
    ik_alpha: [f32; 2],

    last_yaw: f32,
    has_last_yaw: bool,
    warned_stale: bool,

    /// Latest accepted transition, pending until the host consumes it. A new
    /// match discards an unconsumed result rather than queueing.
    pending: Option<Transition>,

    output: TickOutput,
}

impl Matcher {
    /// Create a matcher bound to a library's shape. Fails on the MissingData
    /// class so a misconfigured asset disables matching instead of crashing
    /// it later.
    pub fn new(lib: &MotionLibrary, cfg: Config) -> Result<Self, MotionDataError> {
        lib.validate()?;

        Ok(Self {
            trajectory: TrajectorySynthesizer::new(&lib.trajectory_timings),
            cfg,
            state_index: 0,
            pose_index: 0,
            play_time: 0.0,
            current_pose: PoseSample::default(),
            desired_normalized: Vec::with_capacity(lib.trajectory_timings.len()),
            time_since_match: 0.0,
            time_since_blend: 0.0,
            last_best_cost: 0.0,
            active_blends: Vec::new(),
            anim_changed: false,
            time_scale_warp: 1.0,
            root_rotation_warp: 0.0,
            yaw_step: 0.0,
            warp_spring_x: CharacterSpringState::default(),
            warp_spring_y: CharacterSpringState::default(),
            foot_locks: [false, false],
            ik_alpha: [0.0, 0.0],
            last_yaw: 0.0,
            has_last_yaw: false,
            warned_stale: false,
            pending: None,
            output: TickOutput::default(),
        })
    }

    /// Step the matcher by `dt`. Queries against an unbuilt (or mid-rebuild)
    /// library are rejected rather than reading torn data.
    pub fn update(
        &mut self,
        lib: &MotionLibrary,
        dt: f32,
        frame: &CharacterFrame,
        input: &MatcherInput,
        hooks: &mut Hooks<'_>,
    ) -> Result<&TickOutput, MotionDataError> {
        if !lib.is_built() {
            return Err(MotionDataError::NotBuilt);
        }
        lib.validate()?;

        if lib.outdated && !self.warned_stale {
            log::warn!("matching against an outdated motion cache; rebuild to pick up edits");
            self.warned_stale = true;
        }

        self.time_since_match += dt;
        self.time_since_blend += dt;
        self.anim_changed = false;

        if self.state_index >= lib.states.len() {
            // The library shrank under us (new asset hot-swapped in); restart
            // from the first state rather than indexing out of range.
            self.state_index = 0;
            self.pose_index = 0;
            self.play_time = 0.0;
        }

        self.advance_play_time(lib, dt);

        let turn_speed = if dt > 0.0 && self.has_last_yaw {
            normalize_angle(frame.yaw - self.last_yaw) / dt
        } else {
            0.0
        };
        self.last_yaw = frame.yaw;
        self.has_last_yaw = true;

        self.trajectory
            .update(dt, frame, input, turn_speed, self.cfg.speed_multiplier);

        for blend in &mut self.active_blends {
            *blend -= dt;
        }
        self.active_blends.retain(|blend| *blend >= 0.0);

        evaluate_pose_sample(
            lib,
            self.state_index,
            self.play_time,
            hooks.live_bones,
            &mut self.current_pose,
        );

        self.desired_normalized.clear();
        self.desired_normalized
            .extend_from_slice(self.trajectory.desired());
        lib.normalize_trajectory(&mut self.desired_normalized);

        // The goal pose carries the character's real root velocity, not the
        // cached one: yaw-align it and normalize it into feature space.
        let aligned_velocity = frame.velocity.rotate_yaw(-frame.yaw);
        self.current_pose.root_velocity =
            lib.root_velocity_stats.normalize_vector(aligned_velocity);

        self.update_foot_locks(lib, frame, hooks);

        if self.time_since_match > MATCH_INTERVAL {
            self.match_now(lib, hooks);
        }

        self.update_warps(lib, dt, frame, input);

        let state = &lib.states[self.state_index];
        self.output = TickOutput {
            state_index: self.state_index,
            pose_index: self.pose_index,
            play_time: self.play_time,
            looping: state.looping,
            time_scale_warp: self.time_scale_warp,
            root_rotation_warp: self.root_rotation_warp,
            root_warp_velocity: Vec3::new(
                self.warp_spring_x.velocity,
                self.warp_spring_y.velocity,
                0.0,
            ),
            yaw_step: self.yaw_step,
            ik_alpha: self.ik_alpha,
            switched: self.anim_changed,
        };
        Ok(&self.output)
    }

    fn advance_play_time(&mut self, lib: &MotionLibrary, dt: f32) {
        let state = &lib.states[self.state_index];
        if state.clip.is_none() || state.clip_length <= 0.0 {
            return;
        }
        self.play_time += dt * self.time_scale_warp;
        if state.looping {
            self.play_time %= state.clip_length;
        } else {
            self.play_time = self.play_time.min(state.clip_length);
        }
    }

    /// Search the whole library for a better pose than the one playing.
    fn match_now(&mut self, lib: &MotionLibrary, hooks: &mut Hooks<'_>) {
        self.time_since_match = 0.0;

        let current_state = &lib.states[self.state_index];
        if current_state.cached_poses.is_empty() || current_state.clip.is_none() {
            return;
        }

        // A non-loop clip that is about to run out must hand over to a loop,
        // so restrict the search to avoid picking another dead end.
        let time_left = current_state.clip_length - self.play_time;
        let find_loop = time_left < MATCH_BLEND_TIME && !current_state.looping;

        let mut best_cost = f32::MAX;
        let mut best_state = 0usize;
        let mut best_pose = 0usize;
        let mut best_time = 0.0f32;
        let mut found = false;

        for (state_index, state) in lib.states.iter().enumerate() {
            if find_loop && !state.looping {
                continue;
            }

            for (pose_index, candidate) in state.cached_poses.iter().enumerate() {
                let cost = self.pose_cost(lib, candidate, state.looping);

                if cost < best_cost {
                    best_cost = cost;
                    best_state = state_index;
                    best_pose = pose_index;
                    best_time = candidate.time;
                    found = true;
                }
            }
        }

        if !found {
            return;
        }

        let same_state = best_state == self.state_index;
        // Jumping inside the loop we are already playing gains nothing.
        let looping_in_place = same_state && lib.states[self.state_index].looping;
        let same_location = same_state
            && ((self.play_time - best_time).abs() < self.cfg.same_location_window
                || self.pose_index == best_pose);

        if same_location
            || looping_in_place
            || self.time_since_blend <= self.cfg.min_blend_interval
            || self.active_blends.len() >= self.cfg.max_active_blends
        {
            return;
        }

        let from = current_state.id;
        let to = lib.states[best_state].id;
        let blend_time = lib.blend_time_between(from, to);

        self.active_blends.push(blend_time);
        self.time_since_blend = 0.0;

        self.state_index = best_state;
        self.pose_index = best_pose;
        self.play_time = best_time;
        self.last_best_cost = best_cost;
        self.anim_changed = true;

        if let Some(blend) = hooks.blend.as_mut() {
            blend.request_blend(blend_time);
        }

        // Replace any unconsumed result; stale matches are not queued.
        self.pending = Some(Transition {
            from,
            to,
            pose: lib.states[best_state].cached_poses[best_pose].id,
            pose_index: best_pose,
            play_time: best_time,
            blend_time,
            cost: best_cost,
        });
    }

    /// Squared feature-space distance between the live goal and a candidate,
    /// with the bias discounts folded in.
    ///
    /// The goal mixes bases on purpose: bone and root terms come from the
    /// live current pose, trajectory terms from the desired trajectory.
    fn pose_cost(&self, lib: &MotionLibrary, candidate: &PoseSample, candidate_loops: bool) -> f32 {
        let goal = &self.current_pose;

        let mut dist = goal.root_velocity.dist_squared(candidate.root_velocity);

        for (bone, candidate_bone) in goal.bones.iter().zip(&candidate.bones) {
            dist += bone.position.dist_squared(candidate_bone.position);
            dist += bone.velocity.dist_squared(candidate_bone.velocity);
        }

        for (desired, candidate_point) in self.desired_normalized.iter().zip(&candidate.trajectory)
        {
            dist += desired.position.dist_squared(candidate_point.position);
            dist += square(desired.facing - candidate_point.facing);
        }

        // Prefer continuing the exact same frame more than the same clip.
        if goal.state == candidate.state {
            dist *= 1.0
                - if goal.id == candidate.id {
                    lib.natural_bias
                } else {
                    lib.natural_bias * 0.5
                };
        }

        // Prefer loops while the player's input is steady.
        if candidate_loops {
            dist *= 1.0 - lib.loop_bias * self.trajectory.steady_bias();
        }

        dist
    }

    fn update_foot_locks(&mut self, lib: &MotionLibrary, frame: &CharacterFrame, hooks: &mut Hooks<'_>) {
        let pose_locks = self.current_pose.foot_locks;
        self.ik_alpha = [
            if pose_locks[0] { 1.0 } else { 0.0 },
            if pose_locks[1] { 1.0 } else { 0.0 },
        ];

        let Some(sink) = hooks.foot_lock.as_mut() else {
            return;
        };
        // Pose id zero means the matcher has not evaluated a real pose yet.
        if self.current_pose.id == PoseId(0) {
            return;
        }

        let feet = [&lib.left_foot, &lib.right_foot];
        let mut bones = self.current_pose.bones.clone();
        lib.denormalize_bones(&mut bones);

        for foot in 0..2 {
            let pose_locked = pose_locks[foot];
            if pose_locked == self.foot_locks[foot] {
                continue;
            }
            let Some(name) = feet[foot] else {
                continue;
            };
            let Some(index) = lib.matching_bones.iter().position(|bone| bone == name) else {
                continue;
            };
            if let Some(bone) = bones.get(index) {
                let world_position = frame.position + bone.position.rotate_yaw(frame.yaw);
                self.foot_locks[foot] = pose_locked;
                sink.update_foot_lock(foot, pose_locked, world_position);
            }
        }
    }

    /// Candidate warping: small playback-rate, steering and translation
    /// corrections that close the gap between what was matched and what the
    /// player wants.
    fn update_warps(
        &mut self,
        lib: &MotionLibrary,
        dt: f32,
        frame: &CharacterFrame,
        input: &MatcherInput,
    ) {
        if self.current_pose.trajectory.is_empty() || self.desired_normalized.is_empty() {
            return;
        }

        let mut raw_current = self.current_pose.trajectory.clone();
        let mut raw_desired = self.desired_normalized.clone();
        lib.denormalize_trajectory(&mut raw_current);
        lib.denormalize_trajectory(&mut raw_desired);

        // Time warp: speed the clip up or slow it down toward the desired
        // trajectory speed, but only while there is input. Standing still
        // keeps 1.0 so stop animations finish promptly.
        let desired_speed = raw_desired[raw_desired.len() - 1].position.length();
        let future_speed = raw_current[raw_current.len() - 1].position.length();

        self.time_scale_warp =
            if input.desired_direction.length_squared() > 0.1 && future_speed > 1e-4 {
                (desired_speed / future_speed).clamp(0.8, 1.2)
            } else {
                1.0
            };

        // Rotation warp (steering): the signed angle between where the clip
        // is headed and where the player wants to head, faded out at low
        // desired speeds where the angle is meaningless.
        let first_future = self.trajectory.first_future_index();
        if first_future < raw_current.len() {
            let heading = raw_current[first_future].position.normalized();
            let desired = raw_desired[first_future].position.normalized();
            let desired_scale =
                (raw_desired[first_future].position.length() * 0.016).clamp(0.0, 1.0);

            let dot = heading.dot(desired);
            let right_dot = UP.cross(heading).dot(desired);
            let mut angle = dot.clamp(-1.0, 1.0).acos().to_degrees() * desired_scale;
            if right_dot < 0.0 {
                angle = -angle;
            }

            // Nearly opposite headings (idle vs walk, strafe flips) produce
            // wild angles; hold the previous warp instead.
            if dot > 1e-4 {
                self.root_rotation_warp = interp_to(self.root_rotation_warp, angle, dt, 3.0);
            }
        }

        // A fresh switch restarts steering from neutral to avoid a jump.
        if self.anim_changed {
            self.root_rotation_warp = 0.0;
        }

        self.yaw_step = facing_step(input.desired_facing) * dt;

        // Translation warp: spring the warp velocity toward the world-space
        // input velocity.
        let goal = (input.desired_direction * 120.0).rotate_yaw(frame.yaw);
        self.warp_spring_x
            .step_velocity(goal.x, self.cfg.warp_halflife, dt);
        self.warp_spring_y
            .step_velocity(goal.y, self.cfg.warp_halflife, dt);
    }

    /// Consume the latest accepted transition, if any.
    pub fn take_transition(&mut self) -> Option<Transition> {
        self.pending.take()
    }

    /// Host-initiated blends also occupy a slot; report them here so the
    /// matcher does not oversubscribe the blend collaborator.
    pub fn note_external_blend(&mut self, duration_seconds: f32) {
        self.active_blends.push(duration_seconds);
    }

    #[inline]
    pub fn state_index(&self) -> usize {
        self.state_index
    }

    #[inline]
    pub fn pose_index(&self) -> usize {
        self.pose_index
    }

    #[inline]
    pub fn play_time(&self) -> f32 {
        self.play_time
    }

    #[inline]
    pub fn last_cost(&self) -> f32 {
        self.last_best_cost
    }

    #[inline]
    pub fn steady_bias(&self) -> f32 {
        self.trajectory.steady_bias()
    }

    #[inline]
    pub fn active_blend_count(&self) -> usize {
        self.active_blends.len()
    }

    /// Pull-based view for presentation layers; trajectories and bones are
    /// denormalized back to raw units.
    pub fn debug_snapshot(&self, lib: &MotionLibrary) -> DebugSnapshot {
        let mut current_trajectory = self.current_pose.trajectory.clone();
        let mut desired_trajectory = self.desired_normalized.clone();
        let mut current_bones = self.current_pose.bones.clone();
        lib.denormalize_trajectory(&mut current_trajectory);
        lib.denormalize_trajectory(&mut desired_trajectory);
        lib.denormalize_bones(&mut current_bones);

        DebugSnapshot {
            state_index: self.state_index,
            pose_index: self.pose_index,
            play_time: self.play_time,
            last_cost: self.last_best_cost,
            steady_bias: self.trajectory.steady_bias(),
            time_scale_warp: self.time_scale_warp,
            root_rotation_warp: self.root_rotation_warp,
            current_trajectory,
            desired_trajectory,
            current_bones,
            foot_locks: self.foot_locks,
        }
    }
}

/// Yaw applied per second for a given desired facing: saturates at a full
/// half-turn per second for large inputs, near twice the input for small
/// ones, and dead-zones tiny inputs.
fn facing_step(desired_facing: f32) -> f32 {
    let mut speed = if desired_facing < 0.0 { -180.0 } else { 180.0 };
    if desired_facing.abs() < 0.1 {
        speed = 0.0;
    }
    lerp(speed, desired_facing * 2.0, 0.9)
}
