use stridematch_core::{
    build_library, AnimationState, BlendRequester, BoneFeature, CharacterFrame, Config,
    FootLockSink, Hooks, LiveSkeletonSampler, Matcher, MatcherInput, MotionDataError,
    MotionLibrary, Transition, Vec3,
};
use stridematch_fixtures::{library_shell, walk_library, ClipSpec, Motion, SyntheticClips};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Default)]
struct RecordingBlender {
    requests: Vec<f32>,
}

impl BlendRequester for RecordingBlender {
    fn request_blend(&mut self, duration_seconds: f32) {
        self.requests.push(duration_seconds);
    }
}

#[derive(Default)]
struct RecordingFootSink {
    events: Vec<(usize, bool, Vec3)>,
}

impl FootLockSink for RecordingFootSink {
    fn update_foot_lock(&mut self, foot: usize, locked: bool, world_position: Vec3) {
        self.events.push((foot, locked, world_position));
    }
}

fn forward_frame(time: f32) -> CharacterFrame {
    CharacterFrame {
        position: Vec3::new(120.0 * time, 0.0, 0.0),
        yaw: 0.0,
        velocity: Vec3::new(120.0, 0.0, 0.0),
    }
}

fn forward_input() -> MatcherInput {
    MatcherInput {
        desired_direction: Vec3::new(1.0, 0.0, 0.0),
        desired_facing: 0.0,
    }
}

/// Stop-then-walk library: the matcher starts inside the non-looping stop
/// state and has to hand over to the walk loop before the clip runs out.
fn stop_first_library() -> (MotionLibrary, SyntheticClips) {
    let mut clips = SyntheticClips::new();
    let stop = clips.add(ClipSpec {
        length: 0.55,
        motion: Motion::Stopping { speed: 120.0 },
    });
    let walk = clips.add(ClipSpec {
        length: 0.75,
        motion: Motion::Straight { speed: 120.0 },
    });

    let mut lib = library_shell(&[-0.25, 0.25, 0.5]);
    lib.states.push(AnimationState::new(Some(stop), false, true));
    lib.states.push(AnimationState::new(Some(walk), true, false));

    (lib, clips)
}

/// Drive the matcher for `steps` ticks of `dt`, collecting transitions.
fn drive(
    matcher: &mut Matcher,
    lib: &MotionLibrary,
    steps: usize,
    dt: f32,
    blender: &mut RecordingBlender,
) -> Vec<Transition> {
    let mut transitions = Vec::new();
    for step in 0..steps {
        let frame = forward_frame(step as f32 * dt);
        let mut hooks = Hooks {
            blend: Some(&mut *blender),
            ..Hooks::default()
        };
        matcher
            .update(lib, dt, &frame, &forward_input(), &mut hooks)
            .expect("update");
        if let Some(t) = matcher.take_transition() {
            transitions.push(t);
        }
    }
    transitions
}

/// it should reject construction against a library missing authoring data
#[test]
fn construction_requires_valid_data() {
    let lib = MotionLibrary::new();
    assert!(matches!(
        Matcher::new(&lib, Config::default()),
        Err(MotionDataError::NoStates)
    ));
}

/// it should refuse queries against an unbuilt library
#[test]
fn update_requires_built_cache() {
    let (lib, _clips) = walk_library();
    // Never built.
    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut hooks = Hooks::default();
    let result = matcher.update(&lib, 0.016, &forward_frame(0.0), &forward_input(), &mut hooks);
    assert_eq!(result.err(), Some(MotionDataError::NotBuilt));
}

/// it should produce identical outputs for identical input sequences
#[test]
fn matching_is_deterministic() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut a = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut b = Matcher::new(&lib, Config::default()).expect("matcher");

    for step in 0..60 {
        let frame = forward_frame(step as f32 * 0.016);
        let mut hooks_a = Hooks::default();
        let mut hooks_b = Hooks::default();
        let out_a = a
            .update(&lib, 0.016, &frame, &forward_input(), &mut hooks_a)
            .expect("update")
            .clone();
        let out_b = b
            .update(&lib, 0.016, &frame, &forward_input(), &mut hooks_b)
            .expect("update")
            .clone();

        let json_a = serde_json::to_string(&out_a).unwrap();
        let json_b = serde_json::to_string(&out_b).unwrap();
        assert_eq!(json_a, json_b, "diverged at step {step}");
    }
}

/// it should never jump around inside the loop it is already playing
#[test]
fn same_state_loop_is_sticky() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut matcher, &lib, 120, 0.016, &mut blender);

    assert!(transitions.is_empty(), "got {transitions:?}");
    assert_eq!(matcher.state_index(), 0);
    assert!(blender.requests.is_empty());
}

/// it should hand a dying non-loop clip over to a loop state
#[test]
fn ending_transition_hands_over_to_loop() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut matcher, &lib, 60, 0.016, &mut blender);

    assert!(
        !transitions.is_empty(),
        "stop clip should hand over before running out"
    );
    let first = &transitions[0];
    assert_eq!(first.from.0, 0);
    assert_eq!(first.to.0, 1);
    assert_eq!(matcher.state_index(), 1);

    // The accepted switch asked the blend collaborator for the library
    // default duration.
    assert_eq!(blender.requests.len(), transitions.len());
    approx(blender.requests[0], lib.blend_time, 1e-6);
}

/// it should use the state pair's custom blend time when configured
#[test]
fn custom_blend_time_wins_over_default() {
    let (mut lib, clips) = stop_first_library();
    lib.states[0].custom_blend_times.insert(1, 0.125);
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut matcher, &lib, 60, 0.016, &mut blender);

    assert!(!transitions.is_empty());
    approx(transitions[0].blend_time, 0.125, 1e-6);
    approx(blender.requests[0], 0.125, 1e-6);
}

/// it should not switch while both blend slots are occupied
#[test]
fn occupied_blend_slots_block_switching() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    matcher.note_external_blend(30.0);
    matcher.note_external_blend(30.0);

    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut matcher, &lib, 60, 0.016, &mut blender);

    assert!(transitions.is_empty(), "got {transitions:?}");
    assert_eq!(matcher.state_index(), 0);
    assert!(blender.requests.is_empty());
}

/// it should switch again once a blocking blend expires
#[test]
fn expired_blends_free_their_slots() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    // Two short blends block the first handover window, then expire.
    matcher.note_external_blend(0.2);
    matcher.note_external_blend(0.2);
    assert_eq!(matcher.active_blend_count(), 2);

    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut matcher, &lib, 80, 0.016, &mut blender);

    assert!(
        !transitions.is_empty(),
        "handover should happen once the blends expire"
    );
    assert_eq!(matcher.state_index(), 1);
}

/// it should leave at least the hysteresis window between accepted switches
#[test]
fn switches_respect_hysteresis() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();

    let dt = 0.016;
    let mut last_switch_step: Option<usize> = None;
    for step in 0..250 {
        let frame = forward_frame(step as f32 * dt);
        let mut hooks = Hooks {
            blend: Some(&mut blender),
            ..Hooks::default()
        };
        matcher
            .update(&lib, dt, &frame, &forward_input(), &mut hooks)
            .expect("update");
        if matcher.take_transition().is_some() {
            if let Some(previous) = last_switch_step {
                let gap = (step - previous) as f32 * dt;
                assert!(gap > 0.1, "switches {previous}->{step} only {gap}s apart");
            }
            last_switch_step = Some(step);
        }
    }
}

/// it should report foot lock changes only on edges
#[test]
fn foot_lock_edges_reach_the_sink() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut sink = RecordingFootSink::default();

    let dt = 0.016;
    let steps = 120;
    for step in 0..steps {
        let frame = forward_frame(step as f32 * dt);
        let mut hooks = Hooks {
            foot_lock: Some(&mut sink),
            ..Hooks::default()
        };
        matcher
            .update(&lib, dt, &frame, &forward_input(), &mut hooks)
            .expect("update");
    }

    assert!(!sink.events.is_empty(), "gait should produce lock edges");
    // Edges only: far fewer events than updates.
    assert!(sink.events.len() < steps / 2, "got {}", sink.events.len());

    // Per foot, consecutive events alternate locked/unlocked.
    for foot in 0..2 {
        let flags: Vec<bool> = sink
            .events
            .iter()
            .filter(|(f, _, _)| *f == foot)
            .map(|(_, locked, _)| *locked)
            .collect();
        for pair in flags.windows(2) {
            assert_ne!(pair[0], pair[1], "foot {foot} repeated {flags:?}");
        }
    }
}

/// it should discard an unconsumed transition when a newer one lands
#[test]
fn pending_transition_is_latest_only() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();

    // Never consume during the run; whatever is pending afterwards must be
    // the most recent switch.
    let dt = 0.016;
    let mut switches = 0;
    for step in 0..250 {
        let frame = forward_frame(step as f32 * dt);
        let mut hooks = Hooks {
            blend: Some(&mut blender),
            ..Hooks::default()
        };
        let out = matcher
            .update(&lib, dt, &frame, &forward_input(), &mut hooks)
            .expect("update");
        if out.switched {
            switches += 1;
        }
    }

    assert!(switches >= 1);
    let pending = matcher.take_transition().expect("pending transition");
    assert_eq!(pending.to.0 as usize, matcher.state_index());
    assert!(matcher.take_transition().is_none());
}

struct FixedBones(Vec<BoneFeature>);

impl LiveSkeletonSampler for FixedBones {
    fn bone_features(&self) -> &[BoneFeature] {
        &self.0
    }
}

/// it should prefer live bone data over the interpolated cache
#[test]
fn live_bones_override_cached_pose() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    let live = FixedBones(vec![
        BoneFeature {
            position: Vec3::new(1.0, 2.0, 90.0),
            velocity: Vec3::new(-5.0, 0.0, 0.0),
        };
        3
    ]);

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut hooks = Hooks {
        live_bones: Some(&live),
        ..Hooks::default()
    };
    matcher
        .update(&lib, 0.016, &forward_frame(0.0), &forward_input(), &mut hooks)
        .expect("update");

    // The snapshot denormalizes the query bones, which round-trips the live
    // values the matcher normalized on the way in.
    let snapshot = matcher.debug_snapshot(&lib);
    for bone in &snapshot.current_bones {
        approx(bone.position.x, 1.0, 1e-2);
        approx(bone.position.y, 2.0, 1e-2);
        approx(bone.position.z, 90.0, 1e-2);
        approx(bone.velocity.x, -5.0, 1e-2);
    }
}

/// it should keep playback fields consistent in the tick output
#[test]
fn tick_output_reflects_play_state() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut hooks = Hooks::default();
    let out = matcher
        .update(&lib, 0.016, &forward_frame(0.0), &forward_input(), &mut hooks)
        .expect("update")
        .clone();

    assert_eq!(out.state_index, matcher.state_index());
    assert!(out.looping);
    approx(out.play_time, matcher.play_time(), 1e-6);
    assert!(out.time_scale_warp >= 0.8 && out.time_scale_warp <= 1.2);
    assert!(out.ik_alpha[0] == 0.0 || out.ik_alpha[0] == 1.0);
}

/// it should expose a denormalized debug snapshot on demand
#[test]
fn debug_snapshot_is_denormalized() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    let mut matcher = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();
    drive(&mut matcher, &lib, 120, 0.016, &mut blender);

    let snapshot = matcher.debug_snapshot(&lib);
    assert_eq!(snapshot.state_index, matcher.state_index());
    assert_eq!(snapshot.desired_trajectory.len(), 3);
    assert_eq!(snapshot.current_trajectory.len(), 3);
    assert_eq!(snapshot.current_bones.len(), 3);

    // Denormalization restores world-scale magnitudes: a steady 120-unit/s
    // run puts the furthest desired point around half that distance out.
    let furthest = snapshot.desired_trajectory.last().unwrap();
    approx(furthest.position.x, 60.0, 6.0);

    // The raw desired facing round-trips exactly through normalize and back.
    approx(furthest.facing, 0.0, 1e-3);
}

/// it should run the full walk/stop scenario: steady forward intent pulls
/// the matcher out of the stop state once a blend slot and the hysteresis
/// window allow it
#[test]
fn end_to_end_walk_stop_scenario() {
    let (mut lib, clips) = stop_first_library();
    build_library(&mut lib, &clips).expect("build");

    // Blocked run: both slots taken, nothing may switch.
    let mut blocked = Matcher::new(&lib, Config::default()).expect("matcher");
    blocked.note_external_blend(10.0);
    blocked.note_external_blend(10.0);
    let mut blender = RecordingBlender::default();
    let transitions = drive(&mut blocked, &lib, 40, 0.016, &mut blender);
    assert!(transitions.is_empty());

    // Free run: the switch to the walk loop happens, and only after the
    // matcher has been alive longer than the hysteresis window.
    let mut free = Matcher::new(&lib, Config::default()).expect("matcher");
    let mut blender = RecordingBlender::default();

    let dt = 0.016;
    let mut switch_step = None;
    for step in 0..120 {
        let frame = forward_frame(step as f32 * dt);
        let mut hooks = Hooks {
            blend: Some(&mut blender),
            ..Hooks::default()
        };
        free.update(&lib, dt, &frame, &forward_input(), &mut hooks)
            .expect("update");
        if free.take_transition().is_some() && switch_step.is_none() {
            switch_step = Some(step);
        }
    }

    let switch_step = switch_step.expect("switch should happen");
    assert!(
        switch_step as f32 * dt > 0.1,
        "switched before the hysteresis window at step {switch_step}"
    );
    assert_eq!(free.state_index(), 1);
    assert!(free.active_blend_count() >= 1 || !blender.requests.is_empty());
}
