use stridematch_core::{
    build_library, normalize_library, ChannelStats, MotionDataError, Vec3,
};
use stridematch_fixtures::{walk_library, walk_stop_library};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn stats_from_scalars(values: &[f32], weight: f32) -> ChannelStats {
    let mut stats = ChannelStats::default();
    for v in values {
        stats.accumulate_scalar(*v);
    }
    stats.finish_mean();
    for v in values {
        stats.accumulate_scalar_deviation(*v);
    }
    stats.finish_variance(weight);
    stats
}

/// it should round-trip denormalize(normalize(v)) for any nonzero weight
#[test]
fn normalize_denormalize_roundtrip() {
    let stats = stats_from_scalars(&[1.0, 3.0, 5.0, 9.0, -2.5], 2.0);
    for v in [-10.0, -1.0, 0.0, 0.37, 4.2, 123.0] {
        approx(stats.denormalize(stats.normalize(v)), v, 1e-4);
    }

    // Vector channels round-trip per axis against the shared statistics.
    let mut stats = ChannelStats::default();
    for v in [
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-4.0, 0.5, 6.0),
        Vec3::new(2.0, 2.0, 2.0),
    ] {
        stats.accumulate_vector(v);
    }
    stats.finish_mean();
    for v in [
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(-4.0, 0.5, 6.0),
        Vec3::new(2.0, 2.0, 2.0),
    ] {
        stats.accumulate_vector_deviation(v);
    }
    stats.finish_variance(0.5);

    let v = Vec3::new(7.0, -3.0, 0.25);
    let back = stats.denormalize_vector(stats.normalize_vector(v));
    approx(back.x, v.x, 1e-4);
    approx(back.y, v.y, 1e-4);
    approx(back.z, v.z, 1e-4);
}

/// it should treat X/Y/Z as samples of one shared channel statistic
#[test]
fn vector_channel_shares_mean_and_count() {
    let mut stats = ChannelStats::default();
    stats.accumulate_vector(Vec3::new(1.0, 2.0, 3.0));
    stats.accumulate_vector(Vec3::new(4.0, 5.0, 6.0));
    stats.finish_mean();

    approx(stats.count, 6.0, 1e-6);
    approx(stats.mean, 3.5, 1e-6);
}

/// it should fall back to a unit deviation on zero-variance channels
#[test]
fn zero_variance_degenerates_to_weighted_offset() {
    let stats = stats_from_scalars(&[4.0; 16], 3.0);

    assert_eq!(stats.std_dev, 1.0);
    assert_eq!(stats.std_inverse, 1.0);
    assert!(stats.normalize(4.0).abs() < 1e-6);
    approx(stats.normalize(6.0), 6.0, 1e-6); // (6 - 4) * 3
}

/// it should produce a unit deviation for the constant rotation channel of a
/// straight clip built through the real pipeline
#[test]
fn straight_clip_rotation_channel_is_degenerate() {
    let (mut lib, clips) = walk_library();
    build_library(&mut lib, &clips).expect("build");

    // A straight walk never rotates its root, so every sample is identical.
    assert_eq!(lib.root_rotation_stats.std_dev, 1.0);
    assert!(lib.root_rotation_stats.variance.abs() < 1e-6);
}

/// it should refuse to normalize twice
#[test]
fn double_normalization_is_rejected() {
    let (mut lib, clips) = walk_stop_library();
    build_library(&mut lib, &clips).expect("build");
    assert!(lib.is_normalized());

    assert_eq!(
        normalize_library(&mut lib),
        Err(MotionDataError::AlreadyNormalized)
    );
}

/// it should fold user weights into the per-offset trajectory statistics
#[test]
fn trajectory_weights_reach_channel_stats() {
    let (mut lib, clips) = walk_stop_library();
    lib.trajectory_weight = 2.0;
    lib.trajectory_weights = vec![0.5, 1.0, 1.5];
    lib.trajectory_facing_weight = 3.0;
    lib.trajectory_facing_weights = vec![1.0, 2.0, 1.0];
    build_library(&mut lib, &clips).expect("build");

    approx(lib.trajectory_position_stats[0].user_weight, 1.0, 1e-6);
    approx(lib.trajectory_position_stats[2].user_weight, 3.0, 1e-6);
    approx(lib.trajectory_facing_stats[1].user_weight, 6.0, 1e-6);
    approx(lib.root_velocity_stats.user_weight, 1.0, 1e-6);
    // Root rotation speed carries no user weight.
    approx(lib.root_rotation_stats.user_weight, 1.0, 1e-6);
}

/// it should restore raw units through the library-level trajectory helpers
#[test]
fn library_trajectory_roundtrip() {
    let (mut lib, clips) = walk_stop_library();
    build_library(&mut lib, &clips).expect("build");

    let pose = &lib.states[0].cached_poses[2];
    let mut trajectory = pose.trajectory.clone();
    lib.denormalize_trajectory(&mut trajectory);
    lib.normalize_trajectory(&mut trajectory);

    for (restored, original) in trajectory.iter().zip(&pose.trajectory) {
        approx(restored.position.x, original.position.x, 1e-3);
        approx(restored.position.y, original.position.y, 1e-3);
        approx(restored.facing, original.facing, 1e-3);
    }
}
