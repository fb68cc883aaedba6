use std::f32::consts::TAU;

use assert_approx_eq::assert_approx_eq;
use cube_stage::{LoopState, RenderLoop, data_structures::animation::Spin};

#[test]
fn loop_starts_idle_and_draws_nothing() {
    let mut render_loop = RenderLoop::new();
    assert_eq!(render_loop.state(), LoopState::Idle);
    assert_eq!(render_loop.begin_frame(), None);
    assert_eq!(render_loop.frames(), 0);
}

#[test]
fn frames_are_only_counted_while_running() {
    let mut render_loop = RenderLoop::new();
    assert!(render_loop.start());
    for _ in 0..5 {
        assert!(render_loop.begin_frame().is_some());
    }
    assert!(render_loop.stop());
    assert_eq!(render_loop.begin_frame(), None);
    assert_eq!(render_loop.frames(), 5);

    assert!(render_loop.start());
    assert!(render_loop.begin_frame().is_some());
    assert_eq!(render_loop.frames(), 6);
}

#[test]
fn first_frame_after_start_has_no_elapsed_time() {
    let mut render_loop = RenderLoop::new();
    render_loop.start();
    assert_eq!(render_loop.begin_frame(), Some(instant::Duration::ZERO));
}

#[test]
fn transitions_follow_the_state_machine() {
    let mut render_loop = RenderLoop::new();
    assert!(!render_loop.stop(), "an idle loop cannot stop");
    assert!(render_loop.start());
    assert!(!render_loop.start(), "already running");
    assert!(render_loop.stop());
    assert_eq!(render_loop.state(), LoopState::Stopped);
    assert!(!render_loop.stop());
    assert!(render_loop.teardown());
    assert_eq!(render_loop.state(), LoopState::TornDown);
    assert!(!render_loop.teardown());
}

#[test]
fn a_torn_down_loop_stays_down() {
    let mut render_loop = RenderLoop::new();
    render_loop.start();
    render_loop.teardown();
    assert!(!render_loop.start());
    assert_eq!(render_loop.begin_frame(), None);
    assert_eq!(render_loop.state(), LoopState::TornDown);
}

/// Distance between two angles on the circle.
fn angle_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[test]
fn spin_angles_grow_by_one_increment_per_tick() {
    let (speed_x, speed_y) = (0.01, 0.03);
    let mut spin = Spin::new(speed_x, speed_y);
    for ticks in 1..=1000u32 {
        spin.advance();
        let (x, y) = spin.angles();
        assert_approx_eq!(angle_distance(x.0, ticks as f32 * speed_x), 0.0, 1e-3);
        assert_approx_eq!(angle_distance(y.0, ticks as f32 * speed_y), 0.0, 1e-3);
    }
}

#[test]
fn spin_angles_stay_within_one_turn() {
    let mut spin = Spin::new(2.0, -2.0);
    for _ in 0..100 {
        spin.advance();
        let (x, y) = spin.angles();
        assert!((0.0..TAU).contains(&x.0));
        assert!((0.0..TAU).contains(&y.0));
    }
}

#[test]
fn spin_without_ticks_does_not_rotate() {
    use cgmath::One;
    let spin = Spin::new(0.01, 0.01);
    assert_eq!(spin.rotation(), cgmath::Quaternion::one());
}
