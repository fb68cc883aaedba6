use assert_approx_eq::assert_approx_eq;
use cgmath::{InnerSpace, MetricSpace, Point3, Rad};
use cube_stage::{
    camera::{Camera, OrbitController},
    config::OrbitConfig,
};

const FOVY: Rad<f32> = Rad(0.8);

fn camera() -> Camera {
    Camera::new(Point3::new(0.0, 0.0, 10.0), Point3::new(0.0, 0.0, 0.0))
}

fn azimuth(camera: &Camera) -> f32 {
    let offset = camera.position - camera.target;
    offset.x.atan2(offset.z)
}

fn damped(factor: f32) -> OrbitController {
    OrbitController::new(
        OrbitConfig {
            enable_damping: true,
            damping_factor: factor,
            ..Default::default()
        },
        600,
    )
}

#[test]
fn input_alone_never_moves_the_camera() {
    let mut controller = damped(0.05);
    let start = camera();
    let mut pose = start;
    controller.rotate_left(Rad(0.5));
    controller.dolly(0.5);
    controller.pan(30.0, 10.0);
    assert_eq!(pose, start);
    assert!(!controller.is_settled());

    assert!(controller.update(&mut pose, FOVY));
    assert_ne!(pose, start);
}

#[test]
fn each_update_applies_the_damping_factor_of_the_remainder() {
    let factor = 0.25;
    let mut controller = damped(factor);
    let mut camera = camera();
    controller.rotate_left(Rad(1.0));

    let mut expected = 0.0;
    let mut remaining = 1.0;
    for _ in 0..5 {
        assert!(controller.update(&mut camera, FOVY));
        expected += remaining * factor;
        remaining *= 1.0 - factor;
        // rotate_left turns the azimuth negative
        assert_approx_eq!(azimuth(&camera), -expected, 1e-4);
    }
}

#[test]
fn damped_rotation_converges_to_the_full_delta() {
    let mut controller = damped(0.05);
    let mut camera = camera();
    controller.rotate_left(Rad(0.6));
    for _ in 0..1000 {
        controller.update(&mut camera, FOVY);
    }
    assert_approx_eq!(azimuth(&camera), -0.6, 1e-4);
    assert!(controller.is_settled());
    assert!(!controller.update(&mut camera, FOVY));
}

#[test]
fn without_damping_the_whole_delta_applies_at_once() {
    let mut controller = OrbitController::new(
        OrbitConfig {
            enable_damping: false,
            ..Default::default()
        },
        600,
    );
    let mut camera = camera();
    controller.rotate_left(Rad(0.6));
    assert!(controller.update(&mut camera, FOVY));
    assert_approx_eq!(azimuth(&camera), -0.6, 1e-5);
    assert!(controller.is_settled());
}

#[test]
fn orbiting_keeps_the_distance_to_the_target() {
    let mut controller = damped(0.1);
    let mut camera = camera();
    controller.rotate_left(Rad(2.0));
    controller.rotate_up(Rad(0.3));
    for _ in 0..50 {
        controller.update(&mut camera, FOVY);
        assert_approx_eq!(camera.position.distance(camera.target), 10.0, 1e-3);
    }
}

#[test]
fn tilting_stops_short_of_the_pole() {
    let mut controller = damped(1.0);
    let mut camera = camera();
    controller.rotate_up(Rad(10.0));
    controller.update(&mut camera, FOVY);
    let offset = (camera.position - camera.target).normalize();
    assert!(offset.y > 0.99);
    assert!(offset.x.hypot(offset.z) > 0.0, "camera reached the pole");
}

#[test]
fn wheel_zoom_scales_the_distance_and_respects_bounds() {
    let mut controller = OrbitController::new(
        OrbitConfig {
            enable_damping: false,
            min_distance: 5.0,
            max_distance: 12.0,
            ..Default::default()
        },
        600,
    );
    let mut camera = camera();

    controller.zoom_by_lines(1.0);
    controller.update(&mut camera, FOVY);
    assert_approx_eq!(camera.position.distance(camera.target), 9.5, 1e-4);

    controller.zoom_by_lines(100.0);
    controller.update(&mut camera, FOVY);
    assert_approx_eq!(camera.position.distance(camera.target), 5.0, 1e-4);

    controller.zoom_by_lines(-100.0);
    controller.update(&mut camera, FOVY);
    assert_approx_eq!(camera.position.distance(camera.target), 12.0, 1e-4);
}

#[test]
fn pointer_drag_feeds_the_controller() {
    use winit::{
        dpi::PhysicalPosition,
        event::{DeviceId, ElementState, MouseButton, WindowEvent},
    };

    let mut controller = OrbitController::new(
        OrbitConfig {
            enable_damping: false,
            ..Default::default()
        },
        600,
    );
    let device_id = unsafe { DeviceId::dummy() };
    let moved = |x: f64| WindowEvent::CursorMoved {
        device_id,
        position: PhysicalPosition::new(x, 300.0),
    };

    assert!(!controller.handle_window_event(&moved(100.0)));
    assert!(controller.handle_window_event(&WindowEvent::MouseInput {
        device_id,
        state: ElementState::Pressed,
        button: MouseButton::Left,
    }));
    assert!(controller.handle_window_event(&moved(160.0)));

    let mut camera = camera();
    assert!(controller.update(&mut camera, FOVY));
    // 60 of 600 pixels is a tenth of a turn
    assert_approx_eq!(azimuth(&camera), -std::f32::consts::TAU / 10.0, 1e-4);
}

#[test]
fn drag_turns_the_same_at_any_scale_factor() {
    use cube_stage::{SceneMode, StageSettings, camera::CameraRig, viewport::Viewport};
    use winit::{
        dpi::{PhysicalPosition, PhysicalSize},
        event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    };

    let mut settings = StageSettings::room();
    settings.orbit.enable_damping = false;
    let device_id = unsafe { DeviceId::dummy() };

    // The same 60 logical pixel drag and 50 logical pixel scroll on an
    // 800x600 logical window at 1x and 2x
    let turn = |scale_factor: f64| {
        let window = PhysicalSize::new(
            (800.0 * scale_factor) as u32,
            (600.0 * scale_factor) as u32,
        );
        let viewport = Viewport::from_physical(window, scale_factor, 2.0);
        let mut rig =
            CameraRig::for_viewport(SceneMode::Room, &settings.stage, &settings.orbit, &viewport);
        let start = rig.camera;

        let at = |x: f64| WindowEvent::CursorMoved {
            device_id,
            position: PhysicalPosition::new(x * scale_factor, 300.0 * scale_factor),
        };
        rig.handle_window_event(&at(100.0));
        rig.handle_window_event(&WindowEvent::MouseInput {
            device_id,
            state: ElementState::Pressed,
            button: MouseButton::Left,
        });
        rig.handle_window_event(&at(160.0));
        rig.handle_window_event(&WindowEvent::MouseWheel {
            device_id,
            delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 50.0 * scale_factor)),
            phase: TouchPhase::Moved,
        });
        assert!(rig.advance());

        let distance = |camera: &Camera| camera.position.distance(camera.target);
        (
            azimuth(&rig.camera) - azimuth(&start),
            distance(&rig.camera) / distance(&start),
        )
    };

    let (turn_1x, zoom_1x) = turn(1.0);
    let (turn_2x, zoom_2x) = turn(2.0);
    // 60 of 600 logical pixels is a tenth of a turn
    assert_approx_eq!(turn_1x, -std::f32::consts::TAU / 10.0, 1e-4);
    assert_approx_eq!(turn_2x, turn_1x, 1e-4);
    assert_approx_eq!(zoom_2x, zoom_1x, 1e-5);
    assert!(zoom_1x < 1.0);
}
