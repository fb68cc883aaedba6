use assert_approx_eq::assert_approx_eq;
use cgmath::{Deg, EuclideanSpace, Point3, Rad};
use cube_stage::{SceneMode, StageSettings, camera::CameraRig};

fn rig_for(settings: &StageSettings, width: u32, height: u32) -> CameraRig {
    CameraRig::new(
        settings.mode,
        &settings.stage,
        &settings.orbit,
        width,
        height,
    )
}

#[test]
fn default_projection_is_the_same_in_both_modes() {
    for settings in [StageSettings::cube(), StageSettings::room()] {
        let rig = rig_for(&settings, 800, 600);
        let fovy: Rad<f32> = Deg(1.0).into();
        assert_approx_eq!(rig.projection.fovy().0, fovy.0);
        assert_approx_eq!(rig.projection.znear(), 1.0);
        assert_approx_eq!(rig.projection.zfar(), 1000.0);
    }
}

#[test]
fn cube_camera_looks_down_minus_z() {
    let rig = rig_for(&StageSettings::cube(), 800, 600);
    assert_eq!(rig.camera.position, Point3::new(0.0, 0.0, 400.0));
    assert_eq!(rig.camera.target, Point3::origin());
    assert!(rig.controller.is_none());
}

#[test]
fn room_camera_looks_at_the_origin_diagonally() {
    let rig = rig_for(&StageSettings::room(), 800, 600);
    assert_eq!(rig.camera.position, Point3::new(400.0, 400.0, 400.0));
    assert_eq!(rig.camera.target, Point3::origin());
    assert!(rig.controller.is_some());
}

#[test]
fn disabled_orbit_leaves_the_room_camera_fixed() {
    let mut settings = StageSettings::room();
    settings.orbit.enabled = false;
    let mut rig = rig_for(&settings, 800, 600);
    assert!(rig.controller.is_none());
    assert!(!rig.advance());
}

#[test]
fn camera_distance_is_configurable() {
    let mut settings = StageSettings::default().with_mode(SceneMode::Cube);
    settings.stage.camera_distance = 25.0;
    let rig = rig_for(&settings, 100, 100);
    assert_eq!(rig.camera.position, Point3::new(0.0, 0.0, 25.0));
}

#[test]
fn aspect_follows_every_positive_resize() {
    let mut rig = rig_for(&StageSettings::room(), 800, 600);
    assert_approx_eq!(rig.projection.aspect(), 800.0 / 600.0);
    for (width, height) in [(1920, 1080), (300, 900), (1, 1), (4096, 17)] {
        rig.resize(width, height);
        assert_approx_eq!(rig.projection.aspect(), width as f32 / height as f32);
    }
}

#[test]
fn zero_sized_resize_keeps_the_aspect() {
    let mut rig = rig_for(&StageSettings::cube(), 800, 600);
    rig.resize(0, 600);
    rig.resize(800, 0);
    assert_approx_eq!(rig.projection.aspect(), 800.0 / 600.0);
}

#[test]
fn resize_marks_the_projection_dirty_only_on_change() {
    let mut rig = rig_for(&StageSettings::cube(), 800, 600);
    assert!(rig.projection.is_dirty());
    rig.projection.mark_clean();

    rig.resize(800, 600);
    assert!(!rig.projection.is_dirty());

    rig.resize(1024, 600);
    assert!(rig.projection.is_dirty());
}

#[test]
fn view_projection_puts_the_origin_in_the_middle() {
    use cgmath::Vector4;
    for settings in [StageSettings::cube(), StageSettings::room()] {
        let rig = rig_for(&settings, 800, 600);
        let clip = rig.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_approx_eq!(clip.x / clip.w, 0.0, 1e-4);
        assert_approx_eq!(clip.y / clip.w, 0.0, 1e-4);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth), "depth {} outside clip range", depth);
    }
}

#[test]
fn fitting_a_viewport_takes_the_aspect_of_its_surface() {
    use cube_stage::viewport::Viewport;
    use winit::dpi::PhysicalSize;

    let settings = StageSettings::room();
    let mut rig = rig_for(&settings, 800, 600);
    for viewport in [
        Viewport::from_physical(PhysicalSize::new(1000, 600), 1.5, 2.0),
        Viewport::from_physical(PhysicalSize::new(1000, 601), 2.5, 2.0),
    ] {
        rig.fit(&viewport);
        assert_eq!(rig.projection.aspect(), viewport.aspect());
    }

    let empty = Viewport::from_physical(PhysicalSize::new(0, 600), 1.0, 2.0);
    let before = rig.projection.aspect();
    rig.fit(&empty);
    assert_eq!(rig.projection.aspect(), before);
}
