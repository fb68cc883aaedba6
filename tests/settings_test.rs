use cube_stage::{SceneMode, StageSettings, config::MaterialMaps};

#[test]
fn defaults_are_valid() {
    for settings in [
        StageSettings::default(),
        StageSettings::cube(),
        StageSettings::room(),
    ] {
        settings.validate().expect("default settings validate");
    }
}

#[test]
fn defaults_match_the_demo() {
    let settings = StageSettings::default();
    assert_eq!(settings.mode, SceneMode::Cube);
    assert_eq!(settings.cube.rotation_speed_x, 0.01);
    assert_eq!(settings.cube.rotation_speed_y, 0.01);
    assert_eq!(settings.cube.size, 200.0);
    assert_eq!(settings.stage.camera_distance, 400.0);
    assert_eq!(settings.stage.field_of_view, 1.0);
    assert_eq!(settings.stage.near_clipping_plane, 1.0);
    assert_eq!(settings.stage.far_clipping_plane, 1000.0);
    assert_eq!(settings.max_pixel_ratio, 2.0);
    assert!(settings.orbit.enabled && settings.orbit.enable_damping);
    assert_eq!(settings.background, wgpu::Color::BLACK);
}

#[test]
fn room_textures_use_the_conventional_layout() {
    let settings = StageSettings::room();
    assert_eq!(
        settings.room.floor.colour.as_deref(),
        Some("textures/grass/color.jpg")
    );
    let walls: Vec<_> = settings.room.walls.paths().collect();
    assert_eq!(
        walls,
        [
            "textures/bricks/color.jpg",
            "textures/bricks/ambientOcclusion.jpg",
            "textures/bricks/normal.jpg",
            "textures/bricks/roughness.jpg",
        ]
    );
    assert_eq!(MaterialMaps::default().paths().count(), 0);
}

type Breaker = fn(&mut StageSettings);

#[test]
fn each_invalid_field_is_rejected() {
    let cases: &[(&str, Breaker)] = &[
        ("nan speed", |s| s.cube.rotation_speed_x = f32::NAN),
        ("infinite speed", |s| s.cube.rotation_speed_y = f32::INFINITY),
        ("zero size", |s| s.cube.size = 0.0),
        ("negative size", |s| s.cube.size = -1.0),
        ("zero fov", |s| s.stage.field_of_view = 0.0),
        ("flat fov", |s| s.stage.field_of_view = 180.0),
        ("zero near", |s| s.stage.near_clipping_plane = 0.0),
        ("far before near", |s| s.stage.far_clipping_plane = 0.5),
        ("far at near", |s| s.stage.far_clipping_plane = 1.0),
        ("zero distance", |s| s.stage.camera_distance = 0.0),
        ("zero damping", |s| s.orbit.damping_factor = 0.0),
        ("damping above one", |s| s.orbit.damping_factor = 1.5),
        ("negative rotate speed", |s| s.orbit.rotate_speed = -1.0),
        ("negative zoom speed", |s| s.orbit.zoom_speed = -1.0),
        ("nan pan speed", |s| s.orbit.pan_speed = f32::NAN),
        ("negative min distance", |s| s.orbit.min_distance = -1.0),
        ("inverted distances", |s| {
            s.orbit.min_distance = 10.0;
            s.orbit.max_distance = 5.0;
        }),
        ("pixel ratio below one", |s| s.max_pixel_ratio = 0.5),
        ("nan pixel ratio", |s| s.max_pixel_ratio = f64::NAN),
    ];

    for (name, break_it) in cases {
        let mut settings = StageSettings::room();
        break_it(&mut settings);
        assert!(settings.validate().is_err(), "{} was accepted", name);
    }
}

#[test]
fn validation_errors_name_the_field() {
    let mut settings = StageSettings::default();
    settings.stage.field_of_view = 270.0;
    let message = settings.validate().unwrap_err().to_string();
    assert!(message.contains("field of view"), "{}", message);
}

#[test]
fn scene_mode_parses_from_text() {
    assert_eq!("cube".parse::<SceneMode>().unwrap(), SceneMode::Cube);
    assert_eq!(" Room ".parse::<SceneMode>().unwrap(), SceneMode::Room);
    assert!("sphere".parse::<SceneMode>().is_err());
    assert_eq!(SceneMode::Room.to_string(), "room");
}

#[test]
fn builders_set_mode_and_asset_root() {
    let settings = StageSettings::default()
        .with_mode(SceneMode::Room)
        .with_asset_root("/srv/assets");
    assert_eq!(settings.mode, SceneMode::Room);
    assert_eq!(settings.asset_root, "/srv/assets");
    assert_eq!(StageSettings::room().mode, SceneMode::Room);
}
