use std::collections::HashSet;

use assert_approx_eq::assert_approx_eq;
use cgmath::InnerSpace;
use cube_stage::{
    StageSettings,
    data_structures::scene_graph::{self, Gizmo, Light, NodeKind, SceneBuilder, Surface},
    pipelines::light::LightUniform,
};

fn object_names(settings: &StageSettings) -> Vec<String> {
    SceneBuilder::new(settings)
        .build()
        .objects()
        .map(|(_, node)| node.name.clone())
        .collect()
}

#[test]
fn cube_scene_has_a_single_object() {
    let settings = StageSettings::cube();
    let scene = SceneBuilder::new(&settings).build();

    let objects: Vec<_> = scene.objects().collect();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].1.name, scene_graph::CUBE);
    assert_eq!(scene.lights().count(), 0);
    assert_eq!(scene.gizmos().count(), 0);

    let NodeKind::Mesh { geometry, surface } = &objects[0].1.kind else {
        panic!("the cube is not a mesh");
    };
    assert_eq!(
        *scene.geometry(*geometry),
        scene_graph::Geometry::Cuboid {
            width: 200.0,
            height: 200.0,
            depth: 200.0
        }
    );
    assert!(matches!(scene.surface(*surface), Surface::Flat { .. }));
}

#[test]
fn room_scene_has_five_objects() {
    let mut names = object_names(&StageSettings::room());
    names.sort();
    assert_eq!(
        names,
        [
            scene_graph::AMBIENT_LIGHT,
            scene_graph::AREA_LIGHT,
            scene_graph::FLOOR,
            scene_graph::WALL_LEFT,
            scene_graph::WALL_RIGHT,
        ]
    );
}

#[test]
fn objects_are_never_duplicated() {
    for settings in [StageSettings::cube(), StageSettings::room()] {
        let names = object_names(&settings);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}

#[test]
fn building_again_gives_the_same_scene() {
    let settings = StageSettings::room();
    let first = object_names(&settings);
    for _ in 0..3 {
        assert_eq!(object_names(&settings), first);
    }
}

#[test]
fn room_sheets_share_geometry_and_walls_share_a_surface() {
    let settings = StageSettings::room();
    let scene = SceneBuilder::new(&settings).build();
    let mesh_of = |name: &str| {
        let id = scene.find(name).expect("node exists");
        match scene.node(id).kind {
            NodeKind::Mesh { geometry, surface } => (geometry, surface),
            _ => panic!("{} is not a mesh", name),
        }
    };

    let (floor_geometry, floor_surface) = mesh_of(scene_graph::FLOOR);
    let (left_geometry, left_surface) = mesh_of(scene_graph::WALL_LEFT);
    let (right_geometry, right_surface) = mesh_of(scene_graph::WALL_RIGHT);

    assert_eq!(floor_geometry, left_geometry);
    assert_eq!(left_geometry, right_geometry);
    assert_eq!(scene.geometries().len(), 1);
    assert_eq!(left_surface, right_surface);
    assert_ne!(floor_surface, left_surface);
    assert_eq!(
        *scene.surface(floor_surface),
        Surface::Mapped(settings.room.floor.clone())
    );
}

#[test]
fn room_meshes_hang_below_the_room_group() {
    let scene = SceneBuilder::new(&StageSettings::room()).build();
    let room = scene.find(scene_graph::ROOM).expect("room group");
    assert!(matches!(scene.node(room).kind, NodeKind::Group));
    let children: HashSet<_> = scene
        .children(room)
        .map(|id| scene.node(id).name.clone())
        .collect();
    assert_eq!(
        children,
        HashSet::from([
            scene_graph::FLOOR.to_string(),
            scene_graph::WALL_LEFT.to_string(),
            scene_graph::WALL_RIGHT.to_string(),
        ])
    );
}

#[test]
fn floor_lies_flat_and_left_wall_faces_x() {
    let scene = SceneBuilder::new(&StageSettings::room()).build();

    let floor = scene.world_transform(scene.find(scene_graph::FLOOR).unwrap());
    assert_approx_eq!(floor.position.x, 2.0);
    assert_approx_eq!(floor.position.y, 0.0);
    assert_approx_eq!(floor.position.z, 2.0);
    // A sheet's thin axis is local Z; lying flat it points along world Y
    let floor_normal = floor.rotation * cgmath::Vector3::unit_z();
    assert_approx_eq!(floor_normal.y.abs(), 1.0, 1e-5);

    let wall = scene.world_transform(scene.find(scene_graph::WALL_LEFT).unwrap());
    let wall_normal = wall.rotation * cgmath::Vector3::unit_z();
    assert_approx_eq!(wall_normal.x.abs(), 1.0, 1e-5);
}

#[test]
fn area_light_outline_follows_the_light() {
    let scene = SceneBuilder::new(&StageSettings::room()).build();
    let light = scene.find(scene_graph::AREA_LIGHT).unwrap();
    let outline = scene.find(scene_graph::AREA_LIGHT_OUTLINE).unwrap();

    assert_eq!(scene.node(outline).parent, Some(light));
    assert_eq!(scene.world_transform(outline), scene.world_transform(light));
    assert!(matches!(
        scene.node(outline).kind,
        NodeKind::Gizmo(Gizmo::RectAreaOutline { .. })
    ));
}

#[test]
fn gizmos_can_be_switched_off() {
    let mut settings = StageSettings::room();
    settings.room.show_gizmos = false;
    let scene = SceneBuilder::new(&settings).build();
    assert_eq!(scene.gizmos().count(), 0);
    assert_eq!(scene.objects().count(), 5);
}

#[test]
fn room_lights_match_the_demo() {
    let scene = SceneBuilder::new(&StageSettings::room()).build();
    let lights: Vec<_> = scene.lights().map(|(_, light)| light.clone()).collect();
    assert!(lights.contains(&Light::Ambient {
        colour: scene_graph::linear_from_hex(0x404040),
        intensity: 4.0
    }));
    assert!(lights.iter().any(|light| matches!(
        light,
        Light::RectArea { intensity, width, height, .. }
            if *intensity == 2.0 && *width == 2.0 && *height == 2.0
    )));
}

#[test]
fn light_uniform_points_the_area_light_towards_minus_x() {
    let scene = SceneBuilder::new(&StageSettings::room()).build();
    let uniform = LightUniform::from_scene(&scene);

    assert_approx_eq!(uniform.position[0], 0.1);
    assert_approx_eq!(uniform.position[1], 1.1);
    assert_approx_eq!(uniform.position[2], 1.1);
    let normal = cgmath::Vector3::new(uniform.normal[0], uniform.normal[1], uniform.normal[2]);
    assert_approx_eq!(normal.magnitude(), 1.0, 1e-5);
    assert_approx_eq!(normal.x, -1.0, 1e-5);
    assert_approx_eq!(uniform.right[3], 1.0);
    assert_approx_eq!(uniform.up[3], 1.0);
    assert_eq!(uniform.colour[3], 1.0);
    // 0x40 is about 0.051 in linear light
    assert_approx_eq!(uniform.ambient[0], 0.0513 * 4.0, 1e-3);
}

#[test]
fn cube_scene_is_unlit() {
    let scene = SceneBuilder::new(&StageSettings::cube()).build();
    assert_eq!(LightUniform::from_scene(&scene), LightUniform::dark());
}

#[test]
fn hex_colours_are_decoded_from_srgb() {
    let [r, g, b] = scene_graph::linear_from_hex(0x404040);
    assert_approx_eq!(r, 0.0513, 1e-4);
    assert_eq!((r, r), (g, b));

    assert_eq!(scene_graph::linear_from_hex(0xffffff), [1.0, 1.0, 1.0]);
    assert_eq!(scene_graph::linear_from_hex(0x000000), [0.0, 0.0, 0.0]);
    let purple = scene_graph::linear_from_hex(0x800080);
    assert_approx_eq!(purple[0], 0.2158, 1e-4);
    assert_eq!(purple[1], 0.0);
    assert_eq!(purple[0], purple[2]);
}
