//! Scene graph and scene assembly.
//!
//! A [`Scene`] is an arena of [`Node`]s. Nodes are only ever appended under a
//! parent that already exists and are never moved or removed, so the graph is
//! a forest by construction and no node can appear twice. Geometry and
//! surfaces are kept in tables on the scene and referenced by id, which lets
//! several meshes share one box or one set of texture maps.
//!
//! [`SceneBuilder`] turns [`StageSettings`] into the fixed scene of either
//! mode. Nothing here touches the GPU; see [`crate::stage`] for the upload.

use std::f32::consts::FRAC_PI_2;

use cgmath::Vector3;

use crate::{
    config::{MaterialMaps, SceneMode, StageSettings},
    data_structures::instance::Instance,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

impl GeometryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl SurfaceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shape descriptor of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// An axis-aligned box centred on the origin.
    Cuboid { width: f32, height: f32, depth: f32 },
}

/// Appearance descriptor of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    /// Unlit, single linear RGB colour.
    Flat { colour: [f32; 3] },
    /// Lit, modulated by image maps.
    Mapped(MaterialMaps),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    /// Uniform light reaching every surface regardless of orientation.
    Ambient { colour: [f32; 3], intensity: f32 },
    /// A rectangle emitting along its local -Z axis.
    RectArea {
        colour: [f32; 3],
        intensity: f32,
        width: f32,
        height: f32,
    },
}

/// Visual helpers: drawn, but not part of the scene content.
#[derive(Clone, Debug, PartialEq)]
pub enum Gizmo {
    /// Red X, green Y and blue Z axis lines of length `size`.
    Axes { size: f32 },
    /// Outline of a rectangular area light.
    RectAreaOutline { width: f32, height: f32, colour: [f32; 3] },
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: GeometryId,
        surface: SurfaceId,
    },
    Light(Light),
    Gizmo(Gizmo),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub transform: Instance,
    pub kind: NodeKind,
}

/// The scene graph root.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    geometries: Vec<Geometry>,
    surfaces: Vec<Surface>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_surface(&mut self, surface: Surface) -> SurfaceId {
        self.surfaces.push(surface);
        SurfaceId(self.surfaces.len() - 1)
    }

    /// Append a node at the top level.
    pub fn add(&mut self, name: &str, transform: Instance, kind: NodeKind) -> NodeId {
        self.push(name, None, transform, kind)
    }

    /// Append a node below `parent`.
    ///
    /// Panics if `parent` does not belong to this scene.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        transform: Instance,
        kind: NodeKind,
    ) -> NodeId {
        assert!(
            parent.0 < self.nodes.len(),
            "parent {:?} is not part of this scene",
            parent
        );
        self.push(name, Some(parent), transform, kind)
    }

    fn push(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        transform: Instance,
        kind: NodeKind,
    ) -> NodeId {
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            transform,
            kind,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(NodeId)
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(move |(_, n)| n.parent == Some(parent))
            .map(|(id, _)| id)
    }

    pub fn geometry(&self, id: GeometryId) -> &Geometry {
        &self.geometries[id.0]
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn surface(&self, id: SurfaceId) -> &Surface {
        &self.surfaces[id.0]
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: cgmath::Quaternion<f32>) {
        self.nodes[id.0].transform.rotation = rotation;
    }

    /// The node's transform composed with all of its ancestors'.
    pub fn world_transform(&self, id: NodeId) -> Instance {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => &self.world_transform(parent) * &node.transform,
            None => node.transform,
        }
    }

    /// Meshes and lights: what the scene shows, without groups and helpers.
    pub fn objects(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes().filter(|(_, n)| {
            matches!(n.kind, NodeKind::Mesh { .. } | NodeKind::Light(_))
        })
    }

    pub fn lights(&self) -> impl Iterator<Item = (NodeId, &Light)> {
        self.nodes().filter_map(|(id, n)| match &n.kind {
            NodeKind::Light(light) => Some((id, light)),
            _ => None,
        })
    }

    pub fn gizmos(&self) -> impl Iterator<Item = (NodeId, &Gizmo)> {
        self.nodes().filter_map(|(id, n)| match &n.kind {
            NodeKind::Gizmo(gizmo) => Some((id, gizmo)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub const CUBE: &str = "cube";
pub const ROOM: &str = "room";
pub const FLOOR: &str = "floor";
pub const WALL_LEFT: &str = "wall-left";
pub const WALL_RIGHT: &str = "wall-right";
pub const AMBIENT_LIGHT: &str = "ambient-light";
pub const AREA_LIGHT: &str = "area-light";
pub const AXES: &str = "axes";
pub const AREA_LIGHT_OUTLINE: &str = "area-light-outline";

const SHEET: Geometry = Geometry::Cuboid {
    width: 4.0,
    height: 4.0,
    depth: 0.1,
};

const AMBIENT_HEX: u32 = 0x404040;
/// CSS `purple`
const PURPLE_HEX: u32 = 0x800080;

/// An sRGB `0xRRGGBB` colour as the linear RGB the shaders light with.
pub fn linear_from_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

/// Assembles the fixed scene of a [`SceneMode`].
pub struct SceneBuilder<'a> {
    settings: &'a StageSettings,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(settings: &'a StageSettings) -> Self {
        Self { settings }
    }

    pub fn build(self) -> Scene {
        let mut scene = Scene::new();
        match self.settings.mode {
            SceneMode::Cube => self.build_cube(&mut scene),
            SceneMode::Room => self.build_room(&mut scene),
        }
        log::debug!(
            "assembled {} scene: {} nodes, {} objects",
            self.settings.mode,
            scene.len(),
            scene.objects().count()
        );
        scene
    }

    fn build_cube(&self, scene: &mut Scene) {
        let cube = &self.settings.cube;
        let geometry = scene.add_geometry(Geometry::Cuboid {
            width: cube.size,
            height: cube.size,
            depth: cube.size,
        });
        let surface = scene.add_surface(Surface::Flat {
            colour: cube.colour,
        });
        scene.add(
            CUBE,
            Instance::new(),
            NodeKind::Mesh { geometry, surface },
        );
    }

    fn build_room(&self, scene: &mut Scene) {
        let room_config = &self.settings.room;
        let sheet = scene.add_geometry(SHEET);
        let grass = scene.add_surface(Surface::Mapped(room_config.floor.clone()));
        let bricks = scene.add_surface(Surface::Mapped(room_config.walls.clone()));

        let room = scene.add(ROOM, Instance::new(), NodeKind::Group);
        scene.add_child(
            room,
            FLOOR,
            Instance::at(2.0, 0.0, 2.0).rotated(Vector3::unit_x(), cgmath::Rad(FRAC_PI_2)),
            NodeKind::Mesh {
                geometry: sheet,
                surface: grass,
            },
        );
        scene.add_child(
            room,
            WALL_LEFT,
            Instance::at(0.0, 2.0, 2.0).rotated(Vector3::unit_y(), cgmath::Rad(FRAC_PI_2)),
            NodeKind::Mesh {
                geometry: sheet,
                surface: bricks,
            },
        );
        scene.add_child(
            room,
            WALL_RIGHT,
            Instance::at(2.0, 2.0, 0.0),
            NodeKind::Mesh {
                geometry: sheet,
                surface: bricks,
            },
        );

        let purple = linear_from_hex(PURPLE_HEX);
        let area_light_transform =
            Instance::at(0.1, 1.1, 1.1).rotated(Vector3::unit_y(), cgmath::Rad(FRAC_PI_2));
        let area_light = scene.add(
            AREA_LIGHT,
            area_light_transform,
            NodeKind::Light(Light::RectArea {
                colour: purple,
                intensity: 2.0,
                width: 2.0,
                height: 2.0,
            }),
        );
        scene.add(
            AMBIENT_LIGHT,
            Instance::new(),
            NodeKind::Light(Light::Ambient {
                colour: linear_from_hex(AMBIENT_HEX),
                intensity: 4.0,
            }),
        );

        if room_config.show_gizmos {
            scene.add(AXES, Instance::new(), NodeKind::Gizmo(Gizmo::Axes { size: 5.0 }));
            scene.add_child(
                area_light,
                AREA_LIGHT_OUTLINE,
                Instance::new(),
                NodeKind::Gizmo(Gizmo::RectAreaOutline {
                    width: 2.0,
                    height: 2.0,
                    colour: purple,
                }),
            );
        }
    }
}
