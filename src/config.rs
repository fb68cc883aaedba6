//! Stage configuration.
//!
//! Every option the stage recognises is listed here with its default. Hosts
//! override what they need and call [`StageSettings::validate`] (the stage does
//! so on mount) before anything touches the GPU.

use std::{fmt, str::FromStr};

use anyhow::{bail, ensure};

/// Which scene the stage assembles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneMode {
    /// A single flat-coloured cube spinning about X and Y.
    #[default]
    Cube,
    /// A textured floor and two walls lit by an ambient and an area light,
    /// navigated with an orbit camera.
    Room,
}

impl FromStr for SceneMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cube" => Ok(SceneMode::Cube),
            "room" => Ok(SceneMode::Room),
            other => bail!("unknown scene mode '{}', expected 'cube' or 'room'", other),
        }
    }
}

impl fmt::Display for SceneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneMode::Cube => f.write_str("cube"),
            SceneMode::Room => f.write_str("room"),
        }
    }
}

/// Size, colour and per-frame rotation of the cube.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeConfig {
    /// Radians added to the X rotation every frame.
    pub rotation_speed_x: f32,
    /// Radians added to the Y rotation every frame.
    pub rotation_speed_y: f32,
    /// Edge length in world units.
    pub size: f32,
    /// Linear RGB.
    pub colour: [f32; 3],
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            rotation_speed_x: 0.01,
            rotation_speed_y: 0.01,
            size: 200.0,
            colour: [0.13, 0.58, 0.81],
        }
    }
}

/// Perspective camera parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct StageConfig {
    /// Distance of the camera from the origin along each positioned axis.
    pub camera_distance: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub near_clipping_plane: f32,
    pub far_clipping_plane: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            camera_distance: 400.0,
            field_of_view: 1.0,
            near_clipping_plane: 1.0,
            far_clipping_plane: 1000.0,
        }
    }
}

/// Orbit navigation used by the room scene.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitConfig {
    pub enabled: bool,
    pub enable_damping: bool,
    /// Share of the pending motion applied per frame when damping is on.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Paths (relative to the asset root) of the images modulating one surface.
///
/// A missing map is replaced by a neutral 1x1 texture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterialMaps {
    pub colour: Option<String>,
    pub ambient_occlusion: Option<String>,
    pub normal: Option<String>,
    pub roughness: Option<String>,
}

impl MaterialMaps {
    /// The conventional `<dir>/{color,ambientOcclusion,normal,roughness}.jpg` layout.
    pub fn in_dir(dir: &str) -> Self {
        let path = |name: &str| Some(format!("{}/{}.jpg", dir.trim_end_matches('/'), name));
        Self {
            colour: path("color"),
            ambient_occlusion: path("ambientOcclusion"),
            normal: path("normal"),
            roughness: path("roughness"),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        [
            &self.colour,
            &self.ambient_occlusion,
            &self.normal,
            &self.roughness,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomConfig {
    pub floor: MaterialMaps,
    pub walls: MaterialMaps,
    /// Draw the axes gizmo and the outline of the area light.
    pub show_gizmos: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            floor: MaterialMaps::in_dir("textures/grass"),
            walls: MaterialMaps::in_dir("textures/bricks"),
            show_gizmos: true,
        }
    }
}

/// Everything a stage needs to know before it mounts.
#[derive(Clone, Debug, PartialEq)]
pub struct StageSettings {
    pub mode: SceneMode,
    pub cube: CubeConfig,
    pub stage: StageConfig,
    pub orbit: OrbitConfig,
    pub room: RoomConfig,
    /// Directory (native) or URL path segment (web) that asset paths are relative to.
    pub asset_root: String,
    /// Upper bound for the device pixel ratio used to size the surface.
    pub max_pixel_ratio: f64,
    pub background: wgpu::Color,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            mode: SceneMode::default(),
            cube: CubeConfig::default(),
            stage: StageConfig::default(),
            orbit: OrbitConfig::default(),
            room: RoomConfig::default(),
            asset_root: "assets".to_string(),
            max_pixel_ratio: 2.0,
            background: wgpu::Color::BLACK,
        }
    }
}

impl StageSettings {
    pub fn cube() -> Self {
        Self::default()
    }

    pub fn room() -> Self {
        Self {
            mode: SceneMode::Room,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: SceneMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Reject settings the stage cannot render with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let cube = &self.cube;
        ensure!(
            cube.rotation_speed_x.is_finite() && cube.rotation_speed_y.is_finite(),
            "cube rotation speeds must be finite, got ({}, {})",
            cube.rotation_speed_x,
            cube.rotation_speed_y
        );
        ensure!(
            cube.size.is_finite() && cube.size > 0.0,
            "cube size must be positive, got {}",
            cube.size
        );

        let stage = &self.stage;
        ensure!(
            stage.field_of_view > 0.0 && stage.field_of_view < 180.0,
            "field of view must lie in (0, 180) degrees, got {}",
            stage.field_of_view
        );
        ensure!(
            stage.near_clipping_plane > 0.0,
            "near clipping plane must be positive, got {}",
            stage.near_clipping_plane
        );
        ensure!(
            stage.far_clipping_plane > stage.near_clipping_plane,
            "far clipping plane ({}) must lie beyond the near plane ({})",
            stage.far_clipping_plane,
            stage.near_clipping_plane
        );
        ensure!(
            stage.camera_distance.is_finite() && stage.camera_distance > 0.0,
            "camera distance must be positive, got {}",
            stage.camera_distance
        );

        let orbit = &self.orbit;
        ensure!(
            orbit.damping_factor > 0.0 && orbit.damping_factor <= 1.0,
            "damping factor must lie in (0, 1], got {}",
            orbit.damping_factor
        );
        for (name, speed) in [
            ("rotate", orbit.rotate_speed),
            ("zoom", orbit.zoom_speed),
            ("pan", orbit.pan_speed),
        ] {
            ensure!(
                speed.is_finite() && speed >= 0.0,
                "orbit {} speed must be a non-negative number, got {}",
                name,
                speed
            );
        }
        ensure!(
            orbit.min_distance >= 0.0 && orbit.min_distance <= orbit.max_distance,
            "orbit distance bounds [{}, {}] are inverted or negative",
            orbit.min_distance,
            orbit.max_distance
        );

        ensure!(
            self.max_pixel_ratio.is_finite() && self.max_pixel_ratio >= 1.0,
            "maximum pixel ratio must be at least 1, got {}",
            self.max_pixel_ratio
        );
        Ok(())
    }
}
