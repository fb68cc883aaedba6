//! cube-stage
//!
//! A small cross-platform 3D stage with native and WASM support. It mounts
//! one of two fixed scenes: a flat-coloured cube spinning about two axes, or
//! a textured room (floor and two walls) lit by an ambient and a rectangular
//! area light and navigated with an orbit camera.
//!
//! High-level modules
//! - `config`: every recognised option with its default, and validation
//! - `camera`: camera, projection, orbit controller and the camera rig
//! - `context`: GPU context that owns device/queue/pipelines and the surface
//! - `data_structures`: scene graph, transforms, meshes, textures, animation
//! - `flow`: render loop state machine and the application event loop
//! - `pipelines`: the lit standard pipeline and the flat/line pipelines
//! - `resources`: asset loading and procedural meshes
//! - `render`: render composition for pipeline batching
//! - `stage`: a mounted scene, its per-frame update, resize and teardown
//! - `viewport`: drawing-surface size and pixel ratio clamping
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod stage;
pub mod viewport;

pub use config::{SceneMode, StageSettings};
pub use flow::{Launcher, LoopState, RenderLoop, StageControl, run};
pub use stage::Stage;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::WindowEvent;
