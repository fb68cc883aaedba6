//! Engine data structures: scene graph, transforms, meshes and textures.
//!
//! - `animation` holds the per-frame spin of the cube
//! - `instance` holds per-object transforms and their GPU layout
//! - `model` contains meshes, materials and vertex layouts
//! - `scene_graph` is the CPU-side scene and its builder
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod animation;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
