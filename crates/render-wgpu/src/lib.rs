//! wgpu render backend for the driving scene.
//!
//! Draws the scene's flattened draw list as instanced unit meshes (box,
//! cylinder, plane) with ambient + directional lighting, plus a line grid over
//! the ground so motion is visible.
//!
//! # Invariants
//! - Renderer never mutates world state.
//! - One draw call per primitive kind per frame.

mod camera;
mod gpu;
mod mesh;
mod shaders;

pub use camera::Projection;
pub use gpu::WgpuRenderer;
