//! Rendering Adapter: scene description, camera rig and a renderer-agnostic interface.
//!
//! # Invariants
//! - Renderer cannot mutate world truth directly.
//! - Render state derives from the drive world and the camera rig each frame.
//! - The camera snaps to its computed pose; there is no smoothing.

mod camera;
mod renderer;
mod scene;

pub use camera::{CameraError, CameraMode, CameraRig, ChaseSettings, OrbitSettings};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use scene::{DrawItem, Light, Primitive, Scene, SceneConfig, WHEEL_SEGMENTS};

pub fn crate_info() -> &'static str {
    "toydrive-render v0.1.0"
}
