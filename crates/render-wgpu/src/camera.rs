use glam::{Mat4, Vec3};
use toydrive_render::RenderView;

/// Perspective projection parameters. The view itself comes from the camera
/// rig each frame; this only tracks what changes on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    /// Recompute the aspect ratio from a viewport size in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(view: &RenderView) -> Mat4 {
        Mat4::look_at_rh(view.eye, view.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, view: &RenderView) -> Mat4 {
        Mat4::perspective_rh(view.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, view: &RenderView) -> Mat4 {
        self.projection_matrix(view) * Self::view_matrix(view)
    }
}
