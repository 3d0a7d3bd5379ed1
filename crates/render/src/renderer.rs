use glam::Vec3;
use toydrive_kernel::DriveWorld;

use crate::scene::Scene;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 15.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads world state, the scene description and a view, then
/// produces output. It never mutates the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, world: &DriveWorld, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable dump of one frame.
///
/// Used by the CLI and in tests to exercise the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, world: &DriveWorld, scene: &Scene, view: &RenderView) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Drive World (tick={}) ===\n", world.tick()));
        out.push_str(&format!(
            "Vehicles: {}  Draw items: {}\n",
            world.vehicle_count(),
            scene.draw_list(world).len()
        ));
        out.push_str(&format!(
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        ));

        let player = world.player_id();
        for (id, v) in world.vehicles() {
            let marker = if player == Some(*id) { '*' } else { ' ' };
            out.push_str(&format!(
                "{marker} [{}] pos=({:.2}, {:.2}, {:.2}) heading={:.3} vel={:.3} ang={:.4} spin={:.2}\n",
                id.short(),
                v.position.x,
                v.position.y,
                v.position.z,
                v.heading,
                v.velocity,
                v.angular_velocity,
                v.wheels[0].spin
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneConfig;
    use toydrive_input::{InputState, KeyBindings};
    use toydrive_kernel::{DriveControls, VehicleSpec};

    fn accelerate() -> DriveControls {
        let mut input = InputState::new();
        input.key_down("w");
        input.drive_controls(&KeyBindings::default())
    }

    #[test]
    fn debug_renderer_empty_world() {
        let world = DriveWorld::new();
        let scene = Scene::bootstrap(&SceneConfig::default());
        let output = DebugTextRenderer::new().render(&world, &scene, &RenderView::default());

        assert!(output.contains("tick=0"));
        assert!(output.contains("Vehicles: 0"));
        // Ground plane only.
        assert!(output.contains("Draw items: 1"));
    }

    #[test]
    fn debug_renderer_marks_player() {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec::default());
        world.spawn(VehicleSpec {
            position: [4.0, 0.0],
            ..VehicleSpec::default()
        });
        world.step(accelerate());

        let scene = Scene::bootstrap(&SceneConfig::default());
        let output = DebugTextRenderer::new().render(&world, &scene, &RenderView::default());

        assert!(output.contains("tick=1"));
        assert!(output.contains("Vehicles: 2"));
        assert_eq!(output.lines().filter(|l| l.starts_with('*')).count(), 1);
        assert!(output.contains("vel=0.010"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 75.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
