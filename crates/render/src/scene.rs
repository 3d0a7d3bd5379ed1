//! Scene bootstrap: lights, ground and the primitive-built vehicle model.
//!
//! The scene is a flat description; per frame it flattens every vehicle's
//! body/wheel/marker hierarchy into world-space [`DrawItem`]s that a backend
//! draws without knowing anything about vehicles.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use toydrive_common::Color;
use toydrive_kernel::{DriveWorld, Vehicle, Wheel};

/// Body box dimensions (width, height, length).
pub const BODY_SIZE: Vec3 = Vec3::new(2.0, 1.0, 4.0);
/// Body centre above the vehicle origin.
pub const BODY_LIFT: f32 = 0.5;
pub const WHEEL_RADIUS: f32 = 0.4;
pub const WHEEL_WIDTH: f32 = 0.3;
pub const WHEEL_SEGMENTS: u32 = 16;
pub const WHEEL_COLOR: Color = Color(0x111111);
/// Rotation marker bar stuck to each wheel's outer face.
pub const MARKER_SIZE: Vec3 = Vec3::new(0.3, 0.02, 0.02);
pub const MARKER_INSET: f32 = 0.16;

/// A shape the backend knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Axis-aligned box with full extents.
    Box { size: Vec3 },
    /// Cylinder along its local Y axis.
    Cylinder { radius: f32, height: f32 },
    /// Flat rectangle in the XZ plane facing +Y.
    Plane { width: f32, depth: f32 },
}

impl Primitive {
    /// Scale that maps the backend's unit mesh onto this shape.
    pub fn unit_scale(&self) -> Vec3 {
        match *self {
            Self::Box { size } => size,
            Self::Cylinder { radius, height } => Vec3::new(radius, height, radius),
            Self::Plane { width, depth } => Vec3::new(width, 1.0, depth),
        }
    }
}

/// One primitive placed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub primitive: Primitive,
    /// World matrix, unit-mesh scale included.
    pub model: Mat4,
    pub color: Color,
}

impl DrawItem {
    fn new(primitive: Primitive, placement: Mat4, color: Color) -> Self {
        Self {
            primitive,
            model: placement * Mat4::from_scale(primitive.unit_scale()),
            color,
        }
    }

    /// World-space centre of the primitive.
    pub fn center(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }
}

/// A light source. Directional lights shine from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub position: Option<[f32; 3]>,
}

impl Light {
    /// Unit vector pointing from the scene toward the light, if directional.
    pub fn direction(&self) -> Option<Vec3> {
        self.position
            .map(Vec3::from)
            .and_then(|p| p.try_normalize())
    }
}

/// Scene tunables read from config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub background: Color,
    pub ground_color: Color,
    pub ground_size: f32,
    pub ambient_intensity: f32,
    pub sun_intensity: f32,
    pub sun_position: [f32; 3],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: Color(0x202020),
            ground_color: Color(0x444444),
            ground_size: 200.0,
            ambient_intensity: 0.6,
            sun_intensity: 0.6,
            sun_position: [10.0, 20.0, 10.0],
        }
    }
}

/// The static part of the scene plus the vehicle model recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: Color,
    pub ambient: Light,
    pub sun: Light,
    pub ground: DrawItem,
}

impl Scene {
    /// One-time construction of lights and ground.
    pub fn bootstrap(config: &SceneConfig) -> Self {
        let ground = DrawItem::new(
            Primitive::Plane {
                width: config.ground_size,
                depth: config.ground_size,
            },
            Mat4::IDENTITY,
            config.ground_color,
        );
        tracing::debug!(ground_size = config.ground_size, "scene bootstrapped");
        Self {
            background: config.background,
            ambient: Light {
                color: Color::WHITE,
                intensity: config.ambient_intensity,
                position: None,
            },
            sun: Light {
                color: Color::WHITE,
                intensity: config.sun_intensity,
                position: Some(config.sun_position),
            },
            ground,
        }
    }

    /// Ground first, then each vehicle's body, wheels and markers.
    pub fn draw_list(&self, world: &DriveWorld) -> Vec<DrawItem> {
        let mut items = Vec::with_capacity(1 + world.vehicle_count() * 9);
        items.push(self.ground);
        for vehicle in world.vehicles().values() {
            push_vehicle(&mut items, vehicle);
        }
        items
    }
}

/// Wheel placement in the vehicle frame: hub offset, roll about the axle, then
/// the quarter turn that lays the cylinder's axis along X.
fn wheel_local(wheel: &Wheel) -> Mat4 {
    Mat4::from_translation(wheel.mount.offset())
        * Mat4::from_quat(Quat::from_rotation_x(wheel.spin))
        * Mat4::from_quat(Quat::from_rotation_z(FRAC_PI_2))
}

fn push_vehicle(items: &mut Vec<DrawItem>, vehicle: &Vehicle) {
    let root = vehicle.transform().matrix();

    items.push(DrawItem::new(
        Primitive::Box { size: BODY_SIZE },
        root * Mat4::from_translation(Vec3::new(0.0, BODY_LIFT, 0.0)),
        vehicle.color,
    ));

    for wheel in &vehicle.wheels {
        let hub = root * wheel_local(wheel);
        items.push(DrawItem::new(
            Primitive::Cylinder {
                radius: WHEEL_RADIUS,
                height: WHEEL_WIDTH,
            },
            hub,
            WHEEL_COLOR,
        ));

        // Marker sits on the outward cap; the cylinder's +Y points to -X here.
        let inset = if wheel.mount.is_left() {
            MARKER_INSET
        } else {
            -MARKER_INSET
        };
        items.push(DrawItem::new(
            Primitive::Box { size: MARKER_SIZE },
            hub * Mat4::from_translation(Vec3::new(0.0, inset, 0.0)),
            Color::WHITE,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toydrive_input::{InputState, KeyBindings};
    use toydrive_kernel::{DriveControls, VehicleSpec};

    fn accelerate() -> DriveControls {
        let mut input = InputState::new();
        input.key_down("w");
        input.drive_controls(&KeyBindings::default())
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn one_car() -> DriveWorld {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec::default());
        world
    }

    #[test]
    fn bootstrap_uses_config() {
        let scene = Scene::bootstrap(&SceneConfig::default());
        assert_eq!(scene.background, Color(0x202020));
        assert_eq!(scene.ambient.intensity, 0.6);
        assert!(scene.ambient.direction().is_none());
        assert!(close(
            scene.sun.direction().unwrap(),
            Vec3::new(10.0, 20.0, 10.0).normalize()
        ));
        assert_eq!(
            scene.ground.primitive,
            Primitive::Plane {
                width: 200.0,
                depth: 200.0
            }
        );
    }

    #[test]
    fn vehicle_is_body_four_wheels_four_markers() {
        let world = one_car();
        let items = Scene::bootstrap(&SceneConfig::default()).draw_list(&world);
        assert_eq!(items.len(), 10);
        let cylinders = items
            .iter()
            .filter(|i| matches!(i.primitive, Primitive::Cylinder { .. }))
            .count();
        assert_eq!(cylinders, 4);
        assert_eq!(items[1].color, Color(0x00ff00));
        assert!(close(items[1].center(), Vec3::new(0.0, 1.4, 0.0)));
    }

    #[test]
    fn wheels_touch_the_ground() {
        let world = one_car();
        let items = Scene::bootstrap(&SceneConfig::default()).draw_list(&world);
        for item in items
            .iter()
            .filter(|i| matches!(i.primitive, Primitive::Cylinder { .. }))
        {
            assert!((item.center().y - WHEEL_RADIUS).abs() < 1e-5);
        }
    }

    #[test]
    fn markers_sit_on_outer_faces() {
        let world = one_car();
        let items = Scene::bootstrap(&SceneConfig::default()).draw_list(&world);
        // Front-left wheel at index 2, its marker at 3; front-right at 4/5.
        assert!(close(items[3].center(), Vec3::new(-1.06, 0.4, 1.5)));
        assert!(close(items[5].center(), Vec3::new(1.06, 0.4, 1.5)));
    }

    #[test]
    fn wheel_spin_turns_markers_about_the_axle() {
        let mut world = one_car();
        let scene = Scene::bootstrap(&SceneConfig::default());
        let before = scene.draw_list(&world);
        for _ in 0..20 {
            world.step(accelerate());
        }
        let after = scene.draw_list(&world);
        let shift = world.player().unwrap().position - Vec3::new(0.0, 0.9, 0.0);

        // Hubs only translate with the car.
        assert!(close(after[2].center(), before[2].center() + shift));
        // The marker box's long axis is no longer where it started.
        let axis_before = before[3].model.x_axis.truncate().normalize();
        let axis_after = after[3].model.x_axis.truncate().normalize();
        assert!(axis_before.dot(axis_after) < 0.999);
    }

    #[test]
    fn vehicle_heading_rotates_the_model() {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec {
            heading: FRAC_PI_2,
            ..VehicleSpec::default()
        });
        let items = Scene::bootstrap(&SceneConfig::default()).draw_list(&world);
        // Front-left hub (-0.9, _, 1.5) rotated a quarter turn about +Y.
        assert!(close(items[2].center(), Vec3::new(1.5, 0.4, 0.9)));
    }
}
