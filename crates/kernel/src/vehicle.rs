use glam::Vec3;
use serde::{Deserialize, Serialize};
use toydrive_common::{Color, EntityId, Transform, approach_zero, sign_or_zero};

use crate::controls::DriveControls;
use crate::tuning::VehicleTuning;

/// Height of the vehicle origin above the ground plane.
pub const RIDE_HEIGHT: f32 = 0.9;

/// Which corner of the chassis a wheel is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelMount {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelMount {
    pub const ALL: [Self; 4] = [
        Self::FrontLeft,
        Self::FrontRight,
        Self::RearLeft,
        Self::RearRight,
    ];

    /// Hub position in the vehicle frame.
    pub fn offset(self) -> Vec3 {
        match self {
            Self::FrontLeft => Vec3::new(-0.9, -0.5, 1.5),
            Self::FrontRight => Vec3::new(0.9, -0.5, 1.5),
            Self::RearLeft => Vec3::new(-0.9, -0.5, -1.5),
            Self::RearRight => Vec3::new(0.9, -0.5, -1.5),
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, Self::FrontLeft | Self::RearLeft)
    }
}

/// A wheel owns only its rolling angle; its mount is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wheel {
    pub mount: WheelMount,
    /// Accumulated roll about the axle, radians.
    pub spin: f32,
}

/// Factory parameters for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSpec {
    pub color: Color,
    /// Ground position as (x, z). The body always rides at [`RIDE_HEIGHT`].
    pub position: [f32; 2],
    /// Initial heading, radians.
    pub heading: f32,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            color: Color(0x00ff00),
            position: [0.0, 0.0],
            heading: 0.0,
        }
    }
}

/// Kinematic vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: EntityId,
    pub color: Color,
    pub position: Vec3,
    /// Yaw, radians; 0 faces -Z.
    pub heading: f32,
    pub velocity: f32,
    pub angular_velocity: f32,
    pub wheels: [Wheel; 4],
    /// Position at the last wheel-spin update.
    pub last_position: Vec3,
}

impl Vehicle {
    /// Build a vehicle at rest from a spec.
    pub fn spawn(spec: &VehicleSpec) -> Self {
        Self::spawn_with_id(EntityId::new(), spec)
    }

    /// Build a vehicle with a known id (used for replay).
    pub fn spawn_with_id(id: EntityId, spec: &VehicleSpec) -> Self {
        let position = Vec3::new(spec.position[0], RIDE_HEIGHT, spec.position[1]);
        Self {
            id,
            color: spec.color,
            position,
            heading: spec.heading,
            velocity: 0.0,
            angular_velocity: 0.0,
            wheels: WheelMount::ALL.map(|mount| Wheel { mount, spin: 0.0 }),
            last_position: position,
        }
    }

    /// Unit vector the vehicle faces.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.heading.sin(), 0.0, -self.heading.cos())
    }

    /// Body transform in world space.
    pub fn transform(&self) -> Transform {
        Transform::from_yaw(self.position, self.heading)
    }

    /// Advance velocity, heading and position by one frame.
    pub fn step(&mut self, controls: &DriveControls, tuning: &VehicleTuning) {
        let throttle = tuning.throttle_step(controls.handbrake);
        if controls.forward {
            self.velocity += throttle;
        }
        if controls.reverse {
            self.velocity -= throttle;
        }
        self.velocity = self.velocity.clamp(-tuning.max_speed, tuning.max_speed);

        if !controls.throttling() {
            self.velocity = approach_zero(self.velocity, tuning.friction_step(controls.handbrake));
        }

        let steer = tuning.steer_step(controls.handbrake);
        if controls.turn_left {
            self.angular_velocity += steer;
        }
        if controls.turn_right {
            self.angular_velocity -= steer;
        }
        if !controls.steering() {
            self.angular_velocity = approach_zero(self.angular_velocity, tuning.angular_friction);
        }
        self.angular_velocity = self
            .angular_velocity
            .clamp(-tuning.max_angular_speed, tuning.max_angular_speed);

        // Steering authority scales with the fraction of top speed.
        if self.velocity.abs() > tuning.turn_speed_threshold {
            self.heading += self.angular_velocity * (self.velocity / tuning.max_speed);
        }

        self.position.x -= self.heading.sin() * self.velocity;
        self.position.z -= self.heading.cos() * self.velocity;
    }

    /// Roll the wheels by the distance travelled since the last call.
    ///
    /// Returns the angle added to every wheel: negative when rolling forward,
    /// positive in reverse, zero when the vehicle has not moved.
    pub fn spin_wheels(&mut self, tuning: &VehicleTuning) -> f32 {
        let movement = self.position - self.last_position;
        self.last_position = self.position;

        let distance = movement.length();
        if distance <= tuning.min_wheel_travel {
            return 0.0;
        }

        let direction = sign_or_zero(self.forward().dot(movement));
        let increment = -direction * (distance / tuning.wheel_radius);
        for wheel in &mut self.wheels {
            wheel.spin += increment;
        }
        increment
    }
}
