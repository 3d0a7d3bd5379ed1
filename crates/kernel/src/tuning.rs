use serde::{Deserialize, Serialize};

/// Errors from tuning validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TuningError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
}

/// Fixed per-vehicle tunables for the kinematic model.
///
/// All rates are per frame: the update runs once per animation tick with no
/// time scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Velocity limit in both directions.
    pub max_speed: f32,
    /// Velocity added per frame while throttling.
    pub acceleration: f32,
    /// Velocity removed per frame while coasting.
    pub friction: f32,
    pub angular_acceleration: f32,
    pub angular_friction: f32,
    pub max_angular_speed: f32,
    /// Angular acceleration multiplier while the handbrake is held.
    pub handbrake_turn_boost: f32,
    /// Friction multiplier while the handbrake is held.
    pub handbrake_friction_factor: f32,
    /// Throttle multiplier while the handbrake is held.
    pub handbrake_acceleration_factor: f32,
    /// Heading only changes above this absolute velocity.
    pub turn_speed_threshold: f32,
    pub wheel_radius: f32,
    /// Travel at or below this distance does not spin the wheels.
    pub min_wheel_travel: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            max_speed: 0.5,
            acceleration: 0.01,
            friction: 0.01,
            angular_acceleration: 0.002,
            angular_friction: 0.01,
            max_angular_speed: 0.03,
            handbrake_turn_boost: 1.8,
            handbrake_friction_factor: 0.4,
            handbrake_acceleration_factor: 0.5,
            turn_speed_threshold: 0.01,
            wheel_radius: 0.4,
            min_wheel_travel: 1e-6,
        }
    }
}

impl VehicleTuning {
    /// Check that limits are positive and rates are non-negative.
    pub fn validate(&self) -> Result<(), TuningError> {
        for (field, value) in [
            ("max_speed", self.max_speed),
            ("wheel_radius", self.wheel_radius),
        ] {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("acceleration", self.acceleration),
            ("friction", self.friction),
            ("angular_acceleration", self.angular_acceleration),
            ("angular_friction", self.angular_friction),
            ("max_angular_speed", self.max_angular_speed),
            ("handbrake_turn_boost", self.handbrake_turn_boost),
            ("handbrake_friction_factor", self.handbrake_friction_factor),
            ("handbrake_acceleration_factor", self.handbrake_acceleration_factor),
            ("turn_speed_threshold", self.turn_speed_threshold),
            ("min_wheel_travel", self.min_wheel_travel),
        ] {
            if !(value >= 0.0) {
                return Err(TuningError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// Throttle step for this frame.
    pub fn throttle_step(&self, handbrake: bool) -> f32 {
        if handbrake {
            self.acceleration * self.handbrake_acceleration_factor
        } else {
            self.acceleration
        }
    }

    /// Coasting friction for this frame.
    pub fn friction_step(&self, handbrake: bool) -> f32 {
        if handbrake {
            self.friction * self.handbrake_friction_factor
        } else {
            self.friction
        }
    }

    /// Steering step for this frame.
    pub fn steer_step(&self, handbrake: bool) -> f32 {
        if handbrake {
            self.angular_acceleration * self.handbrake_turn_boost
        } else {
            self.angular_acceleration
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(VehicleTuning::default().validate(), Ok(()));
    }

    #[test]
    fn zero_max_speed_rejected() {
        let t = VehicleTuning {
            max_speed: 0.0,
            ..VehicleTuning::default()
        };
        assert!(matches!(
            t.validate(),
            Err(TuningError::NotPositive { field: "max_speed", .. })
        ));
    }

    #[test]
    fn negative_friction_rejected() {
        let t = VehicleTuning {
            friction: -0.1,
            ..VehicleTuning::default()
        };
        assert!(matches!(
            t.validate(),
            Err(TuningError::Negative { field: "friction", .. })
        ));
    }

    #[test]
    fn nan_rejected() {
        let t = VehicleTuning {
            wheel_radius: f32::NAN,
            ..VehicleTuning::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn handbrake_modifiers() {
        let t = VehicleTuning::default();
        assert!((t.throttle_step(true) - 0.005).abs() < 1e-7);
        assert!((t.friction_step(true) - 0.004).abs() < 1e-7);
        assert!((t.steer_step(true) - 0.0036).abs() < 1e-7);
        assert_eq!(t.throttle_step(false), t.acceleration);
        assert_eq!(t.friction_step(false), t.friction);
        assert_eq!(t.steer_step(false), t.angular_acceleration);
    }
}
