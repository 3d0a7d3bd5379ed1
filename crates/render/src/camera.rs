use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use toydrive_kernel::Vehicle;

use crate::renderer::RenderView;

/// Errors from camera settings validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CameraError {
    #[error("orbit height range is empty: min {min} > max {max}")]
    EmptyHeightRange { min: f32, max: f32 },
    #[error("orbit radius must be positive, got {0}")]
    NonPositiveRadius(f32),
    #[error("field of view must be in (0, 180) degrees, got {0}")]
    FieldOfView(f32),
}

/// How the camera follows the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Fixed offset behind and above, turning with the vehicle.
    Chase,
    /// Drag-controlled angle and height, independent of heading.
    #[default]
    Orbit,
}

impl CameraMode {
    pub fn next(self) -> Self {
        match self {
            Self::Chase => Self::Orbit,
            Self::Orbit => Self::Chase,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Chase => "chase",
            Self::Orbit => "orbit",
        }
    }
}

/// Orbit policy tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub radius: f32,
    pub initial_angle: f32,
    pub initial_height: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Radians of orbit per pixel of horizontal drag.
    pub drag_rotate_speed: f32,
    /// Units of height per pixel of vertical drag.
    pub vertical_drag_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            radius: 15.0,
            initial_angle: 0.0,
            initial_height: 12.0,
            min_height: 5.0,
            max_height: 25.0,
            drag_rotate_speed: 0.005,
            vertical_drag_speed: 0.05,
        }
    }
}

impl OrbitSettings {
    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.radius > 0.0) {
            return Err(CameraError::NonPositiveRadius(self.radius));
        }
        if !(self.min_height <= self.max_height) {
            return Err(CameraError::EmptyHeightRange {
                min: self.min_height,
                max: self.max_height,
            });
        }
        Ok(())
    }
}

/// Chase policy tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseSettings {
    /// Eye offset in the vehicle frame; +Z is behind the vehicle.
    pub offset: [f32; 3],
}

impl Default for ChaseSettings {
    fn default() -> Self {
        Self {
            offset: [0.0, 5.0, 10.0],
        }
    }
}

/// Camera rig owned by the app; recomputes the view from the followed vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    mode: CameraMode,
    orbit: OrbitSettings,
    chase: ChaseSettings,
    fov_degrees: f32,
    angle: f32,
    height: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(
            CameraMode::default(),
            OrbitSettings::default(),
            ChaseSettings::default(),
        )
    }
}

impl CameraRig {
    pub fn new(mode: CameraMode, orbit: OrbitSettings, chase: ChaseSettings) -> Self {
        Self {
            mode,
            orbit,
            chase,
            fov_degrees: RenderView::default().fov_degrees,
            angle: orbit.initial_angle,
            height: orbit.initial_height.max(orbit.min_height).min(orbit.max_height),
        }
    }

    /// Override the vertical field of view reported in each [`RenderView`].
    pub fn with_fov(mut self, fov_degrees: f32) -> Result<Self, CameraError> {
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(CameraError::FieldOfView(fov_degrees));
        }
        self.fov_degrees = fov_degrees;
        Ok(self)
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        self.mode = mode;
    }

    /// Switch to the other policy and return it.
    pub fn cycle_mode(&mut self) -> CameraMode {
        self.mode = self.mode.next();
        tracing::info!(mode = self.mode.label(), "camera mode changed");
        self.mode
    }

    /// Orbit angle around the vehicle, radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Orbit height above the vehicle origin.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Apply a pointer drag in pixels. Only the orbit policy responds; returns
    /// whether the rig changed.
    pub fn apply_drag(&mut self, dx: f32, dy: f32) -> bool {
        if self.mode != CameraMode::Orbit {
            return false;
        }
        self.angle -= dx * self.orbit.drag_rotate_speed;
        self.height = (self.height - dy * self.orbit.vertical_drag_speed)
            .max(self.orbit.min_height)
            .min(self.orbit.max_height);
        true
    }

    /// View for this frame, looking at the vehicle origin.
    pub fn follow(&self, vehicle: &Vehicle) -> RenderView {
        self.view_at(vehicle.position, vehicle.heading)
    }

    /// View for a target at `position` facing `heading`.
    pub fn view_at(&self, position: Vec3, heading: f32) -> RenderView {
        let eye = match self.mode {
            CameraMode::Chase => {
                position + Quat::from_rotation_y(heading) * Vec3::from(self.chase.offset)
            }
            CameraMode::Orbit => {
                position
                    + Vec3::new(
                        self.angle.sin() * self.orbit.radius,
                        self.height,
                        self.angle.cos() * self.orbit.radius,
                    )
            }
        };
        RenderView {
            eye,
            target: position,
            fov_degrees: self.fov_degrees,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toydrive_kernel::VehicleSpec;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn orbit_default_pose() {
        let rig = CameraRig::default();
        let v = Vehicle::spawn(&VehicleSpec::default());
        let view = rig.follow(&v);
        assert!(close(view.eye, v.position + Vec3::new(0.0, 12.0, 15.0)));
        assert_eq!(view.target, v.position);
        assert_eq!(view.fov_degrees, 75.0);
    }

    #[test]
    fn orbit_ignores_heading() {
        let rig = CameraRig::default();
        let a = rig.view_at(Vec3::ZERO, 0.0);
        let b = rig.view_at(Vec3::ZERO, 2.0);
        assert_eq!(a.eye, b.eye);
    }

    #[test]
    fn drag_rotates_and_raises() {
        let mut rig = CameraRig::default();
        assert!(rig.apply_drag(100.0, -40.0));
        assert!((rig.angle() + 0.5).abs() < 1e-6);
        assert!((rig.height() - 14.0).abs() < 1e-5);
    }

    #[test]
    fn height_stays_clamped_for_any_drag() {
        let mut rig = CameraRig::default();
        for dy in [1e6, -1e6, 3.0, -250.0, 1e9, -7.5] {
            rig.apply_drag(0.0, dy);
            assert!(rig.height() >= 5.0 && rig.height() <= 25.0);
        }
        rig.apply_drag(0.0, 1e6);
        assert_eq!(rig.height(), 5.0);
        rig.apply_drag(0.0, -1e6);
        assert_eq!(rig.height(), 25.0);
    }

    #[test]
    fn chase_sits_behind_the_heading() {
        let rig = CameraRig::new(
            CameraMode::Chase,
            OrbitSettings::default(),
            ChaseSettings::default(),
        );
        let at_zero = rig.view_at(Vec3::ZERO, 0.0);
        assert!(close(at_zero.eye, Vec3::new(0.0, 5.0, 10.0)));

        // Facing -X after a quarter turn left, so "behind" is +X.
        let turned = rig.view_at(Vec3::ZERO, std::f32::consts::FRAC_PI_2);
        assert!(close(turned.eye, Vec3::new(10.0, 5.0, 0.0)));
    }

    #[test]
    fn chase_ignores_drag() {
        let mut rig = CameraRig::default();
        rig.set_mode(CameraMode::Chase);
        assert!(!rig.apply_drag(50.0, 50.0));
        assert_eq!(rig.angle(), 0.0);
        assert_eq!(rig.height(), 12.0);
    }

    #[test]
    fn cycle_toggles_policy() {
        let mut rig = CameraRig::default();
        assert_eq!(rig.cycle_mode(), CameraMode::Chase);
        assert_eq!(rig.cycle_mode(), CameraMode::Orbit);
    }

    #[test]
    fn settings_validation() {
        assert_eq!(OrbitSettings::default().validate(), Ok(()));
        let inverted = OrbitSettings {
            min_height: 30.0,
            ..OrbitSettings::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(CameraError::EmptyHeightRange { .. })
        ));
        let flat = OrbitSettings {
            radius: 0.0,
            ..OrbitSettings::default()
        };
        assert_eq!(flat.validate(), Err(CameraError::NonPositiveRadius(0.0)));
        assert!(CameraRig::default().with_fov(200.0).is_err());
        assert!(CameraRig::default().with_fov(60.0).is_ok());
    }
}
