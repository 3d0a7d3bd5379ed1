//! Drive configuration: everything a session can tune without recompiling.
//!
//! A config file is YAML (`.yaml`/`.yml`) or JSON (`.json`). Every field is
//! optional; anything left out keeps its built-in default.
//!
//! # Invariants
//! - A config returned by [`DriveConfig::load`] has passed [`DriveConfig::validate`].
//! - An empty vehicle list means one default vehicle, so a world built from
//!   config always has a player.
//! - A `bindings` table replaces the default bindings wholesale.

use serde::{Deserialize, Serialize};
use std::path::Path;
use toydrive_input::{BindingError, KeyBindings};
use toydrive_kernel::{DriveWorld, TuningError, VehicleSpec, VehicleTuning};
use toydrive_render::{CameraError, CameraMode, CameraRig, ChaseSettings, OrbitSettings, SceneConfig};

/// Errors from loading or validating a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension {0:?} (expected .yaml, .yml or .json)")]
    UnsupportedExtension(String),
    #[error("tuning: {0}")]
    Tuning(#[from] TuningError),
    #[error("camera: {0}")]
    Camera(#[from] CameraError),
    #[error("bindings: {0}")]
    Binding(#[from] BindingError),
}

/// Camera section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mode: CameraMode,
    pub orbit: OrbitSettings,
    pub chase: ChaseSettings,
    /// Vertical field of view in degrees; the renderer default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fov: Option<f32>,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub tuning: VehicleTuning,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub bindings: KeyBindings,
    /// Vehicles to spawn; the first one is the player.
    pub vehicles: Vec<VehicleSpec>,
}

impl DriveConfig {
    /// Read and validate a config file, choosing the parser by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let parse: fn(&str) -> Result<Self, ConfigError> = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str,
            "json" => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedExtension(ext)),
        };
        let config = parse(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            vehicles = config.vehicle_specs().len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tuning.validate()?;
        self.camera.orbit.validate()?;
        if let Some(fov) = self.camera.fov {
            // Reuse the rig's range check.
            CameraRig::default().with_fov(fov)?;
        }
        self.bindings.validate()?;
        Ok(())
    }

    /// Layer `key=action` overrides (e.g. from a `--bind` flag) on top of
    /// the loaded bindings.
    pub fn apply_binding_overrides(&mut self, overrides: &str) -> Result<(), ConfigError> {
        self.bindings.parse_overrides(overrides)?;
        self.bindings.validate()?;
        Ok(())
    }

    /// Vehicles to spawn, falling back to a single default vehicle.
    pub fn vehicle_specs(&self) -> Vec<VehicleSpec> {
        if self.vehicles.is_empty() {
            vec![VehicleSpec::default()]
        } else {
            self.vehicles.clone()
        }
    }

    /// A fresh world with every configured vehicle spawned.
    pub fn build_world(&self) -> DriveWorld {
        let mut world = DriveWorld::with_tuning(self.tuning);
        for spec in self.vehicle_specs() {
            world.spawn(spec);
        }
        world
    }

    pub fn camera_rig(&self) -> Result<CameraRig, ConfigError> {
        let rig = CameraRig::new(self.camera.mode, self.camera.orbit, self.camera.chase);
        Ok(match self.camera.fov {
            Some(fov) => rig.with_fov(fov)?,
            None => rig,
        })
    }
}

pub fn crate_info() -> &'static str {
    "toydrive-config v0.1.0"
}
