//! Drive Kernel: vehicle kinematics, wheel spin, and the world that steps them.
//!
//! # Invariants
//! - A step is pure with respect to its controls and tuning; no wall-clock input.
//! - Velocity and angular velocity stay inside their tuned limits after every step.
//! - All state mutations flow through explicit operations and are logged for replay.

pub mod controls;
pub mod tuning;
pub mod vehicle;
pub mod world;

pub use controls::DriveControls;
pub use tuning::{TuningError, VehicleTuning};
pub use vehicle::{Vehicle, VehicleSpec, Wheel, WheelMount};
pub use world::{DriveWorld, WorldEvent};
