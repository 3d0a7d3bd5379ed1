//! Shared types and small numeric helpers used across the toydrive crates.

pub mod math;
pub mod types;

pub use math::{Color, approach_zero, sign_or_zero};
pub use types::{EntityId, Transform};
