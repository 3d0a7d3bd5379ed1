//! Input: host key and pointer events folded into per-frame driving controls.
//!
//! # Invariants
//! - The kernel consumes `DriveControls`, never raw key events.
//! - Unrecognised keys are tracked but never bound, so they have no effect.
//! - Input state is an explicit value owned by the app, read once per frame.

pub mod action;
pub mod state;

pub use action::{Action, BindingError, KeyBindings};
pub use state::{DragDelta, InputState, PointerButton};

pub fn crate_info() -> &'static str {
    "toydrive-input v0.1.0"
}
