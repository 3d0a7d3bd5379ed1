use glam::Vec2;
use std::collections::HashMap;
use toydrive_kernel::DriveControls;

use crate::action::{Action, KeyBindings};

/// Pointer buttons the tracker cares about. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// Pointer movement while the primary button is held, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragDelta {
    pub dx: f32,
    pub dy: f32,
}

/// Current key and drag state.
///
/// Host callbacks write into it as events arrive; the frame loop reads it once
/// per tick through [`InputState::drive_controls`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<String, bool>,
    dragging: bool,
    last_pointer: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns true if the key was not already held
    /// (false for OS key repeat).
    pub fn key_down(&mut self, key: &str) -> bool {
        let was_held = self
            .keys
            .insert(key.to_ascii_lowercase(), true)
            .unwrap_or(false);
        !was_held
    }

    pub fn key_up(&mut self, key: &str) {
        self.keys.insert(key.to_ascii_lowercase(), false);
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// True if any key bound to `action` is held.
    pub fn action_held(&self, bindings: &KeyBindings, action: Action) -> bool {
        bindings.keys_for(action).any(|k| self.is_held(k))
    }

    /// Fold the held keys into this frame's driving controls.
    pub fn drive_controls(&self, bindings: &KeyBindings) -> DriveControls {
        DriveControls {
            forward: self.action_held(bindings, Action::Accelerate),
            reverse: self.action_held(bindings, Action::Reverse),
            turn_left: self.action_held(bindings, Action::SteerLeft),
            turn_right: self.action_held(bindings, Action::SteerRight),
            handbrake: self.action_held(bindings, Action::Handbrake),
        }
    }

    /// Forget every held key and end any drag (e.g. on focus loss).
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Start a drag on primary press at `position`.
    pub fn pointer_down(&mut self, button: PointerButton, position: Vec2) {
        if button == PointerButton::Primary {
            self.dragging = true;
            self.last_pointer = Some(position);
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        if button == PointerButton::Primary {
            self.dragging = false;
        }
    }

    /// Track a cursor move. While dragging, returns the movement since the
    /// previous cursor position.
    pub fn pointer_moved(&mut self, position: Vec2) -> Option<DragDelta> {
        let previous = self.last_pointer.replace(position);
        if !self.dragging {
            return None;
        }
        let previous = previous?;
        Some(DragDelta {
            dx: position.x - previous.x,
            dy: position.y - previous.y,
        })
    }
}
