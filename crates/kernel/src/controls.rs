use serde::{Deserialize, Serialize};

/// Snapshot of the driving controls for one frame.
///
/// The input layer produces this once per tick; the kernel never reads raw
/// key events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveControls {
    pub forward: bool,
    pub reverse: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub handbrake: bool,
}

impl DriveControls {
    /// No keys held.
    pub const IDLE: Self = Self {
        forward: false,
        reverse: false,
        turn_left: false,
        turn_right: false,
        handbrake: false,
    };

    /// True when either throttle direction is held.
    pub fn throttling(&self) -> bool {
        self.forward || self.reverse
    }

    /// True when either steering direction is held.
    pub fn steering(&self) -> bool {
        self.turn_left || self.turn_right
    }
}
