//! Scripted input for headless drives.
//!
//! A script is a comma-separated list of `keys:frames` segments. Keys are
//! joined with `+` and name keys the way bindings do (`w+a`, `space`); an
//! empty key list coasts. `w:60,w+a:30,:90` accelerates for 60 frames, turns
//! for 30, then coasts for 90.

use toydrive_input::{InputState, KeyBindings};
use toydrive_kernel::{DriveControls, DriveWorld};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScriptError {
    #[error("segment {0:?} is missing `:frames`")]
    MissingFrames(String),
    #[error("segment {segment:?} has an invalid frame count")]
    BadFrames {
        segment: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("script has no segments")]
    Empty,
}

/// One run of identical input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub keys: Vec<String>,
    pub frames: u32,
}

impl Segment {
    /// Press this segment's keys and read back the controls `bindings` yield.
    pub fn controls(&self, bindings: &KeyBindings) -> DriveControls {
        let mut input = InputState::new();
        for key in &self.keys {
            input.key_down(key);
        }
        input.drive_controls(bindings)
    }
}

pub fn parse(script: &str) -> Result<Vec<Segment>, ScriptError> {
    let mut segments = Vec::new();
    for raw in script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (keys, frames) = raw
            .rsplit_once(':')
            .ok_or_else(|| ScriptError::MissingFrames(raw.to_string()))?;
        let frames = frames
            .trim()
            .parse()
            .map_err(|source| ScriptError::BadFrames {
                segment: raw.to_string(),
                source,
            })?;
        let keys = keys
            .split('+')
            .map(|k| k.trim().to_ascii_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        segments.push(Segment { keys, frames });
    }
    if segments.is_empty() {
        return Err(ScriptError::Empty);
    }
    Ok(segments)
}

/// Step `world` through every segment. Returns the number of frames run.
pub fn run(world: &mut DriveWorld, segments: &[Segment], bindings: &KeyBindings) -> u64 {
    let mut frames = 0u64;
    for segment in segments {
        let controls = segment.controls(bindings);
        tracing::debug!(keys = ?segment.keys, frames = segment.frames, "script segment");
        for _ in 0..segment.frames {
            world.step(controls);
        }
        frames += u64::from(segment.frames);
    }
    frames
}
