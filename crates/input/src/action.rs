use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A high-level action a key can be bound to.
///
/// Held actions feed the per-frame controls; the toggles fire on key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Throttle forward while held.
    Accelerate,
    /// Throttle backward while held.
    Reverse,
    SteerLeft,
    SteerRight,
    /// Less grip, sharper turns, half throttle.
    Handbrake,
    /// Switch between chase and orbit camera.
    CycleCamera,
    /// Show or hide the HUD panel.
    ToggleHud,
}

impl Action {
    pub const ALL: [Self; 7] = [
        Self::Accelerate,
        Self::Reverse,
        Self::SteerLeft,
        Self::SteerRight,
        Self::Handbrake,
        Self::CycleCamera,
        Self::ToggleHud,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Accelerate => "accelerate",
            Self::Reverse => "reverse",
            Self::SteerLeft => "steer_left",
            Self::SteerRight => "steer_right",
            Self::Handbrake => "handbrake",
            Self::CycleCamera => "cycle_camera",
            Self::ToggleHud => "toggle_hud",
        }
    }
}

/// Errors from binding configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("empty key identifier bound to {0}")]
    EmptyKey(&'static str),
    #[error("key identifier {0:?} must be lowercase")]
    NotLowercase(String),
}

impl FromStr for Action {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| BindingError::UnknownAction(s.to_string()))
    }
}

/// Map from lowercase key identifier (`"w"`, `"space"`, `"arrowup"`) to action.
///
/// Several keys may share an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    keys: BTreeMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (key, action) in [
            ("w", Action::Accelerate),
            ("s", Action::Reverse),
            ("a", Action::SteerLeft),
            ("d", Action::SteerRight),
            ("space", Action::Handbrake),
            ("c", Action::CycleCamera),
            ("f1", Action::ToggleHud),
        ] {
            bindings.bind(key, action);
        }
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Bind `key` (case-insensitive) to `action`, replacing any earlier binding.
    pub fn bind(&mut self, key: &str, action: Action) {
        self.keys.insert(key.to_ascii_lowercase(), action);
    }

    pub fn unbind(&mut self, key: &str) -> Option<Action> {
        self.keys.remove(&key.to_ascii_lowercase())
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.keys.get(key).copied()
    }

    /// Every key bound to `action`, in key order.
    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Action)> {
        self.keys.iter().map(|(k, a)| (k.as_str(), *a))
    }

    /// Reject empty identifiers and keys that differ from their lowercase form.
    pub fn validate(&self) -> Result<(), BindingError> {
        for (key, action) in &self.keys {
            if key.trim().is_empty() {
                return Err(BindingError::EmptyKey(action.name()));
            }
            if *key != key.to_ascii_lowercase() {
                return Err(BindingError::NotLowercase(key.clone()));
            }
        }
        Ok(())
    }

    /// Apply `key=action` pairs separated by commas, e.g.
    /// `arrowup=accelerate,w=`. An empty action unbinds the key.
    pub fn parse_overrides(&mut self, overrides: &str) -> Result<(), BindingError> {
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, action) = pair
                .split_once('=')
                .ok_or_else(|| BindingError::UnknownAction(pair.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(BindingError::EmptyKey("override"));
            }
            match action.trim() {
                "" => {
                    self.unbind(key);
                }
                action => self.bind(key, action.parse()?),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_wasd_space() {
        let b = KeyBindings::default();
        assert_eq!(b.action_for("w"), Some(Action::Accelerate));
        assert_eq!(b.action_for("s"), Some(Action::Reverse));
        assert_eq!(b.action_for("a"), Some(Action::SteerLeft));
        assert_eq!(b.action_for("d"), Some(Action::SteerRight));
        assert_eq!(b.action_for("space"), Some(Action::Handbrake));
        assert_eq!(b.action_for("q"), None);
    }

    #[test]
    fn bind_is_case_insensitive() {
        let mut b = KeyBindings::empty();
        b.bind("ArrowUp", Action::Accelerate);
        assert_eq!(b.action_for("arrowup"), Some(Action::Accelerate));
        assert_eq!(b.unbind("ARROWUP"), Some(Action::Accelerate));
        assert_eq!(b.action_for("arrowup"), None);
    }

    #[test]
    fn keys_for_lists_all_aliases() {
        let mut b = KeyBindings::default();
        b.bind("arrowup", Action::Accelerate);
        let keys: Vec<&str> = b.keys_for(Action::Accelerate).collect();
        assert_eq!(keys, vec!["arrowup", "w"]);
    }

    #[test]
    fn action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>(), Ok(action));
        }
        assert_eq!(
            "boost".parse::<Action>(),
            Err(BindingError::UnknownAction("boost".into()))
        );
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut b = KeyBindings::default();
        b.parse_overrides("arrowleft=steer_left, w=handbrake").unwrap();
        assert_eq!(b.action_for("arrowleft"), Some(Action::SteerLeft));
        assert_eq!(b.action_for("w"), Some(Action::Handbrake));
        assert!(b.parse_overrides("x=fly").is_err());
        assert!(b.parse_overrides("=reverse").is_err());
    }

    #[test]
    fn empty_override_unbinds() {
        let mut b = KeyBindings::default();
        b.parse_overrides("W=, arrowup=accelerate").unwrap();
        assert_eq!(b.action_for("w"), None);
        let keys: Vec<&str> = b.keys_for(Action::Accelerate).collect();
        assert_eq!(keys, vec!["arrowup"]);
    }

    #[test]
    fn empty_key_fails_validation() {
        let mut b = KeyBindings::empty();
        b.bind(" ", Action::Reverse);
        assert_eq!(b.validate(), Err(BindingError::EmptyKey("reverse")));
        assert_eq!(KeyBindings::default().validate(), Ok(()));
    }

    #[test]
    fn deserialized_uppercase_key_fails_validation() {
        let mut keys = BTreeMap::new();
        keys.insert("W".to_string(), Action::Accelerate);
        let b = KeyBindings { keys };
        assert_eq!(b.validate(), Err(BindingError::NotLowercase("W".into())));
    }
}
