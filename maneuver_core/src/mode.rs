//! View modes offered to the display and how they persist.

use crate::view_index::ViewKind;
use maneuver_env::EnvError;
use serde::{Deserialize, Serialize};

/// The active ordering of the vessel list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Sentinel before the first mode is established
    Uninitialized,

    /// Host order (mission elapsed time)
    Default,

    /// Soonest maneuver node first
    ByEventTime,

    /// Alphabetical
    ByName,
}

impl Mode {
    /// Modes a user can pick, in toolbar order.
    pub const SELECTABLE: [Mode; 3] = [Mode::Default, Mode::ByEventTime, Mode::ByName];

    /// Stable name used for persistence.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Uninitialized => "uninitialized",
            Mode::Default => "default",
            Mode::ByEventTime => "by_event_time",
            Mode::ByName => "by_name",
        }
    }

    /// Short toolbar label.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Mode::Uninitialized => None,
            Mode::Default => Some("MET"),
            Mode::ByEventTime => Some("MNV"),
            Mode::ByName => Some("A-Z"),
        }
    }

    /// Which cached view this mode displays.
    pub fn view(self) -> ViewKind {
        match self {
            Mode::Uninitialized | Mode::Default => ViewKind::Default,
            Mode::ByEventTime => ViewKind::ByEventTime,
            Mode::ByName => ViewKind::ByName,
        }
    }

    pub fn is_selectable(self) -> bool {
        self != Mode::Uninitialized
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Mode {
    type Err = EnvError;

    /// Accepts persisted names and the toolbar labels. The sentinel never parses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "met" => Ok(Mode::Default),
            "by_event_time" | "maneuver" | "mnv" => Ok(Mode::ByEventTime),
            "by_name" | "name" | "a-z" => Ok(Mode::ByName),
            _ => Err(EnvError::invalid_value(crate::settings::MODE_KEY, s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for mode in Mode::SELECTABLE {
            assert_eq!(mode.name().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_labels_parse() {
        assert_eq!("MET".parse::<Mode>().unwrap(), Mode::Default);
        assert_eq!("MNV".parse::<Mode>().unwrap(), Mode::ByEventTime);
        assert_eq!("A-Z".parse::<Mode>().unwrap(), Mode::ByName);
    }

    #[test]
    fn test_sentinel_never_parses() {
        assert!("uninitialized".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
        assert!(Mode::Uninitialized.label().is_none());
    }

    #[test]
    fn test_sentinel_shows_default_view() {
        assert_eq!(Mode::Uninitialized.view(), ViewKind::Default);
        assert!(!Mode::Uninitialized.is_selectable());
    }
}
