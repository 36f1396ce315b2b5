// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Area (arming partition) state

use std::fmt;

use serde::Serialize;

/// Arming state of the panel's area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AreaState {
    #[default]
    Disarmed,
    ArmedHome,
    ArmedAway,
    Triggered,
}

impl AreaState {
    pub fn is_armed(&self) -> bool {
        matches!(self, AreaState::ArmedHome | AreaState::ArmedAway)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AreaState::Disarmed => "Disarmed",
            AreaState::ArmedHome => "Armed Home",
            AreaState::ArmedAway => "Armed Away",
            AreaState::Triggered => "Triggered",
        }
    }
}

impl fmt::Display for AreaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Area {
    pub name: String,
    pub state: AreaState,
}

impl Area {
    pub fn new(name: impl Into<String>, state: AreaState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}
