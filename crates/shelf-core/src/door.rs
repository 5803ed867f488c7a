//! Door relay port.
//!
//! Opening and locking share one control flow; `DoorAction` carries the
//! per-action endpoint, identifiers and wording.

use async_trait::async_trait;

use crate::{
    messaging::types::{Button, ButtonStyle},
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoorAction {
    Open,
    Lock,
}

impl DoorAction {
    pub const ALL: [DoorAction; 2] = [DoorAction::Open, DoorAction::Lock];

    /// Path appended to the door service base URL.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            DoorAction::Open => "/door",
            DoorAction::Lock => "/lock",
        }
    }

    pub fn command_name(self) -> &'static str {
        match self {
            DoorAction::Open => "opendoor",
            DoorAction::Lock => "lockdoor",
        }
    }

    pub fn button_id(self) -> &'static str {
        match self {
            DoorAction::Open => "opendoor_button",
            DoorAction::Lock => "lockdoor_button",
        }
    }

    /// "open" / "lock"
    pub fn verb(self) -> &'static str {
        match self {
            DoorAction::Open => "open",
            DoorAction::Lock => "lock",
        }
    }

    /// "opening" / "locking"
    pub fn gerund(self) -> &'static str {
        match self {
            DoorAction::Open => "opening",
            DoorAction::Lock => "locking",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DoorAction::Open => "Opens the door if you have the required role.",
            DoorAction::Lock => "Locks the door if you have the required role.",
        }
    }

    pub fn button(self) -> Button {
        match self {
            DoorAction::Open => Button {
                custom_id: self.button_id().to_string(),
                label: "Open Door".to_string(),
                style: ButtonStyle::Primary,
            },
            DoorAction::Lock => Button {
                custom_id: self.button_id().to_string(),
                label: "Lock Door".to_string(),
                style: ButtonStyle::Secondary,
            },
        }
    }

    pub fn from_command_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.command_name() == name)
    }

    pub fn from_button_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.button_id() == id)
    }
}

/// Both door buttons, in the order they are shown.
pub fn door_buttons() -> Vec<Button> {
    DoorAction::ALL.into_iter().map(DoorAction::button).collect()
}

/// HTTP status returned by the door service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelayOutcome {
    pub status: u16,
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Port for the external door service.
///
/// `Err` means the request never produced a response (connect/timeout);
/// a non-2xx response is an `Ok` outcome.
#[async_trait]
pub trait DoorRelay: Send + Sync {
    async fn trigger(&self, action: DoorAction) -> Result<RelayOutcome>;
}
