use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer to an unsaved-changes prompt raised during a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnsavedDecision {
    /// Persist the edits, then switch if the save succeeds.
    Save,
    /// Drop the edits and switch.
    Discard,
    /// Abort the switch and keep editing.
    Stay,
}

impl fmt::Display for UnsavedDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnsavedDecision::Save => write!(f, "SAVE"),
            UnsavedDecision::Discard => write!(f, "DISCARD"),
            UnsavedDecision::Stay => write!(f, "STAY"),
        }
    }
}
