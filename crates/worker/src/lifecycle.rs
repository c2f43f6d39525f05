//! Worker lifecycle states and hook outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the worker is in its lifecycle.
///
/// `Uninstalled -> Installing -> Installed -> Activating -> Active`. A failed
/// install returns to `Uninstalled` so the host can retry; a failed
/// activation returns to `Installed`. An active worker whose stores were
/// deleted by a newer version becomes `Redundant` and stops intercepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Uninstalled,
    Installing,
    /// Installed and waiting to be activated.
    Installed,
    Activating,
    /// Controlling pages and intercepting their requests.
    Active,
    /// Replaced by a newer version.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Uninstalled => "uninstalled",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutcome {
    /// Name of the populated precache store.
    pub precache: String,
    /// Number of skeleton assets stored.
    pub precached: usize,
    /// The host should activate right away rather than wait.
    pub skip_waiting: bool,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivateOutcome {
    /// Stores from other versions that were deleted.
    pub deleted: Vec<String>,
}
