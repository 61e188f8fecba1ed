//! Composite build status for one repository on one day.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The reduced status of all checks for a single build.
///
/// Serialized in lowercase (`"success"`), which is also the spelling the grid
/// uses as a CSS class. Uppercase spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeStatus {
    /// Every completed check passed (green).
    #[serde(alias = "SUCCESS")]
    Success,

    /// At least one check concluded with a failure (red).
    #[serde(alias = "FAILURE")]
    Failure,

    /// At least one check is queued or still running (yellow).
    #[serde(alias = "PENDING")]
    Pending,

    /// Nothing has been observed for the day (gray).
    #[default]
    #[serde(alias = "UNKNOWN")]
    Unknown,
}

impl CompositeStatus {
    /// Returns the lowercase name used in persisted records and the grid.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeStatus::Success => "success",
            CompositeStatus::Failure => "failure",
            CompositeStatus::Pending => "pending",
            CompositeStatus::Unknown => "unknown",
        }
    }

    /// Returns true for a settled outcome (success or failure).
    ///
    /// Only settled outcomes are carried into later unknown days.
    pub fn is_settled(&self) -> bool {
        matches!(self, CompositeStatus::Success | CompositeStatus::Failure)
    }

    /// Returns true if the status carries build metadata (anything but unknown).
    pub fn is_observed(&self) -> bool {
        !matches!(self, CompositeStatus::Unknown)
    }
}

impl fmt::Display for CompositeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
