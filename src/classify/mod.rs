//! Status classification for a commit's check runs.
//!
//! A poll returns every check run attached to the head of a repository's
//! default branch. This module reduces them to one [`CompositeStatus`] and
//! extracts the metadata shown in the grid.
//!
//! # Precedence
//!
//! The reduction is existence-based, so the order of the runs never matters:
//!
//! 1. No runs at all: unknown
//! 2. Any run queued or in progress: pending
//! 3. Any run concluded with failure: failure
//! 4. Otherwise: success
//!
//! A completed run without a conclusion counts as "not a failure" unless
//! [`MissingConclusion::Failure`] is configured.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CompositeStatus, Sha, utc_day};

/// Lifecycle state of a single check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
    /// Any state this crate does not distinguish (e.g. `waiting`, `requested`).
    #[serde(other)]
    Other,
}

impl CheckStatus {
    /// Returns true if the run has not produced its outcome yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, CheckStatus::Queued | CheckStatus::InProgress)
    }
}

/// Final outcome of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    #[serde(other)]
    Other,
}

/// How a completed run with no conclusion is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingConclusion {
    /// Count it as not failing.
    #[default]
    Success,
    /// Count it as a failure.
    Failure,
}

/// One check run as returned by the checks provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub conclusion: Option<CheckConclusion>,
    pub started_at: Option<DateTime<Utc>>,
    pub head_sha: Sha,
    pub html_url: Option<String>,
}

impl CheckResult {
    fn is_failure(&self, missing: MissingConclusion) -> bool {
        match self.conclusion {
            Some(conclusion) => conclusion == CheckConclusion::Failure,
            None => missing == MissingConclusion::Failure,
        }
    }
}

/// Reduces a set of check runs to one composite status.
pub fn classify(checks: &[CheckResult]) -> CompositeStatus {
    classify_with(checks, MissingConclusion::default())
}

/// Like [`classify`], with an explicit policy for runs lacking a conclusion.
pub fn classify_with(checks: &[CheckResult], missing: MissingConclusion) -> CompositeStatus {
    if checks.is_empty() {
        return CompositeStatus::Unknown;
    }
    if checks.iter().any(|c| c.status.is_pending()) {
        return CompositeStatus::Pending;
    }
    if checks.iter().any(|c| c.is_failure(missing)) {
        return CompositeStatus::Failure;
    }
    CompositeStatus::Success
}

/// A classified poll result, ready to be written into a day bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildObservation {
    pub status: CompositeStatus,
    /// Short SHA of the built commit.
    pub reference: String,
    pub detail_url: String,
    /// UTC day the build started, when the provider reported it.
    pub started_on: Option<NaiveDate>,
}

impl BuildObservation {
    /// Classifies `checks` and takes the build metadata from the first run.
    pub fn from_checks(checks: &[CheckResult], missing: MissingConclusion) -> Self {
        let status = classify_with(checks, missing);
        match checks.first() {
            Some(first) => BuildObservation {
                status,
                reference: first.head_sha.short().to_string(),
                detail_url: first.html_url.clone().unwrap_or_default(),
                started_on: first.started_at.map(utc_day),
            },
            None => BuildObservation {
                status,
                reference: String::new(),
                detail_url: String::new(),
                started_on: None,
            },
        }
    }

    /// Returns the day this observation belongs to, falling back to `today`.
    pub fn day(&self, today: NaiveDate) -> NaiveDate {
        self.started_on.unwrap_or(today)
    }
}
