//! Merging persisted snapshots and fresh poll results into the live windows.
//!
//! There are exactly two mutation paths into a [`WindowSet`]:
//!
//! - [`merge`] at startup, replacing live buckets with persisted ones for the
//!   days both cover
//! - [`apply`] on every poll, which rolls the windows over when the calendar
//!   day has advanced, writes the observation into its day and re-runs
//!   bleed-forward
//!
//! Both are synchronous and assume the caller holds exclusive access to the
//! set for the whole call.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::classify::BuildObservation;
use crate::persistence::DecodedHistory;
use crate::types::RepoId;
use crate::window::{DayWindow, WindowSet};

/// What [`apply`] did with an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The observation was written into the bucket for its day.
    Written { rolled_over: bool },
    /// The observation had no checks; the window was left as it was.
    NoChecks { rolled_over: bool },
    /// The build started on a day outside the window.
    OutsideWindow { rolled_over: bool },
    /// The repository is not tracked.
    UnknownRepository,
}

impl ApplyOutcome {
    /// Returns true if the observation changed a bucket.
    pub fn is_written(&self) -> bool {
        matches!(self, ApplyOutcome::Written { .. })
    }
}

/// Overwrites live buckets with persisted ones for every day both cover.
///
/// Persisted days outside the window are discarded and live days absent from
/// the snapshot are left alone. Returns the number of buckets replaced.
pub fn merge(window: &mut DayWindow, persisted: DecodedHistory) -> usize {
    persisted
        .buckets
        .into_iter()
        .filter(|bucket| window.replace(bucket.clone()))
        .count()
}

/// Merges a repository's persisted history into the set, then re-runs bleed.
///
/// Returns `None` if `repo` is not tracked.
pub fn merge_into(set: &mut WindowSet, repo: &RepoId, persisted: DecodedHistory) -> Option<usize> {
    let history = set.get_mut(repo)?;
    let merged = merge(&mut history.window, persisted);
    history.window.bleed_forward();
    debug!(repo = %repo, merged, "Merged persisted history");
    Some(merged)
}

/// Rolls every window over to `today` if the calendar day has advanced.
pub fn rollover_all(set: &mut WindowSet, today: NaiveDate) -> bool {
    let previous = set.latest_known_date();
    let rolled = set.rollover(today);
    if rolled {
        info!(from = %previous, to = %today, "Day changed, rolled windows over");
        set.bleed_forward();
    }
    rolled
}

/// Writes one poll result into `repo`'s window.
///
/// Rolls every window over first if `today` is a new calendar day, then
/// writes the observation into the bucket for the day its build started
/// (`today` if unknown), then re-applies bleed-forward.
pub fn apply(
    set: &mut WindowSet,
    repo: &RepoId,
    today: NaiveDate,
    observation: &BuildObservation,
) -> ApplyOutcome {
    if set.get(repo).is_none() {
        return ApplyOutcome::UnknownRepository;
    }

    let rolled_over = rollover_all(set, today);

    let Some(history) = set.get_mut(repo) else {
        return ApplyOutcome::UnknownRepository;
    };

    if !observation.status.is_observed() {
        debug!(repo = %repo, "No check runs reported, window unchanged");
        return ApplyOutcome::NoChecks { rolled_over };
    }

    let day = observation.day(today);
    let written = history.window.upsert(
        day,
        observation.status,
        observation.reference.clone(),
        observation.detail_url.clone(),
    );
    if !written {
        debug!(repo = %repo, %day, "Build day outside the window, ignored");
        return ApplyOutcome::OutsideWindow { rolled_over };
    }

    history.window.bleed_forward();
    ApplyOutcome::Written { rolled_over }
}
