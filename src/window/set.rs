//! Per-repository histories and the process-wide set that owns them.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{RepoId, TrackedRepo, date_label};

use super::day_window::DayWindow;

/// Errors constructing a [`WindowSet`].
///
/// These are the only fatal errors of the core: without a window set there is
/// nothing to serve.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowSetError {
    /// No repositories were configured.
    #[error("no repositories configured")]
    NoRepositories,

    /// The requested history length was zero.
    #[error("day history must be at least one day")]
    EmptyHistory,

    /// Two configured repositories share an identity.
    #[error("repository configured twice: {0}")]
    DuplicateRepository(String),
}

/// One tracked repository's build history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHistory {
    pub repo: RepoId,
    pub default_branch: String,
    pub window: DayWindow,
}

impl RepoHistory {
    /// Creates a history of `days` unknown buckets ending at `today`.
    pub fn new(tracked: TrackedRepo, days: usize, today: NaiveDate) -> Self {
        RepoHistory {
            repo: tracked.repo,
            default_branch: tracked.default_branch,
            window: DayWindow::new(days, today),
        }
    }

    /// The persistence and merge key of this repository.
    pub fn identity(&self) -> String {
        self.repo.identity()
    }
}

/// Every tracked repository's history, plus the day they were last rolled to.
///
/// All windows always cover the same days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSet {
    histories: Vec<RepoHistory>,
    latest_known_date: NaiveDate,
}

impl WindowSet {
    /// Creates empty histories for every configured repository.
    pub fn new(
        repos: Vec<TrackedRepo>,
        days: usize,
        today: NaiveDate,
    ) -> Result<Self, WindowSetError> {
        if repos.is_empty() {
            return Err(WindowSetError::NoRepositories);
        }
        if days == 0 {
            return Err(WindowSetError::EmptyHistory);
        }

        let mut histories: Vec<RepoHistory> = Vec::with_capacity(repos.len());
        for tracked in repos {
            let identity = tracked.repo.identity();
            if histories.iter().any(|h| h.identity() == identity) {
                return Err(WindowSetError::DuplicateRepository(identity));
            }
            histories.push(RepoHistory::new(tracked, days, today));
        }

        Ok(WindowSet {
            histories,
            latest_known_date: today,
        })
    }

    /// The day every window was last rolled to.
    pub fn latest_known_date(&self) -> NaiveDate {
        self.latest_known_date
    }

    /// Number of days per window.
    pub fn day_history(&self) -> usize {
        self.histories[0].window.len()
    }

    /// All histories, in configuration order.
    pub fn histories(&self) -> &[RepoHistory] {
        &self.histories
    }

    pub(crate) fn histories_mut(&mut self) -> &mut [RepoHistory] {
        &mut self.histories
    }

    /// Finds the history of `repo`.
    pub fn get(&self, repo: &RepoId) -> Option<&RepoHistory> {
        self.histories.iter().find(|h| &h.repo == repo)
    }

    pub(crate) fn get_mut(&mut self, repo: &RepoId) -> Option<&mut RepoHistory> {
        self.histories.iter_mut().find(|h| &h.repo == repo)
    }

    /// The days the windows cover, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.histories[0].window.dates().collect()
    }

    /// Column labels for the grid, oldest first.
    pub fn date_labels(&self) -> Vec<String> {
        self.histories[0].window.dates().map(date_label).collect()
    }

    /// Returns true if `today` is a later calendar day than the last rollover.
    pub fn rollover_due(&self, today: NaiveDate) -> bool {
        today > self.latest_known_date
    }

    /// Rolls every window forward to `today`.
    ///
    /// Does nothing unless `today` is after [`Self::latest_known_date`].
    /// Returns whether a rollover happened.
    pub fn rollover(&mut self, today: NaiveDate) -> bool {
        if !self.rollover_due(today) {
            return false;
        }
        for history in &mut self.histories {
            history.window.rollover(today);
        }
        self.latest_known_date = today;
        true
    }

    /// Re-applies bleed-forward to every window.
    pub fn bleed_forward(&mut self) {
        for history in &mut self.histories {
            history.window.bleed_forward();
        }
    }
}
