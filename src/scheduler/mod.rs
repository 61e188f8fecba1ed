//! Background poll and persist activities.
//!
//! The scheduler owns no state of its own: it shares one [`WindowSet`] behind
//! a single reader/writer lock with the HTTP handlers.
//!
//! # Lock Discipline
//!
//! - Network and store I/O never happens while the lock is held
//! - A poll cycle takes the write lock once, for rollover plus every
//!   repository's upsert and bleed, so readers never see a half-rolled set
//! - A persist cycle copies every record under the read lock, then writes
//!   them after releasing it
//!
//! # Activities
//!
//! - **Poll** (every `poll_interval`): fetch each repository's checks with a
//!   timeout, classify, and apply. A failed or timed-out fetch skips that
//!   repository for the cycle.
//! - **Persist** (every `persist_interval`): write every repository's whole
//!   record to the store. Failures are logged and retried on the next cycle.
//!
//! Both stop when the shutdown token is cancelled; the persist activity then
//! writes one final time.
//!
//! # Module Structure
//!
//! - [`config`]: intervals and timeouts
//! - [`clock`]: the source of "today"

pub mod clock;
pub mod config;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::classify::{BuildObservation, CheckResult};
use crate::github::{ChecksProvider, GitHubApiError};
use crate::persistence::{PersistedHistory, SnapshotStore, StoreError, decode_history};
use crate::reconcile::{self, ApplyOutcome};
use crate::render::{GridView, render_text};
use crate::types::RepoId;
use crate::window::WindowSet;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SchedulerConfig;

/// The window set shared between the scheduler and the HTTP handlers.
pub type SharedWindows = Arc<RwLock<WindowSet>>;

/// Why one repository's fetch produced nothing this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] GitHubApiError),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Counts from one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    pub rolled_over: bool,
    /// Observations written into a bucket.
    pub written: usize,
    /// Fetches that succeeded but changed nothing (no checks, or a build day
    /// outside the window).
    pub unchanged: usize,
    pub failed: usize,
}

/// Counts from one persist cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub written: usize,
    pub failed: usize,
}

/// Counts from startup restoration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Repositories with a usable persisted record.
    pub restored: usize,
    /// Repositories with no record yet.
    pub missing: usize,
    /// Repositories whose record could not be read or decoded.
    pub failed: usize,
}

pub struct Scheduler<P, S, C = SystemClock> {
    windows: SharedWindows,
    provider: P,
    store: S,
    clock: C,
    config: SchedulerConfig,
}

impl<P, S, C> Scheduler<P, S, C>
where
    P: ChecksProvider,
    S: SnapshotStore,
    C: Clock,
{
    pub fn new(
        windows: SharedWindows,
        provider: P,
        store: S,
        clock: C,
        config: SchedulerConfig,
    ) -> Self {
        Scheduler {
            windows,
            provider,
            store,
            clock,
            config,
        }
    }

    pub fn windows(&self) -> &SharedWindows {
        &self.windows
    }

    // ─── Startup ──────────────────────────────────────────────────────────────

    /// Loads every repository's persisted record and merges it in.
    ///
    /// A missing record means "no prior data". An unreadable record is
    /// logged and treated the same way; it never prevents startup.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> RestoreReport {
        let mut report = RestoreReport::default();

        for repo in self.tracked_repos().await.into_iter().map(|(repo, _)| repo) {
            let key = repo.identity();
            let raw = match self.store_get(&key).await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    info!(repo = %repo, "No persisted history, starting empty");
                    report.missing += 1;
                    continue;
                }
                Err(e) => {
                    warn!(repo = %repo, error = %e, "Failed to read persisted history, starting empty");
                    report.failed += 1;
                    continue;
                }
            };

            let decoded = match decode_history(&raw) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(repo = %repo, error = %e, "Persisted history is unreadable, discarding");
                    report.failed += 1;
                    continue;
                }
            };
            if !decoded.discarded.is_empty() {
                warn!(
                    repo = %repo,
                    discarded = ?decoded.discarded,
                    "Dropped unreadable days from persisted history"
                );
            }

            let mut windows = self.windows.write().await;
            if let Some(merged) = reconcile::merge_into(&mut windows, &repo, decoded) {
                info!(repo = %repo, merged, "Restored persisted history");
                report.restored += 1;
            }
        }

        report
    }

    // ─── Poll ─────────────────────────────────────────────────────────────────

    /// Runs one poll cycle over every tracked repository.
    #[instrument(skip(self))]
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();
        let mut observations = Vec::new();

        for (repo, branch) in self.tracked_repos().await {
            match self.fetch(&repo, &branch).await {
                Ok(checks) => {
                    let observation =
                        BuildObservation::from_checks(&checks, self.config.missing_conclusion);
                    observations.push((repo, observation));
                }
                Err(e) => {
                    warn!(repo = %repo, branch = %branch, error = %e, "Failed to fetch checks, skipping");
                    report.failed += 1;
                }
            }
        }

        let today = self.clock.today();
        let view = {
            let mut windows = self.windows.write().await;
            report.rolled_over = reconcile::rollover_all(&mut windows, today);
            for (repo, observation) in &observations {
                match reconcile::apply(&mut windows, repo, today, observation) {
                    ApplyOutcome::Written { .. } => report.written += 1,
                    ApplyOutcome::NoChecks { .. } | ApplyOutcome::OutsideWindow { .. } => {
                        report.unchanged += 1
                    }
                    // Repositories come from the set itself, so this only
                    // happens if the set were rebuilt mid-cycle.
                    ApplyOutcome::UnknownRepository => report.unchanged += 1,
                }
            }
            GridView::capture(&windows)
        };

        debug!(
            written = report.written,
            unchanged = report.unchanged,
            failed = report.failed,
            "Poll cycle complete\n{}",
            render_text(&view)
        );
        report
    }

    async fn fetch(&self, repo: &RepoId, branch: &str) -> Result<Vec<CheckResult>, FetchError> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.provider.fetch_checks(repo, branch)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(FetchError::Timeout(timeout)),
        }
    }

    // ─── Persist ──────────────────────────────────────────────────────────────

    /// Writes every repository's record to the store.
    #[instrument(skip(self))]
    pub async fn persist_once(&self) -> PersistReport {
        let records: Vec<(String, PersistedHistory)> = {
            let windows = self.windows.read().await;
            windows
                .histories()
                .iter()
                .map(|h| (h.identity(), PersistedHistory::from_window(&h.window)))
                .collect()
        };

        let mut report = PersistReport::default();
        for (key, record) in records {
            let encoded = match record.encode() {
                Ok(encoded) => encoded,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to encode history");
                    report.failed += 1;
                    continue;
                }
            };
            match self.store_set(&key, encoded).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    error!(key = %key, error = %e, "Failed to persist history");
                    report.failed += 1;
                }
            }
        }

        debug!(written = report.written, failed = report.failed, "Persist cycle complete");
        report
    }

    async fn store_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tokio::time::timeout(self.config.store_timeout, self.store.get(key))
            .await
            .map_err(|_| StoreError::Unavailable("read timed out".to_string()))?
    }

    async fn store_set(&self, key: &str, value: String) -> Result<(), StoreError> {
        tokio::time::timeout(self.config.store_timeout, self.store.set(key, value))
            .await
            .map_err(|_| StoreError::Unavailable("write timed out".to_string()))?
    }

    // ─── Run loop ─────────────────────────────────────────────────────────────

    /// Runs the poll and persist activities until `shutdown` is cancelled.
    ///
    /// The first poll happens one `poll_interval` after the call; run
    /// [`Self::poll_once`] beforehand for an immediate one.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            poll_interval = ?self.config.poll_interval,
            persist_interval = ?self.config.persist_interval,
            "Scheduler started"
        );

        tokio::join!(self.poll_loop(&shutdown), self.persist_loop(&shutdown));

        info!("Scheduler stopped");
    }

    async fn poll_loop(&self, shutdown: &CancellationToken) {
        let mut ticker = ticker(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    async fn persist_loop(&self, shutdown: &CancellationToken) {
        let mut ticker = ticker(self.config.persist_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.persist_once().await;
                }
            }
        }

        info!("Flushing history before shutdown");
        self.persist_once().await;
    }

    async fn tracked_repos(&self) -> Vec<(RepoId, String)> {
        self.windows
            .read()
            .await
            .histories()
            .iter()
            .map(|h| (h.repo.clone(), h.default_branch.clone()))
            .collect()
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

#[cfg(test)]
mod tests;
