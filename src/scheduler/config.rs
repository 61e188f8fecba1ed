//! Timing configuration for the poll and persist activities.
//!
//! # Defaults
//!
//! - **Poll interval**: 20 seconds (`BUILD_GRID_POLL_INTERVAL_SECS`)
//! - **Persist interval**: 60 seconds (`BUILD_GRID_PERSIST_INTERVAL_SECS`)
//! - **Fetch timeout**: 10 seconds per repository, retries included
//! - **Store timeout**: 10 seconds per snapshot read or write

use std::time::Duration;

use crate::classify::MissingConclusion;

/// Default interval between poll cycles (20 seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;

/// Default interval between persist cycles (60 seconds).
pub const DEFAULT_PERSIST_INTERVAL_SECS: u64 = 60;

/// Default bound on one repository's checks fetch (10 seconds).
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Default bound on one snapshot store operation (10 seconds).
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll_interval: Duration,

    pub persist_interval: Duration,

    /// After this long a fetch is abandoned and counted as a failure.
    pub fetch_timeout: Duration,

    /// After this long a store read or write is abandoned.
    pub store_timeout: Duration,

    /// How completed runs without a conclusion are classified.
    pub missing_conclusion: MissingConclusion,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        SchedulerConfig {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            persist_interval: Duration::from_secs(DEFAULT_PERSIST_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            missing_conclusion: MissingConclusion::default(),
        }
    }

    /// Applies interval overrides looked up through `lookup`.
    ///
    /// Reads `BUILD_GRID_POLL_INTERVAL_SECS` and
    /// `BUILD_GRID_PERSIST_INTERVAL_SECS`. Unparseable or zero values are
    /// ignored. Configuration loading passes the process environment here.
    pub(crate) fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |name: &str| {
            lookup(name)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        };

        SchedulerConfig {
            poll_interval: secs("BUILD_GRID_POLL_INTERVAL_SECS").unwrap_or(self.poll_interval),
            persist_interval: secs("BUILD_GRID_PERSIST_INTERVAL_SECS")
                .unwrap_or(self.persist_interval),
            ..self
        }
    }
}
