//! Shared test utilities and arbitrary generators for property-based testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use crate::classify::{CheckConclusion, CheckResult, CheckStatus};
use crate::github::{ChecksProvider, GitHubApiError, GitHubErrorKind};
use crate::persistence::{SnapshotStore, StoreError};
use crate::types::{CompositeStatus, RepoId, Sha};
use crate::window::DayWindow;

pub const HEAD_SHA: &str = "abc1234def5678abc1234def5678abc1234def56";

/// A check run on [`HEAD_SHA`] with no start time.
pub fn check(status: CheckStatus, conclusion: Option<CheckConclusion>) -> CheckResult {
    CheckResult {
        status,
        conclusion,
        started_at: None,
        head_sha: Sha::new(HEAD_SHA),
        html_url: Some("https://github.com/o/r/runs/1".to_string()),
    }
}

pub fn arb_check_status() -> impl Strategy<Value = CheckStatus> {
    prop_oneof![
        Just(CheckStatus::Queued),
        Just(CheckStatus::InProgress),
        Just(CheckStatus::Completed),
        Just(CheckStatus::Other),
    ]
}

pub fn arb_check_conclusion() -> impl Strategy<Value = Option<CheckConclusion>> {
    prop::option::of(prop_oneof![
        Just(CheckConclusion::Success),
        Just(CheckConclusion::Failure),
        Just(CheckConclusion::Neutral),
        Just(CheckConclusion::Cancelled),
        Just(CheckConclusion::Skipped),
        Just(CheckConclusion::TimedOut),
    ])
}

pub fn arb_check_result() -> impl Strategy<Value = CheckResult> {
    (arb_check_status(), arb_check_conclusion(), "[0-9a-f]{40}").prop_map(
        |(status, conclusion, sha)| CheckResult {
            status,
            conclusion,
            started_at: None,
            head_sha: Sha::new(sha),
            html_url: None,
        },
    )
}

pub fn arb_bucket_status() -> impl Strategy<Value = CompositeStatus> {
    prop_oneof![
        Just(CompositeStatus::Success),
        Just(CompositeStatus::Failure),
        Just(CompositeStatus::Pending),
        Just(CompositeStatus::Unknown),
    ]
}

/// Any day between 2000 and roughly 2100.
pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..36_500).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// A window ending at `today` with one directly observed bucket per status.
pub fn window_with(today: NaiveDate, statuses: &[CompositeStatus]) -> DayWindow {
    let mut window = DayWindow::new(statuses.len(), today);
    let dates: Vec<_> = window.dates().collect();
    for (i, (date, status)) in dates.into_iter().zip(statuses).enumerate() {
        window.upsert(date, *status, format!("r{i}"), format!("https://ci/{i}"));
    }
    window
}

// ─── Fakes ───

/// One scripted response from [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub enum Scripted {
    Checks(Vec<CheckResult>),
    Fail(GitHubErrorKind),
    /// Never completes; exercises the caller's timeout.
    Hang,
}

/// A checks provider that replays queued responses per repository.
///
/// A repository with nothing queued reports no check runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<HashMap<RepoId, VecDeque<Scripted>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, repo: &RepoId, response: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(repo.clone())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self, repo: &RepoId) -> Option<Scripted> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scripts
            .lock()
            .unwrap()
            .get_mut(repo)
            .and_then(VecDeque::pop_front)
    }
}

impl ChecksProvider for ScriptedProvider {
    async fn fetch_checks(
        &self,
        repo: &RepoId,
        _branch: &str,
    ) -> Result<Vec<CheckResult>, GitHubApiError> {
        match self.next(repo) {
            None => Ok(vec![]),
            Some(Scripted::Checks(checks)) => Ok(checks),
            Some(Scripted::Fail(GitHubErrorKind::Transient)) => {
                Err(GitHubApiError::transient("scripted transient failure"))
            }
            Some(Scripted::Fail(GitHubErrorKind::Permanent)) => {
                Err(GitHubApiError::permanent("scripted permanent failure"))
            }
            Some(Scripted::Hang) => std::future::pending().await,
        }
    }
}

/// A completed run with `conclusion` that started at noon UTC on `day`.
pub fn check_on(day: NaiveDate, conclusion: CheckConclusion, sha: &str) -> CheckResult {
    CheckResult {
        status: CheckStatus::Completed,
        conclusion: Some(conclusion),
        started_at: day
            .and_hms_opt(12, 0, 0)
            .map(|at| at.and_utc()),
        head_sha: Sha::new(sha),
        html_url: Some(format!("https://github.com/o/r/runs/{sha}")),
    }
}

/// A snapshot store whose operations never complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct HangingStore;

impl SnapshotStore for HangingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        std::future::pending().await
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
        std::future::pending().await
    }
}
