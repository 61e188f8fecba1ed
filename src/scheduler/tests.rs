//! Tests for the poll and persist activities against scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::classify::{CheckConclusion, CheckStatus};
use crate::github::GitHubErrorKind;
use crate::persistence::{MemorySnapshotStore, PersistedHistory, SnapshotStore, decode_history};
use crate::test_utils::{HangingStore, Scripted, ScriptedProvider, check, check_on};
use crate::types::{CompositeStatus, RepoId, TrackedRepo};
use crate::window::WindowSet;

use super::*;

// ─── Test Helpers ───

type TestScheduler = Scheduler<ScriptedProvider, MemorySnapshotStore, FixedClock>;

const SHA_A: &str = "aaaaaaa111111111111111111111111111111111";
const SHA_B: &str = "bbbbbbb222222222222222222222222222222222";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn widgets() -> RepoId {
    RepoId::new("octo", "widgets")
}

fn gadgets() -> RepoId {
    RepoId::new("octo", "gadgets")
}

fn test_config() -> SchedulerConfig {
    SchedulerConfig {
        fetch_timeout: Duration::from_millis(50),
        store_timeout: Duration::from_millis(50),
        ..SchedulerConfig::new()
    }
}

fn scheduler_at(
    today: NaiveDate,
    provider: &ScriptedProvider,
    store: &MemorySnapshotStore,
) -> (TestScheduler, FixedClock) {
    let set = WindowSet::new(
        vec![
            TrackedRepo::new(widgets(), "main"),
            TrackedRepo::new(gadgets(), "main"),
        ],
        3,
        today,
    )
    .unwrap();
    let clock = FixedClock::new(today);
    let scheduler = Scheduler::new(
        Arc::new(RwLock::new(set)),
        provider.clone(),
        store.clone(),
        clock.clone(),
        test_config(),
    );
    (scheduler, clock)
}

async fn statuses(scheduler: &TestScheduler, repo: &RepoId) -> Vec<CompositeStatus> {
    scheduler
        .windows()
        .read()
        .await
        .get(repo)
        .unwrap()
        .window
        .buckets()
        .iter()
        .map(|b| b.status)
        .collect()
}

// ─── restore ───

#[tokio::test]
async fn restore_merges_persisted_days() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    store
        .set(
            &widgets().identity(),
            r#"{"1/15/2024": {"status": "success", "reference": "aaa", "detail_url": "u"}}"#
                .to_string(),
        )
        .await
        .unwrap();
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);

    let report = scheduler.restore().await;

    assert_eq!(
        report,
        RestoreReport {
            restored: 1,
            missing: 1,
            failed: 0
        }
    );
    assert_eq!(
        statuses(&scheduler, &widgets()).await,
        vec![
            CompositeStatus::Unknown,
            CompositeStatus::Success,
            CompositeStatus::Success
        ]
    );
    assert_eq!(
        statuses(&scheduler, &gadgets()).await,
        vec![CompositeStatus::Unknown; 3]
    );
}

#[tokio::test]
async fn restore_survives_corrupt_records_and_store_errors() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    store
        .set(&widgets().identity(), "{not json".to_string())
        .await
        .unwrap();
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);

    let report = scheduler.restore().await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.missing, 1);
    assert_eq!(
        statuses(&scheduler, &widgets()).await,
        vec![CompositeStatus::Unknown; 3]
    );

    store.set_unavailable(true);
    let report = scheduler.restore().await;
    assert_eq!(report.failed, 2);
}

// ─── poll ───

#[tokio::test]
async fn poll_writes_each_repository() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    provider.push(
        &widgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 16), CheckConclusion::Failure, SHA_A)]),
    );
    provider.push(
        &gadgets(),
        Scripted::Checks(vec![check(CheckStatus::Queued, None)]),
    );
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);

    let report = scheduler.poll_once().await;

    assert_eq!(report.written, 2);
    assert_eq!(report.failed, 0);
    let windows = scheduler.windows().read().await;
    let bucket = windows
        .get(&widgets())
        .unwrap()
        .window
        .lookup(day(2024, 1, 16))
        .unwrap()
        .clone();
    assert_eq!(bucket.status, CompositeStatus::Failure);
    assert_eq!(bucket.reference, "aaaaaaa");
    assert_eq!(
        windows
            .get(&gadgets())
            .unwrap()
            .window
            .lookup(day(2024, 1, 16))
            .unwrap()
            .status,
        CompositeStatus::Pending
    );
}

#[tokio::test]
async fn fetch_failure_skips_only_that_repository() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);

    provider.push(
        &widgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 15), CheckConclusion::Success, SHA_A)]),
    );
    scheduler.poll_once().await;
    let before = statuses(&scheduler, &widgets()).await;

    provider.push(&widgets(), Scripted::Fail(GitHubErrorKind::Permanent));
    provider.push(
        &gadgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 16), CheckConclusion::Success, SHA_B)]),
    );
    let report = scheduler.poll_once().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.written, 1);
    assert_eq!(statuses(&scheduler, &widgets()).await, before);
    assert_eq!(
        statuses(&scheduler, &gadgets()).await,
        vec![
            CompositeStatus::Unknown,
            CompositeStatus::Unknown,
            CompositeStatus::Success
        ]
    );
}

#[tokio::test]
async fn hanging_fetch_times_out() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    provider.push(&widgets(), Scripted::Hang);
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);

    let report = scheduler.poll_once().await;

    assert_eq!(report.failed, 1);
    // gadgets had nothing queued: no checks, window unchanged
    assert_eq!(report.unchanged, 1);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn poll_rolls_over_when_the_day_changes() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let (scheduler, clock) = scheduler_at(day(2024, 1, 16), &provider, &store);
    provider.push(
        &widgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 16), CheckConclusion::Failure, SHA_A)]),
    );
    scheduler.poll_once().await;

    clock.advance_days(1);
    let report = scheduler.poll_once().await;

    assert!(report.rolled_over);
    let windows = scheduler.windows().read().await;
    assert_eq!(windows.latest_known_date(), day(2024, 1, 17));
    assert_eq!(windows.date_labels(), vec!["1/15", "1/16", "1/17"]);
    // 1/17 has no build yet; yesterday's failure carries into it.
    let widgets_window = &windows.get(&widgets()).unwrap().window;
    let today = widgets_window.lookup(day(2024, 1, 17)).unwrap();
    assert_eq!(today.status, CompositeStatus::Failure);
    assert!(today.carried);
}

#[tokio::test]
async fn fetch_failure_still_rolls_over() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let (scheduler, clock) = scheduler_at(day(2024, 1, 16), &provider, &store);
    provider.push(&widgets(), Scripted::Fail(GitHubErrorKind::Transient));
    provider.push(&gadgets(), Scripted::Fail(GitHubErrorKind::Transient));

    clock.advance_days(2);
    let report = scheduler.poll_once().await;

    assert!(report.rolled_over);
    assert_eq!(report.failed, 2);
    let windows = scheduler.windows().read().await;
    for history in windows.histories() {
        assert_eq!(history.window.last_date(), day(2024, 1, 18));
    }
}

// ─── persist ───

#[tokio::test]
async fn persist_writes_whole_records() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    provider.push(
        &widgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 15), CheckConclusion::Success, SHA_A)]),
    );
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);
    scheduler.poll_once().await;

    let report = scheduler.persist_once().await;

    assert_eq!(report, PersistReport { written: 2, failed: 0 });
    let raw = store.get(&widgets().identity()).await.unwrap().unwrap();
    let expected = {
        let windows = scheduler.windows().read().await;
        PersistedHistory::from_window(&windows.get(&widgets()).unwrap().window)
    };
    assert_eq!(serde_json::from_str::<PersistedHistory>(&raw).unwrap(), expected);
    assert_eq!(decode_history(&raw).unwrap().buckets.len(), 3);
}

#[tokio::test]
async fn persist_failure_leaves_windows_alone() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);
    let before = scheduler.windows().read().await.clone();

    store.set_unavailable(true);
    let report = scheduler.persist_once().await;

    assert_eq!(report, PersistReport { written: 0, failed: 2 });
    assert_eq!(*scheduler.windows().read().await, before);

    store.set_unavailable(false);
    assert_eq!(scheduler.persist_once().await.written, 2);
}

#[tokio::test]
async fn persisted_records_restore_into_a_fresh_process() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    provider.push(
        &widgets(),
        Scripted::Checks(vec![check_on(day(2024, 1, 16), CheckConclusion::Failure, SHA_A)]),
    );
    let (first, _) = scheduler_at(day(2024, 1, 16), &provider, &store);
    first.poll_once().await;
    first.persist_once().await;

    // Restart the next day.
    let (second, _) = scheduler_at(day(2024, 1, 17), &provider, &store);
    second.restore().await;

    assert_eq!(
        statuses(&second, &widgets()).await,
        vec![
            CompositeStatus::Unknown,
            CompositeStatus::Failure,
            CompositeStatus::Failure
        ]
    );
}

#[tokio::test]
async fn hanging_store_times_out_on_restore_and_persist() {
    let set = WindowSet::new(vec![TrackedRepo::new(widgets(), "main")], 3, day(2024, 1, 16))
        .unwrap();
    let scheduler = Scheduler::new(
        Arc::new(RwLock::new(set)),
        ScriptedProvider::new(),
        HangingStore,
        FixedClock::new(day(2024, 1, 16)),
        test_config(),
    );
    let started = tokio::time::Instant::now();

    let restore = scheduler.restore().await;
    let persist = scheduler.persist_once().await;

    assert_eq!(
        restore,
        RestoreReport {
            restored: 0,
            missing: 0,
            failed: 1
        }
    );
    assert_eq!(persist, PersistReport { written: 0, failed: 1 });
    // Two operations bounded by a 50ms store timeout each.
    assert!(started.elapsed() < Duration::from_secs(2));
    let windows = scheduler.windows().read().await;
    assert!(
        windows
            .get(&widgets())
            .unwrap()
            .window
            .buckets()
            .iter()
            .all(|b| b.is_unknown())
    );
}

// ─── run ───

#[tokio::test]
async fn shutdown_flushes_history() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let (scheduler, _) = scheduler_at(day(2024, 1, 16), &provider, &store);
    let scheduler = Arc::new(scheduler);
    let shutdown = CancellationToken::new();

    let handle = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };
    shutdown.cancel();
    handle.await.unwrap();

    assert!(store.get(&widgets().identity()).await.unwrap().is_some());
    assert!(store.get(&gadgets().identity()).await.unwrap().is_some());
    // Intervals are 20s and 60s: nothing was polled before shutdown.
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn run_polls_on_its_interval() {
    let provider = ScriptedProvider::new();
    let store = MemorySnapshotStore::new();
    let set = WindowSet::new(vec![TrackedRepo::new(widgets(), "main")], 3, day(2024, 1, 16))
        .unwrap();
    let scheduler = Arc::new(Scheduler::new(
        Arc::new(RwLock::new(set)),
        provider.clone(),
        store.clone(),
        FixedClock::new(day(2024, 1, 16)),
        SchedulerConfig {
            poll_interval: Duration::from_millis(10),
            ..test_config()
        },
    ));
    let shutdown = CancellationToken::new();

    let handle = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();
    handle.await.unwrap();

    assert!(provider.calls() >= 2);
}
