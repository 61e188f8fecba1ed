//! The fixed-length trailing window of day buckets for one repository.
//!
//! # Invariants
//!
//! - exactly `len` buckets, oldest first
//! - dates are contiguous: bucket `i` is `first_date + i` days
//! - the last bucket is the day of the most recent rollover
//!
//! The only way a new day enters the window is [`DayWindow::rollover`].
//! Violating an invariant is a bug in this module and panics.

use chrono::{Duration, NaiveDate};

use crate::types::{CompositeStatus, DayBucket};

/// An ordered, contiguous, fixed-length run of day buckets ending at "today".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    buckets: Vec<DayBucket>,
}

impl DayWindow {
    /// Creates a window of `days` unknown buckets ending at `today`.
    ///
    /// # Panics
    ///
    /// Panics if `days` is zero.
    pub fn new(days: usize, today: NaiveDate) -> Self {
        assert!(days > 0, "a day window needs at least one day");
        let first = today - Duration::days(days as i64 - 1);
        let buckets = (0..days as i64)
            .map(|offset| DayBucket::unknown(first + Duration::days(offset)))
            .collect();
        let window = DayWindow { buckets };
        window.check_invariants();
        window
    }

    /// Number of days in the window.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false: a window holds at least one day.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Oldest day in the window.
    pub fn first_date(&self) -> NaiveDate {
        self.buckets[0].date
    }

    /// Newest day in the window ("today" as of the last rollover).
    pub fn last_date(&self) -> NaiveDate {
        self.buckets[self.buckets.len() - 1].date
    }

    /// The buckets, oldest first.
    pub fn buckets(&self) -> &[DayBucket] {
        &self.buckets
    }

    /// The window's dates, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.buckets.iter().map(|b| b.date)
    }

    /// Returns the bucket for exactly `date`, if the window covers it.
    pub fn lookup(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.index_of(date).map(|i| &self.buckets[i])
    }

    /// Overwrites the bucket for `date` with a directly observed build.
    ///
    /// Dates outside the window are ignored; returns whether a bucket was written.
    pub fn upsert(
        &mut self,
        date: NaiveDate,
        status: CompositeStatus,
        reference: impl Into<String>,
        detail_url: impl Into<String>,
    ) -> bool {
        self.replace(DayBucket::observed(date, status, reference, detail_url))
    }

    /// Overwrites the bucket with the same date as `bucket`.
    ///
    /// Dates outside the window are ignored; returns whether a bucket was written.
    pub fn replace(&mut self, bucket: DayBucket) -> bool {
        match self.index_of(bucket.date) {
            Some(i) => {
                self.buckets[i] = bucket;
                true
            }
            None => false,
        }
    }

    /// Advances the window so that it ends at `today`.
    ///
    /// Drops the oldest buckets and appends unknown ones for every skipped
    /// day, so a multi-day gap never leaves holes. Does nothing unless
    /// `today` is strictly after the current last day. Returns whether the
    /// window moved.
    pub fn rollover(&mut self, today: NaiveDate) -> bool {
        let last = self.last_date();
        if today <= last {
            return false;
        }

        let len = self.buckets.len();
        let new_first = today - Duration::days(len as i64 - 1);
        self.buckets.retain(|b| b.date >= new_first);

        let mut next = self
            .buckets
            .last()
            .map(|b| b.date + Duration::days(1))
            .unwrap_or(new_first);
        while next <= today {
            self.buckets.push(DayBucket::unknown(next));
            next += Duration::days(1);
        }

        self.check_invariants();
        true
    }

    /// Fills unknown days from the most recent settled day before them.
    ///
    /// Scans oldest to newest carrying the last success or failure forward.
    /// Pending buckets are never overwritten and are never carried. Buckets
    /// filled by an earlier pass are refreshed from a newer settled day when
    /// one now precedes them, and otherwise keep their carried outcome.
    pub fn bleed_forward(&mut self) {
        let mut carry: Option<DayBucket> = None;

        for bucket in &mut self.buckets {
            match bucket.status {
                CompositeStatus::Pending => {}
                CompositeStatus::Success | CompositeStatus::Failure => {
                    match (&carry, bucket.carried) {
                        (Some(source), true) => bucket.carry_from(source),
                        _ => carry = Some(bucket.clone()),
                    }
                }
                CompositeStatus::Unknown => {
                    if let Some(source) = &carry {
                        bucket.carry_from(source);
                    }
                }
            }
        }
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.first_date()).num_days();
        if offset < 0 {
            return None;
        }
        let index = offset as usize;
        (index < self.buckets.len()).then_some(index)
    }

    fn check_invariants(&self) {
        assert!(!self.buckets.is_empty(), "day window lost all of its days");
        debug_assert!(
            self.buckets
                .windows(2)
                .all(|pair| pair[1].date == pair[0].date + Duration::days(1)),
            "day window dates are not contiguous: {:?}",
            self.dates().collect::<Vec<_>>()
        );
    }
}
