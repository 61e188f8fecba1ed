//! Calendar-day buckets and their persisted key format.
//!
//! Dates are plain calendar dates in UTC. Timestamps are reduced to their UTC
//! date before they are compared with a bucket.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::status::CompositeStatus;

/// Reduces a timestamp to the UTC calendar day it falls on.
pub fn utc_day(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Formats a date as the persisted day key, `M/D/YYYY`.
///
/// The year is always present so the same day in different years never collides.
pub fn format_day_key(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Parses a persisted day key.
///
/// Accepts `M/D/YYYY` (with or without zero padding) and ISO `YYYY-MM-DD`.
/// Keys without a year, or naming an impossible day, are rejected.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    let key = key.trim();
    if let Some((month, rest)) = key.split_once('/') {
        let (day, year) = rest.split_once('/')?;
        return NaiveDate::from_ymd_opt(
            year.parse().ok()?,
            month.parse().ok()?,
            day.parse().ok()?,
        );
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Formats a date as a short grid column label, `M/D`.
pub fn date_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

/// One calendar day's build outcome for one repository.
///
/// `reference` and `detail_url` are empty exactly when `status` is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub status: CompositeStatus,
    /// Short commit reference of the build.
    pub reference: String,
    /// Link to the build's detail page.
    pub detail_url: String,
    /// Set when the bucket was filled from an earlier day rather than observed.
    pub carried: bool,
}

impl DayBucket {
    /// Creates an empty bucket for `date`.
    pub fn unknown(date: NaiveDate) -> Self {
        DayBucket {
            date,
            status: CompositeStatus::Unknown,
            reference: String::new(),
            detail_url: String::new(),
            carried: false,
        }
    }

    /// Creates a bucket holding a directly observed build.
    ///
    /// An unknown status yields an empty bucket regardless of the metadata
    /// passed in.
    pub fn observed(
        date: NaiveDate,
        status: CompositeStatus,
        reference: impl Into<String>,
        detail_url: impl Into<String>,
    ) -> Self {
        if !status.is_observed() {
            return DayBucket::unknown(date);
        }
        DayBucket {
            date,
            status,
            reference: reference.into(),
            detail_url: detail_url.into(),
            carried: false,
        }
    }

    /// Returns true if nothing is known about this day.
    pub fn is_unknown(&self) -> bool {
        !self.status.is_observed()
    }

    /// Overwrites this bucket's outcome with the one from `source`, keeping the date.
    pub(crate) fn carry_from(&mut self, source: &DayBucket) {
        self.status = source.status;
        self.reference = source.reference.clone();
        self.detail_url = source.detail_url.clone();
        self.carried = true;
    }
}
