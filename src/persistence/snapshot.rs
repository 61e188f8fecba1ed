//! Persisted form of one repository's history.
//!
//! # Record Format
//!
//! One JSON object per repository, keyed by day (`M/D/YYYY`):
//!
//! ```text
//! {
//!   "1/15/2024": {"status": "success", "reference": "abc1234", "detail_url": "https://...", "carried": false},
//!   "1/16/2024": {"status": "unknown", "reference": "", "detail_url": "", "carried": false}
//! }
//! ```
//!
//! The whole record is written at once, never patched. Records written by
//! earlier deployments (`Status`/`Sha`/`Url` fields) are still readable.
//!
//! # Lenient Decoding
//!
//! A record that is not a JSON object is rejected as a whole. Within a valid
//! record, entries with an unparseable day key or value are dropped
//! individually, so one corrupt day never costs the rest of the history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CompositeStatus, DayBucket, format_day_key, parse_day_key};
use crate::window::DayWindow;

/// Errors that can occur while encoding or decoding a record.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// One persisted day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBucket {
    #[serde(alias = "Status")]
    pub status: CompositeStatus,

    #[serde(default, alias = "Sha", alias = "sha")]
    pub reference: String,

    #[serde(default, alias = "Url", alias = "url", alias = "detailUrl")]
    pub detail_url: String,

    #[serde(default)]
    pub carried: bool,
}

impl PersistedBucket {
    fn from_bucket(bucket: &DayBucket) -> Self {
        PersistedBucket {
            status: bucket.status,
            reference: bucket.reference.clone(),
            detail_url: bucket.detail_url.clone(),
            carried: bucket.carried,
        }
    }

    fn into_bucket(self, date: NaiveDate) -> DayBucket {
        let mut bucket = DayBucket::observed(date, self.status, self.reference, self.detail_url);
        bucket.carried = self.carried && bucket.status.is_observed();
        bucket
    }
}

/// The persisted history of one repository, keyed by day key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedHistory {
    pub days: BTreeMap<String, PersistedBucket>,
}

impl PersistedHistory {
    /// Captures every bucket of `window`.
    pub fn from_window(window: &DayWindow) -> Self {
        let days = window
            .buckets()
            .iter()
            .map(|b| (format_day_key(b.date), PersistedBucket::from_bucket(b)))
            .collect();
        PersistedHistory { days }
    }

    /// Serializes the record for the snapshot store.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The usable part of a decoded record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedHistory {
    /// Buckets that decoded cleanly, oldest first.
    pub buckets: Vec<DayBucket>,
    /// Keys of entries that were dropped.
    pub discarded: Vec<String>,
}

/// Decodes a stored record, dropping entries that cannot be understood.
///
/// # Errors
///
/// Returns an error only if the record is not a JSON object at all.
pub fn decode_history(raw: &str) -> Result<DecodedHistory> {
    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;

    let mut decoded = DecodedHistory::default();
    for (key, value) in entries {
        let parsed = parse_day_key(&key).and_then(|date| {
            serde_json::from_value::<PersistedBucket>(value)
                .ok()
                .map(|b| b.into_bucket(date))
        });
        match parsed {
            Some(bucket) => decoded.buckets.push(bucket),
            None => decoded.discarded.push(key),
        }
    }
    decoded.buckets.sort_by_key(|b| b.date);

    Ok(decoded)
}
