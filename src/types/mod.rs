//! Core domain types for the build grid.
//!
//! This module contains the fundamental value types shared by the window,
//! the reconciler and the persistence layer.

pub mod day;
pub mod ids;
pub mod status;

// Re-export commonly used types at the module level
pub use day::{DayBucket, date_label, format_day_key, parse_day_key, utc_day};
pub use ids::{RepoId, SHORT_SHA_LEN, Sha, TrackedRepo};
pub use status::CompositeStatus;
