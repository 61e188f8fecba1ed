//! Day-bucketed build history.
//!
//! Each tracked repository owns a [`DayWindow`]: exactly N calendar-day
//! buckets, oldest first, ending at the day of the last rollover. The
//! [`WindowSet`] holds one window per repository and the shared
//! `latest_known_date` used to detect day boundaries.
//!
//! # Module Structure
//!
//! - [`day_window`]: lookup, upsert, rollover and bleed-forward for one window
//! - [`set`]: per-repository histories and the process-wide set

pub mod day_window;
pub mod set;

pub use day_window::DayWindow;
pub use set::{RepoHistory, WindowSet, WindowSetError};
