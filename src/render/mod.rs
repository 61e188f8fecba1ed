//! Read-only views of the window set for display.
//!
//! A [`GridView`] is captured while the caller holds a read lock and is then
//! rendered without it, so a slow client never holds up the poll cycle.
//!
//! # Module Structure
//!
//! - [`html`]: the dashboard page
//! - [`text`]: a plain-text grid for logs

pub mod html;
pub mod text;

use serde::Serialize;

use crate::types::{CompositeStatus, format_day_key};
use crate::window::WindowSet;

pub use html::render_html;
pub use text::render_text;

/// An immutable copy of everything the grid shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridView {
    /// Column labels (`M/D`), oldest first.
    pub date_labels: Vec<String>,
    pub rows: Vec<GridRow>,
}

/// One repository's row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    /// `owner/name`.
    pub repo: String,
    /// Canonical repository URL.
    pub link: String,
    pub default_branch: String,
    pub cells: Vec<GridCell>,
}

/// One day of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Full day key (`M/D/YYYY`).
    pub day: String,
    pub status: CompositeStatus,
    pub reference: String,
    pub detail_url: String,
    /// The status was filled in from an earlier day.
    pub carried: bool,
}

impl GridView {
    pub fn capture(set: &WindowSet) -> Self {
        let rows = set
            .histories()
            .iter()
            .map(|history| GridRow {
                repo: history.repo.to_string(),
                link: history.identity(),
                default_branch: history.default_branch.clone(),
                cells: history
                    .window
                    .buckets()
                    .iter()
                    .map(|bucket| GridCell {
                        day: format_day_key(bucket.date),
                        status: bucket.status,
                        reference: bucket.reference.clone(),
                        detail_url: bucket.detail_url.clone(),
                        carried: bucket.carried,
                    })
                    .collect(),
            })
            .collect();

        GridView {
            date_labels: set.date_labels(),
            rows,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{RepoId, TrackedRepo};
    use chrono::NaiveDate;

    pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two repositories over 1/14..1/16: one failing then carried, one empty.
    pub(crate) fn sample_set() -> WindowSet {
        let mut set = WindowSet::new(
            vec![
                TrackedRepo::new(RepoId::new("octo", "widgets"), "main"),
                TrackedRepo::new(RepoId::new("octo", "gadgets"), "trunk"),
            ],
            3,
            day(2024, 1, 16),
        )
        .unwrap();
        let widgets = &mut set.histories_mut()[0].window;
        widgets.upsert(
            day(2024, 1, 15),
            CompositeStatus::Failure,
            "abc1234",
            "https://github.com/octo/widgets/runs/7",
        );
        widgets.bleed_forward();
        set
    }

    #[test]
    fn capture_copies_every_bucket() {
        let view = GridView::capture(&sample_set());

        assert_eq!(view.date_labels, vec!["1/14", "1/15", "1/16"]);
        assert_eq!(view.rows.len(), 2);

        let widgets = &view.rows[0];
        assert_eq!(widgets.repo, "octo/widgets");
        assert_eq!(widgets.link, "https://github.com/octo/widgets");
        let statuses: Vec<_> = widgets.cells.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                CompositeStatus::Unknown,
                CompositeStatus::Failure,
                CompositeStatus::Failure
            ]
        );
        assert_eq!(widgets.cells[1].day, "1/15/2024");
        assert!(widgets.cells[2].carried);

        assert_eq!(view.rows[1].default_branch, "trunk");
        assert!(view.rows[1].cells.iter().all(|c| c.status == CompositeStatus::Unknown));
    }
}
