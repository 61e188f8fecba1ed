//! Plain-text grid, one line per repository.
//!
//! ```text
//! repo           1/14 1/15 1/16
//! octo/widgets   ?    F    f
//! ```
//!
//! Upper case marks a directly observed day, lower case a carried one.

use std::fmt::Write;

use crate::types::CompositeStatus;

use super::{GridCell, GridView};

pub fn render_text(view: &GridView) -> String {
    let name_width = view
        .rows
        .iter()
        .map(|r| r.repo.len())
        .max()
        .unwrap_or(0)
        .max("repo".len());
    let col_width = view.date_labels.iter().map(String::len).max().unwrap_or(1);

    let mut out = String::new();
    let _ = write!(out, "{:<name_width$}", "repo");
    for label in &view.date_labels {
        let _ = write!(out, " {label:<col_width$}");
    }
    out.push('\n');

    for row in &view.rows {
        let _ = write!(out, "{:<name_width$}", row.repo);
        for cell in &row.cells {
            let _ = write!(out, " {:<col_width$}", symbol(cell));
        }
        out.push('\n');
    }
    out
}

fn symbol(cell: &GridCell) -> char {
    let symbol = match cell.status {
        CompositeStatus::Success => 'S',
        CompositeStatus::Failure => 'F',
        CompositeStatus::Pending => 'P',
        CompositeStatus::Unknown => '?',
    };
    if cell.carried {
        symbol.to_ascii_lowercase()
    } else {
        symbol
    }
}
