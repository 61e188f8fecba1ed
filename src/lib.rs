//! Build Grid - a rolling N-day dashboard of CI status for a set of GitHub
//! repositories.
//!
//! A background scheduler polls each repository's default branch for check
//! runs, reduces them to one status per day, and periodically persists the
//! per-repository history. The HTTP server renders the shared window set as
//! an HTML grid or JSON.

pub mod classify;
pub mod config;
pub mod github;
pub mod persistence;
pub mod reconcile;
pub mod render;
pub mod scheduler;
pub mod server;
pub mod types;
pub mod window;

#[cfg(test)]
pub(crate) mod test_utils;
