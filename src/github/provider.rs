//! The seam between the poll scheduler and the checks API.

use std::future::Future;

use crate::classify::CheckResult;
use crate::types::RepoId;

use super::error::GitHubApiError;

/// Source of check runs for the head of a branch.
///
/// Implementations bound their own retries; the caller bounds the whole call
/// with a timeout.
pub trait ChecksProvider: Send + Sync {
    /// Fetches every check run attached to the head commit of `branch`.
    fn fetch_checks(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<CheckResult>, GitHubApiError>> + Send;
}
