//! Octocrab-backed checks provider.

use octocrab::Octocrab;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::classify::{CheckConclusion, CheckResult, CheckStatus};
use crate::types::{RepoId, Sha};

use super::error::GitHubApiError;
use super::provider::ChecksProvider;
use super::retry::{RetryConfig, retry_with_backoff};

/// Upper bound GitHub allows for `per_page`.
const CHECK_RUNS_PER_PAGE: u32 = 100;

/// A GitHub API client that reads check runs for any repository the token
/// can see.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    retry: RetryConfig,
}

impl OctocrabClient {
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            retry: RetryConfig::default(),
        }
    }

    /// Creates a client authenticated with a personal access token.
    pub fn from_token(token: impl Into<String>) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(client))
    }

    async fn get_check_runs(&self, url: &str) -> Result<CheckRunsResponse, GitHubApiError> {
        let response: CheckRunsResponse = self.client.get(url, None::<&()>).await?;
        Ok(response)
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ChecksProvider for OctocrabClient {
    #[instrument(skip(self), fields(repo = %repo))]
    async fn fetch_checks(
        &self,
        repo: &RepoId,
        branch: &str,
    ) -> Result<Vec<CheckResult>, GitHubApiError> {
        let url = check_runs_url(repo, branch);
        let response = retry_with_backoff(self.retry, || self.get_check_runs(&url)).await?;
        trace!(
            total = response.total_count,
            returned = response.check_runs.len(),
            "Fetched check runs"
        );
        Ok(response.into_results())
    }
}

/// REST route listing check runs for the head of `branch`.
///
/// The branch is URL-encoded so that names like `release/1.x` stay one path
/// segment.
fn check_runs_url(repo: &RepoId, branch: &str) -> String {
    format!(
        "/repos/{}/{}/commits/{}/check-runs?per_page={}",
        repo.owner,
        repo.repo,
        urlencoding::encode(branch),
        CHECK_RUNS_PER_PAGE
    )
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CheckRunsResponse {
    #[serde(default)]
    total_count: u64,
    check_runs: Vec<CheckRunResponse>,
}

#[derive(Debug, Deserialize)]
struct CheckRunResponse {
    status: CheckStatus,
    conclusion: Option<CheckConclusion>,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    head_sha: String,
    html_url: Option<String>,
}

impl CheckRunsResponse {
    fn into_results(self) -> Vec<CheckResult> {
        self.check_runs
            .into_iter()
            .map(|run| CheckResult {
                status: run.status,
                conclusion: run.conclusion,
                started_at: run.started_at,
                head_sha: Sha::new(run.head_sha),
                html_url: run.html_url,
            })
            .collect()
    }
}
