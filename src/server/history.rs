//! Per-repository history endpoint.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::AppState;
use crate::render::GridRow;

/// Errors that can occur when fetching a repository's history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The repository is not tracked.
    #[error("repository not tracked: {owner}/{repo}")]
    NotFound { owner: String, repo: String },
}

impl IntoResponse for HistoryError {
    fn into_response(self) -> Response {
        let status = match &self {
            HistoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

/// Returns one repository's row of the grid.
///
/// # Response
///
/// - 200 OK with the repository's [`GridRow`]
/// - 404 Not Found if the repository is not tracked
///
/// ```ignore
/// GET /api/v1/repos/octocat/hello-world HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"repo": "octocat/hello-world", "link": "https://github.com/octocat/hello-world", ...}
/// ```
pub async fn repo_history_handler(
    State(app_state): State<AppState>,
    Path((owner, repo)): Path<(String, String)>,
) -> Result<Json<GridRow>, HistoryError> {
    let name = format!("{owner}/{repo}");
    app_state
        .capture()
        .await
        .rows
        .into_iter()
        .find(|row| row.repo == name)
        .map(Json)
        .ok_or(HistoryError::NotFound { owner, repo })
}
