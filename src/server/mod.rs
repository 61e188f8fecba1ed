//! HTTP server for the build grid.
//!
//! Every handler is read-only: it takes the shared window set's read lock,
//! copies what it needs into a [`GridView`] and renders after releasing it.
//!
//! # Endpoints
//!
//! - `GET /` - The grid as an HTML page
//! - `GET /api/v1/grid` - The grid as JSON
//! - `GET /api/v1/repos/{owner}/{repo}` - One repository's row as JSON
//! - `GET /ping` - Returns `{"message":"pong"}`
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::render::GridView;
use crate::scheduler::SharedWindows;

pub mod grid;
pub mod health;
pub mod history;

pub use grid::{grid_json_handler, grid_page_handler};
pub use health::{health_handler, ping_handler};
pub use history::repo_history_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// The same window set the scheduler writes to.
    windows: SharedWindows,
}

impl AppState {
    pub fn new(windows: SharedWindows) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { windows }),
        }
    }

    pub fn windows(&self) -> &SharedWindows {
        &self.inner.windows
    }

    /// Copies the current grid under the read lock.
    pub async fn capture(&self) -> GridView {
        let windows = self.inner.windows.read().await;
        GridView::capture(&windows)
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/", get(grid_page_handler))
        .route("/api/v1/grid", get(grid_json_handler))
        .route("/api/v1/repos/{owner}/{repo}", get(repo_history_handler))
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
