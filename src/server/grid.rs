//! The grid itself, as a page and as JSON.
//!
//! Both handlers copy the grid under the read lock and render after
//! releasing it.

use axum::Json;
use axum::extract::State;
use axum::response::Html;

use super::AppState;
use crate::render::{GridView, render_html};

/// `GET /` renders the dashboard.
pub async fn grid_page_handler(State(app_state): State<AppState>) -> Html<String> {
    let view = app_state.capture().await;
    Html(render_html(&view))
}

/// `GET /api/v1/grid` returns every repository's window.
pub async fn grid_json_handler(State(app_state): State<AppState>) -> Json<GridView> {
    Json(app_state.capture().await)
}
