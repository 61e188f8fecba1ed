//! Liveness endpoints.
//!
//! Both return 200 as long as the server is accepting connections; neither
//! looks at the window set.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// Health check handler.
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

#[derive(Debug, Serialize)]
pub struct Pong {
    message: &'static str,
}

/// `GET /ping` answers `{"message":"pong"}`.
pub async fn ping_handler() -> Json<Pong> {
    Json(Pong { message: "pong" })
}
