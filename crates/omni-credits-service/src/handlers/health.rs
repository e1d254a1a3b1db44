//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

/// What `/health` reports.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Crate version, for deploy verification.
    pub version: &'static str,
}

/// Liveness probe; no dependencies are checked.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
