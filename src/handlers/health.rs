//! Health check handler

use axum::Json;
use serde::Serialize;

/// Public health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Status indicator (always "ok")
    pub status: String,
}

/// Liveness probe for the hosting platform.
///
/// # Example
/// ```bash
/// curl http://localhost:8080/health
/// # Returns: {"status":"ok"}
/// ```
pub async fn health_check() -> Json<HealthCheckResponse> {
    tracing::debug!("Health check requested");
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}
