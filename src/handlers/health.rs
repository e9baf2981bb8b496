//! Liveness endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

use super::SERVER_NAME;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthStatus {
    pub fn alive() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Does not touch any upstream.
pub async fn handle() -> Json<HealthStatus> {
    Json(HealthStatus::alive())
}
