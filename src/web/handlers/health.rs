//! Health check HTTP handler

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe; does not touch upstream sources
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}
