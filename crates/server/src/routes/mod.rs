//! API route handlers
//!
//! - `health`: liveness, readiness and metrics
//! - `webhook`: resolve a document and mail the link
//! - `lookup`: dry-run resolution with scoring diagnostics
//! - `table`: reference table metadata and reload

pub mod health;
pub mod lookup;
pub mod table;
pub mod webhook;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /, no authentication).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "doclink",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/webhook",
            "/api/v1/lookup",
            "/api/v1/table",
            "/api/v1/table/reload",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
