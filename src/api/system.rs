//! Service-level endpoints: the endpoint index and the health check.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

const SERVICE_NAME: &str = "Keeper Member Management";

/// Map of available endpoint paths
///
/// GET /
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Keeper Member Management API",
        "status": "running",
        "endpoints": {
            "auth_login": "/api/auth/login",
            "members": "/api/members",
            "member_stats": "/api/members/stats",
            "health": "/api/health",
            "cid_verify": "/api/cid/verify",
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Service status including a live store connectivity probe
///
/// GET /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    Json(json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": if database_ok { "connected" } else { "disconnected" },
    }))
}
