use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// Service banner with an endpoint listing
pub async fn root() -> Json<Value> {
    Json(json!({
        "ok": true,
        "message": "Instagram follow-reward service",
        "endpoints": {
            "health": "/health",
            "exists": "/username/{username}/exists",
            "profile_pic": "/username/{username}/profile_pic",
            "verify_follow": "/verify_follow?source=&target=",
            "verify_and_award": "/verify/and_award",
        },
    }))
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let cache = state.instagram.cache_stats();
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(json!({
        "status": "ok",
        "uptime_secs": uptime_secs,
        "cache": cache,
    }))
}
