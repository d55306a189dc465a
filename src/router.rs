//! Health and stats routes.
//!
//! Minimal keep-alive surface for deployment platforms: `/` and `/health`
//! answer liveness probes, `/api/stats` exposes the latest cluster and
//! rate-limit statistics as JSON.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/stats", get(stats))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cluster_id": state.cluster.topology().cluster_id,
        "instance_id": state.cluster.instance_id(),
        "uptime_seconds": state.cluster.uptime_seconds(Utc::now()),
    }))
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let gateway = state.observer.sample().await;
    let now = Utc::now();

    Json(json!({
        "cluster": state.cluster.stats_at(&gateway, now),
        "rate_limits": state.monitor.stats(24, now),
    }))
}
