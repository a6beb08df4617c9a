//! Readiness endpoint

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::libsql::{Database, check_health};
use serde_json::Value;
use std::sync::Arc;

async fn ready(State(db): State<Arc<Database>>) -> (StatusCode, Json<Value>) {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async { check_health(&db).await.map_err(|e| e.to_string()) }),
    )];
    run_health_checks(checks).await
}

/// `GET /ready`: 200 when the catalog answers `SELECT 1`, 503 otherwise
pub fn router(db: Arc<Database>) -> Router {
    Router::new().route("/ready", get(ready)).with_state(db)
}
