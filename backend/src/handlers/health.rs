//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub status_monitor: &'static str,
}

/// Service liveness plus database and monitor state
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "disconnected"
        }
    };
    let status_monitor = if state.monitor.status().await.is_running {
        "running"
    } else {
        "stopped"
    };

    Json(HealthResponse {
        status: if database == "connected" { "healthy" } else { "degraded" },
        service: "inventory-backoffice",
        version: env!("CARGO_PKG_VERSION"),
        database,
        status_monitor,
    })
}
