//! Status monitor HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::AppState;

pub async fn get_monitor_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.status().await)
}

/// Run a product status check right away
pub async fn trigger_status_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.monitor.trigger().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Product status check completed",
                "summary": summary,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_products_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    match state.monitor.products_by_availability(&status).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => e.into_response(),
    }
}
