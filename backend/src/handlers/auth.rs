//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::user::{LoginInput, RegisterInput, UserService};
use crate::AppState;

/// Register a new back-office user
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.register(input).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "User registered successfully",
                "user": user,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Verify credentials
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.login(input).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Login successful",
                "user": user,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
