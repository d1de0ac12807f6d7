//! User profile HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::services::user::{UpdateProfileInput, UserService};
use crate::AppState;

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.get(user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<UpdateProfileInput>,
) -> impl IntoResponse {
    let service = UserService::new(state.db.clone());

    match service.update_profile(user_id, input).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Profile updated successfully",
                "user": user,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
