//! Rating HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::services::rating::{RateProductInput, RatingService};
use crate::AppState;

pub async fn rate_product(
    State(state): State<AppState>,
    Json(input): Json<RateProductInput>,
) -> impl IntoResponse {
    let service = RatingService::new(state.db.clone());

    match service.rate_product(input).await {
        Ok(rating) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Rating submitted successfully",
                "product": rating,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
