//! Order HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::services::order::{
    CheckAvailabilityInput, ListOrdersQuery, OrderService, PlaceOrderInput,
    UpdateOrderStatusInput,
};
use crate::AppState;

/// Product snapshot for the order form
pub async fn get_product_for_order(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.product_for_order(&product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn check_availability(
    State(state): State<AppState>,
    Json(input): Json<CheckAvailabilityInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.check_availability(input).await {
        Ok(check) => (StatusCode::OK, Json(check)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(input): Json<PlaceOrderInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.place_order(input).await {
        Ok(placed) => (StatusCode::CREATED, Json(placed)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.get_order(&order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.list_orders(query).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> impl IntoResponse {
    let service = OrderService::new(state.db.clone());

    match service.update_status(&order_id, input).await {
        Ok(order) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Order status updated successfully",
                "order": order,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
