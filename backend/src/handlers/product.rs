//! Product catalog HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::services::import::{csv_format, ImportService};
use crate::services::product::{CreateProductInput, ProductService, UpdateProductInput};
use crate::AppState;
use shared::ids::generate_product_id;
use shared::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct ProductSearchQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Preview a fresh product id
pub async fn generate_id() -> impl IntoResponse {
    Json(serde_json::json!({ "product_id": generate_product_id(Utc::now()) }))
}

/// Create a single product from JSON
pub async fn add_single_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.create(input).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Product added successfully",
                "product": product,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Describe the bulk CSV layout
pub async fn get_csv_format() -> impl IntoResponse {
    Json(csv_format())
}

/// Check a headed CSV without inserting anything
pub async fn validate_csv(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let service = ImportService::new(state.db.clone());

    match service.validate_csv(&body).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Bulk insert from a headerless CSV
pub async fn add_multiple_products(
    State(state): State<AppState>,
    body: String,
) -> impl IntoResponse {
    let service = ImportService::new(state.db.clone());

    match service.add_multiple(&body).await {
        Ok(report) => {
            let status = if report.results.successful > 0 {
                StatusCode::CREATED
            } else {
                StatusCode::BAD_REQUEST
            };
            (status, Json(report)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());
    let pagination = Pagination::from_query(query.page, query.limit, 10);

    match service
        .search(query.query.as_deref().unwrap_or_default(), pagination)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.list_all().await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.get(&product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Json(input): Json<UpdateProductInput>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.update(&product_id, input).await {
        Ok(product) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Product updated successfully",
                "product": product,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    let service = ProductService::new(state.db.clone());

    match service.delete(&product_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Product deleted successfully" })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
