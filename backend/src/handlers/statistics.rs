//! Statistics and analytics HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::services::statistics::{PeriodQuery, ReviewsQuery, StatisticsService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

pub async fn get_overview(State(state): State<AppState>) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.overview().await {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_chart_data(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.chart_data(query.period.as_deref()).await {
        Ok(chart) => (StatusCode::OK, Json(chart)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_current_week_summary(State(state): State<AppState>) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.current_week_summary().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_weekly_sales_purchase(State(state): State<AppState>) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.weekly_sales_purchase().await {
        Ok(weekly) => (StatusCode::OK, Json(weekly)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_monthly_sales_purchase(State(state): State<AppState>) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.monthly_sales_purchase().await {
        Ok(monthly) => (StatusCode::OK, Json(monthly)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_yearly_sales_purchase(State(state): State<AppState>) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.yearly_sales_purchase().await {
        Ok(yearly) => (StatusCode::OK, Json(yearly)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_top_products(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.top_products(query).await {
        Ok(top) => (StatusCode::OK, Json(top)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_products_by_rating(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.products_by_rating(query.limit).await {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({ "count": products.len(), "products": products })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<ReviewsQuery>,
) -> impl IntoResponse {
    let service = StatisticsService::new(state.db.clone());

    match service.product_reviews(&product_id, query).await {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(e) => e.into_response(),
    }
}
