//! Invoice HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::services::invoice::{
    CreateFromOrderInput, InvoiceService, ListInvoicesQuery, PayInvoiceInput,
    SearchInvoicesQuery, VoidInvoiceInput,
};
use crate::AppState;

fn invoice_service(state: &AppState) -> InvoiceService {
    InvoiceService::new(state.db.clone(), state.config.invoice.clone())
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> impl IntoResponse {
    match invoice_service(&state).list(query).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn search_invoices(
    State(state): State<AppState>,
    Query(query): Query<SearchInvoicesQuery>,
) -> impl IntoResponse {
    match invoice_service(&state).search(query).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice_stats(State(state): State<AppState>) -> impl IntoResponse {
    match invoice_service(&state).stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_overdue_report(State(state): State<AppState>) -> impl IntoResponse {
    match invoice_service(&state).overdue_report().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    match invoice_service(&state).get(&invoice_id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Printable invoice with business details and tax
pub async fn view_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    match invoice_service(&state)
        .view(&invoice_id, &state.config.business)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_invoice_from_order(
    State(state): State<AppState>,
    Json(input): Json<CreateFromOrderInput>,
) -> impl IntoResponse {
    match invoice_service(&state).create_from_order(input).await {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "Invoice created successfully",
                "invoice": invoice,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn pay_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    body: Option<Json<PayInvoiceInput>>,
) -> impl IntoResponse {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    match invoice_service(&state).pay(&invoice_id, input).await {
        Ok(invoice) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Invoice marked as paid",
                "invoice": invoice,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Return or cancel an unpaid invoice
pub async fn return_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    body: Option<Json<VoidInvoiceInput>>,
) -> impl IntoResponse {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    let action = input.action;

    match invoice_service(&state).return_or_cancel(&invoice_id, input).await {
        Ok(invoice) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": format!("Invoice {} successfully", match action {
                    shared::models::VoidAction::Return => "returned",
                    shared::models::VoidAction::Cancel => "cancelled",
                }),
                "invoice": invoice,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
