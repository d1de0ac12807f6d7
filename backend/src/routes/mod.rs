//! Route definitions for the Inventory Back-Office API

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/invoices", invoice_routes())
        .nest("/ratings", rating_routes())
        .nest("/statistics", statistics_routes())
        .nest("/cron", cron_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

fn user_routes() -> Router<AppState> {
    Router::new().route(
        "/:user_id",
        get(handlers::get_user).put(handlers::update_user),
    )
}

/// Product catalog and bulk import routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-id", get(handlers::generate_id))
        .route("/add-single-json", post(handlers::add_single_product))
        .route("/csv-format", get(handlers::get_csv_format))
        .route("/validate-csv", post(handlers::validate_csv))
        .route("/add-multiple", post(handlers::add_multiple_products))
        .route("/search", get(handlers::search_products))
        .route("/all", get(handlers::list_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/product/:product_id", get(handlers::get_product_for_order))
        .route("/check-availability", post(handlers::check_availability))
        .route("/place-order", post(handlers::place_order))
        .route("/order/:order_id", get(handlers::get_order))
        .route("/orders", get(handlers::list_orders))
        .route("/order/:order_id/status", patch(handlers::update_order_status))
}

fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices))
        .route("/search", get(handlers::search_invoices))
        .route("/stats", get(handlers::get_invoice_stats))
        .route("/reports/overdue", get(handlers::get_overdue_report))
        .route("/create-from-order", post(handlers::create_invoice_from_order))
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/view", get(handlers::view_invoice))
        .route("/:invoice_id/pay", patch(handlers::pay_invoice))
        .route("/:invoice_id/return", patch(handlers::return_invoice))
}

fn rating_routes() -> Router<AppState> {
    Router::new().route("/rate-product", post(handlers::rate_product))
}

/// Sales analytics routes
fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(handlers::get_overview))
        .route("/chart-data", get(handlers::get_chart_data))
        .route("/current-week-summary", get(handlers::get_current_week_summary))
        .route("/sales-purchase/weekly", get(handlers::get_weekly_sales_purchase))
        .route("/sales-purchase/monthly", get(handlers::get_monthly_sales_purchase))
        .route("/sales-purchase/yearly", get(handlers::get_yearly_sales_purchase))
        .route("/top-products", get(handlers::get_top_products))
        .route("/products-by-rating", get(handlers::get_products_by_rating))
        .route("/product-reviews/:product_id", get(handlers::get_product_reviews))
}

/// Status monitor routes
fn cron_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::get_monitor_status))
        .route("/trigger", post(handlers::trigger_status_check))
        .route("/products/:status", get(handlers::get_products_by_status))
}
