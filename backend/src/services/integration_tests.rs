//! Database-backed service tests
//!
//! Each test gets a fresh database with `migrations/` applied; set
//! `DATABASE_URL` to a PostgreSQL server the test user may create databases on.
//!
//! - Order placement never oversells, even under concurrent requests
//! - Cancelling an order or voiding its invoice returns stock and drops the sale
//! - The status monitor only writes and reports products that changed
//! - Bulk import rejects product ids that are already taken

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::config::InvoiceConfig;
use crate::error::AppError;
use crate::services::import::{ImportErrorType, ImportService};
use crate::services::invoice::{
    CreateFromOrderInput, InvoiceService, PayInvoiceInput, VoidInvoiceInput,
};
use crate::services::order::{OrderService, PlaceOrderInput, UpdateOrderStatusInput};
use crate::services::product::{CreateProductInput, ProductService};
use crate::services::status_monitor::StatusMonitor;
use shared::models::{
    Availability, InvoiceStatus, LedgerEntryType, OrderStatus, Product, VoidAction,
};

async fn seed_product(pool: &PgPool, product_id: &str, quantity: i32, threshold: i32) -> Product {
    ProductService::new(pool.clone())
        .create(CreateProductInput {
            product_id: Some(product_id.to_string()),
            product_name: Some(format!("Item {}", product_id)),
            category: Some("Pantry".to_string()),
            cost_price: Some(Decimal::from(8)),
            selling_price: Some(Decimal::from(12)),
            quantity: Some(quantity),
            unit: Some("box".to_string()),
            expiry_date: Some("31/12/40".to_string()),
            threshold_value: Some(threshold),
            ..CreateProductInput::default()
        })
        .await
        .unwrap()
}

fn order_input(product_id: &str, quantity: i32) -> PlaceOrderInput {
    PlaceOrderInput {
        product_id: product_id.to_string(),
        quantity_ordered: quantity,
        rating: Some(4),
        review: None,
        notes: None,
        customer_info: None,
    }
}

fn invoice_service(pool: &PgPool) -> InvoiceService {
    InvoiceService::new(
        pool.clone(),
        InvoiceConfig {
            due_days: 15,
            tax_rate_percent: Decimal::from(15),
            payment_terms: "Payment due within 15 days".to_string(),
        },
    )
}

async fn sale_entries(pool: &PgPool, order_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM ledger_entries WHERE order_id = $1 AND entry_type = $2",
    )
    .bind(order_id)
    .bind(LedgerEntryType::Sale)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn stock_of(pool: &PgPool, product_id: &str) -> Product {
    ProductService::new(pool.clone()).get(product_id).await.unwrap()
}

// ============================================================================
// Orders
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_orders_never_oversell(pool: PgPool) {
    seed_product(&pool, "PROD-RACE", 10, 2).await;
    let first = OrderService::new(pool.clone());
    let second = OrderService::new(pool.clone());

    let (a, b) = tokio::join!(
        first.place_order(order_input("PROD-RACE", 6)),
        second.place_order(order_input("PROD-RACE", 6)),
    );

    let (placed, rejected) = match (a, b) {
        (Ok(placed), Err(rejected)) | (Err(rejected), Ok(placed)) => (placed, rejected),
        other => panic!("expected exactly one order to succeed, got {:?}", other),
    };
    assert_eq!(placed.updated_product.remaining_quantity, 4);
    match rejected {
        AppError::InsufficientStock { available, message } => {
            assert_eq!(available, 4);
            assert_eq!(message, "Only 4 units available. Please order accordingly.");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(stock_of(&pool, "PROD-RACE").await.quantity, 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_order_above_stock_is_rejected(pool: PgPool) {
    seed_product(&pool, "PROD-FEW", 3, 1).await;

    let err = OrderService::new(pool.clone())
        .place_order(order_input("PROD-FEW", 4))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { available: 3, .. }));
    assert_eq!(stock_of(&pool, "PROD-FEW").await.quantity, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_restores_stock_and_drops_sale(pool: PgPool) {
    seed_product(&pool, "PROD-CXL", 10, 2).await;
    let orders = OrderService::new(pool.clone());

    let placed = orders.place_order(order_input("PROD-CXL", 9)).await.unwrap();
    let order_id = placed.order.order_id.clone();
    assert_eq!(placed.updated_product.availability, Availability::LowStock);
    assert_eq!(sale_entries(&pool, &order_id).await, 1);

    let cancelled = orders
        .update_status(
            &order_id,
            UpdateOrderStatusInput {
                status: Some("cancelled".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);

    let product = stock_of(&pool, "PROD-CXL").await;
    assert_eq!(product.quantity, 10);
    assert_eq!(product.availability, Availability::InStock);
    assert_eq!(sale_entries(&pool, &order_id).await, 0);

    let reopened = orders
        .update_status(
            &order_id,
            UpdateOrderStatusInput {
                status: Some("pending".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(reopened, AppError::InvalidStateTransition(_)));
    assert_eq!(stock_of(&pool, "PROD-CXL").await.quantity, 10);
}

// ============================================================================
// Invoices
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_returned_invoice_cancels_order(pool: PgPool) {
    seed_product(&pool, "PROD-RET", 10, 2).await;
    let placed = OrderService::new(pool.clone())
        .place_order(order_input("PROD-RET", 3))
        .await
        .unwrap();
    let order_id = placed.order.order_id.clone();

    let invoices = invoice_service(&pool);
    let invoice = invoices
        .create_from_order(CreateFromOrderInput {
            order_id: Some(order_id.clone()),
        })
        .await
        .unwrap();
    assert_eq!(invoice.due_date - invoice.order_date, Duration::days(15));

    let duplicate = invoices
        .create_from_order(CreateFromOrderInput {
            order_id: Some(order_id.clone()),
        })
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::ValidationError(_)));

    let voided = invoices
        .return_or_cancel(
            &invoice.invoice_id,
            VoidInvoiceInput {
                action: VoidAction::Return,
                notes: Some("damaged on arrival".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(voided.status, InvoiceStatus::Returned);
    assert_eq!(voided.notes.as_deref(), Some("damaged on arrival"));

    let order = OrderService::new(pool.clone()).get_order(&order_id).await.unwrap();
    assert_eq!(order.order_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, "PROD-RET").await.quantity, 10);
    assert_eq!(sale_entries(&pool, &order_id).await, 0);

    let pay = invoices
        .pay(&invoice.invoice_id, PayInvoiceInput::default())
        .await
        .unwrap_err();
    assert!(matches!(pay, AppError::InvalidStateTransition(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pay_stores_notes(pool: PgPool) {
    seed_product(&pool, "PROD-PAY", 10, 2).await;
    let placed = OrderService::new(pool.clone())
        .place_order(order_input("PROD-PAY", 2))
        .await
        .unwrap();

    let invoices = invoice_service(&pool);
    let invoice = invoices
        .create_from_order(CreateFromOrderInput {
            order_id: Some(placed.order.order_id),
        })
        .await
        .unwrap();

    let paid = invoices
        .pay(
            &invoice.invoice_id,
            PayInvoiceInput {
                notes: Some("bank transfer".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_date.is_some());
    assert_eq!(paid.notes.as_deref(), Some("bank transfer"));

    let again = invoices
        .pay(&invoice.invoice_id, PayInvoiceInput::default())
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::InvalidStateTransition(_)));
}

// ============================================================================
// Status monitor
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_monitor_reports_only_changed_products(pool: PgPool) {
    seed_product(&pool, "PROD-LOW", 10, 2).await;
    seed_product(&pool, "PROD-OK", 50, 5).await;

    sqlx::query("UPDATE products SET quantity = 2 WHERE product_id = $1")
        .bind("PROD-LOW")
        .execute(&pool)
        .await
        .unwrap();

    let monitor = StatusMonitor::new(pool.clone(), std::time::Duration::from_secs(60));
    let today = Utc::now().date_naive();

    let first = monitor.check_product_status(today).await.unwrap();
    assert_eq!(first.checked, 2);
    assert_eq!(first.updated, 1);
    assert_eq!(first.low_stock, 1);
    assert_eq!(
        stock_of(&pool, "PROD-LOW").await.availability,
        Availability::LowStock
    );

    let second = monitor.check_product_status(today).await.unwrap();
    assert_eq!(second.checked, 2);
    assert_eq!(second.updated, 0);
    assert_eq!(second.low_stock, 0);
    assert_eq!(second.out_of_stock, 0);
    assert_eq!(second.expired, 0);
}

// ============================================================================
// Bulk import
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn test_bulk_import_rejects_taken_ids(pool: PgPool) {
    seed_product(&pool, "OLD-1", 5, 1).await;

    let csv = "\
Rice,OLD-1,Grains,40,55,10,kg,31/12/40,2,
Beans,NEW-1,Grains,30,45,10,kg,31/12/40,2,
Lentils,NEW-1,Grains,30,45,10,kg,31/12/40,2,
,,Grains,30,45,10,kg,31/12/40,2,
";
    let report = ImportService::new(pool.clone()).add_multiple(csv).await.unwrap();

    assert_eq!(report.results.successful, 1);
    assert_eq!(report.successful[0].product_id, "NEW-1");
    assert_eq!(report.results.failed, 3);

    let duplicates: Vec<u64> = report
        .failed
        .iter()
        .filter(|f| f.error.contains("Duplicate product ID"))
        .map(|f| f.row_number)
        .collect();
    assert_eq!(duplicates, vec![1, 3]);
    assert_eq!(
        report.errors_by_type.get(&ImportErrorType::MissingFields),
        Some(&vec![4])
    );

    assert_eq!(stock_of(&pool, "OLD-1").await.quantity, 5);
}
