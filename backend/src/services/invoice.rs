//! Invoice generation, payment and void handling

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::config::{BusinessConfig, InvoiceConfig};
use crate::error::{AppError, AppResult};
use crate::services::order::{cancel_order, lock_order};
use crate::services::product::like_pattern;
use shared::ids::{generate_invoice_id, generate_reference_number};
use shared::models::{due_date, CustomerInfo, Invoice, InvoiceStatus, TaxBreakdown, VoidAction};
use shared::types::{Pagination, PaginationMeta};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_id, reference_number, order_id, product_id, product_name,
    customer_name, customer_email, customer_phone, quantity_ordered, price_per_unit,
    total_amount, status, order_date, due_date, paid_date, notes, created_at, updated_at
"#;

/// Text columns matched by invoice search
const SEARCH_PREDICATE: &str = r#"
    (invoice_id ILIKE $1 OR reference_number ILIKE $1 OR order_id ILIKE $1
     OR product_id ILIKE $1 OR product_name ILIKE $1 OR customer_name ILIKE $1
     OR customer_email ILIKE $1 OR customer_phone ILIKE $1 OR status ILIKE $1
     OR total_amount::TEXT ILIKE $1 OR price_per_unit::TEXT ILIKE $1
     OR quantity_ordered::TEXT ILIKE $1)
"#;

/// Invoice service
#[derive(Clone)]
pub struct InvoiceService {
    db: PgPool,
    terms: InvoiceConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchInvoicesQuery {
    pub query: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceList {
    pub invoices: Vec<Invoice>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct InvoiceSearchResult {
    pub query: String,
    pub invoices: Vec<Invoice>,
    pub pagination: PaginationMeta,
    /// Matches per status, ignoring the status filter
    pub by_status: BTreeMap<String, i64>,
}

/// Dashboard numbers over the last seven days
#[derive(Debug, Default, Serialize, sqlx::FromRow)]
pub struct InvoiceStats {
    pub recent_invoices: i64,
    pub total_invoices: i64,
    pub processed_invoices: i64,
    pub paid_amount: Decimal,
    pub paid_customers: i64,
    pub unpaid_amount: Decimal,
    pub unpaid_count: i64,
    pub overdue_count: i64,
}

#[derive(Debug, Serialize)]
pub struct OverdueReport {
    pub invoices: Vec<OverdueInvoice>,
    pub count: usize,
    pub total_overdue_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OverdueInvoice {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub days_overdue: i64,
}

/// Printable invoice
#[derive(Debug, Serialize)]
pub struct InvoiceView {
    pub header: InvoiceHeader,
    pub business: BusinessConfig,
    pub customer: CustomerInfo,
    pub line: InvoiceLine,
    pub totals: TaxBreakdown,
    pub payment: PaymentInfo,
    pub payment_terms: String,
}

#[derive(Debug, Serialize)]
pub struct InvoiceHeader {
    pub invoice_id: String,
    pub reference_number: String,
    pub order_id: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: InvoiceStatus,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PaymentInfo {
    pub status: InvoiceStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateFromOrderInput {
    pub order_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayInvoiceInput {
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoidInvoiceInput {
    #[serde(default)]
    pub action: VoidAction,
    pub notes: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCount {
    status: InvoiceStatus,
    count: i64,
}

fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<InvoiceStatus>> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => InvoiceStatus::parse(value)
            .map(Some)
            .ok_or_else(|| AppError::validation("status", "Unknown invoice status")),
    }
}

impl InvoiceService {
    pub fn new(db: PgPool, terms: InvoiceConfig) -> Self {
        Self { db, terms }
    }

    pub async fn list(&self, query: ListInvoicesQuery) -> AppResult<InvoiceList> {
        let status = parse_status_filter(query.status.as_deref())?;
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR invoice_id ILIKE $2 OR reference_number ILIKE $2
                   OR product_name ILIKE $2 OR customer_name ILIKE $2)
            ORDER BY created_at DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(status)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        Ok(InvoiceList {
            count: invoices.len(),
            invoices,
        })
    }

    pub async fn search(&self, query: SearchInvoicesQuery) -> AppResult<InvoiceSearchResult> {
        let text = query.query.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(AppError::validation("query", "Search query is required"));
        }
        let status = parse_status_filter(query.status.as_deref())?;
        let pagination = Pagination::from_query(query.page, query.limit, 10);
        let pattern = like_pattern(text);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM invoices WHERE {} AND ($2::VARCHAR IS NULL OR status = $2)",
            SEARCH_PREDICATE
        ))
        .bind(&pattern)
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE {} AND ($2::VARCHAR IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            INVOICE_COLUMNS, SEARCH_PREDICATE
        ))
        .bind(&pattern)
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let counts = sqlx::query_as::<_, StatusCount>(&format!(
            "SELECT status, COUNT(*) AS count FROM invoices WHERE {} GROUP BY status",
            SEARCH_PREDICATE
        ))
        .bind(&pattern)
        .fetch_all(&self.db)
        .await?;

        let mut by_status: BTreeMap<String, i64> = InvoiceStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for row in counts {
            by_status.insert(row.status.to_string(), row.count);
        }

        Ok(InvoiceSearchResult {
            query: text.to_string(),
            invoices,
            pagination: PaginationMeta::new(pagination, u64::try_from(total).unwrap_or(0)),
            by_status,
        })
    }

    pub async fn stats(&self) -> AppResult<InvoiceStats> {
        let now = Utc::now();
        let stats = sqlx::query_as::<_, InvoiceStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE created_at >= $1) AS recent_invoices,
                COUNT(*) AS total_invoices,
                COUNT(*) FILTER (WHERE status <> 'unpaid') AS processed_invoices,
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'paid'), 0) AS paid_amount,
                COUNT(DISTINCT customer_name) FILTER (WHERE status = 'paid') AS paid_customers,
                COALESCE(SUM(total_amount) FILTER (WHERE status = 'unpaid'), 0) AS unpaid_amount,
                COUNT(*) FILTER (WHERE status = 'unpaid') AS unpaid_count,
                COUNT(*) FILTER (WHERE status = 'unpaid' AND due_date < $2) AS overdue_count
            FROM invoices
            "#,
        )
        .bind(now - Duration::days(7))
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }

    /// Unpaid invoices past their due date, oldest due first
    pub async fn overdue_report(&self) -> AppResult<OverdueReport> {
        let now = Utc::now();
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE status = $1 AND due_date < $2
            ORDER BY due_date ASC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(InvoiceStatus::Unpaid)
        .bind(now)
        .fetch_all(&self.db)
        .await?;

        let total_overdue_amount = invoices.iter().map(|i| i.total_amount).sum();
        let invoices: Vec<OverdueInvoice> = invoices
            .into_iter()
            .map(|invoice| OverdueInvoice {
                days_overdue: (now - invoice.due_date).num_days(),
                invoice,
            })
            .collect();

        Ok(OverdueReport {
            count: invoices.len(),
            invoices,
            total_overdue_amount,
        })
    }

    pub async fn get(&self, invoice_id: &str) -> AppResult<Invoice> {
        sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))
    }

    pub async fn view(&self, invoice_id: &str, business: &BusinessConfig) -> AppResult<InvoiceView> {
        let invoice = self.get(invoice_id).await?;
        let is_overdue = invoice.is_overdue(Utc::now());

        Ok(InvoiceView {
            header: InvoiceHeader {
                invoice_id: invoice.invoice_id.clone(),
                reference_number: invoice.reference_number.clone(),
                order_id: invoice.order_id.clone(),
                invoice_date: invoice.created_at,
                due_date: invoice.due_date,
                status: invoice.status,
            },
            business: business.clone(),
            customer: CustomerInfo {
                name: invoice.customer_name.clone(),
                email: invoice.customer_email.clone(),
                phone: invoice.customer_phone.clone(),
                address: String::new(),
            },
            totals: TaxBreakdown::compute(invoice.total_amount, self.terms.tax_rate_percent),
            line: InvoiceLine {
                product_id: invoice.product_id,
                product_name: invoice.product_name,
                quantity: invoice.quantity_ordered,
                unit_price: invoice.price_per_unit,
                amount: invoice.total_amount,
            },
            payment: PaymentInfo {
                status: invoice.status,
                paid_date: invoice.paid_date,
                is_overdue,
            },
            payment_terms: self.terms.payment_terms.clone(),
        })
    }

    /// One invoice per order, due a configured number of days after the order date
    pub async fn create_from_order(&self, input: CreateFromOrderInput) -> AppResult<Invoice> {
        let order_id = input
            .order_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::validation("order_id", "Order ID is required"))?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT invoice_id FROM invoices WHERE order_id = $1",
        )
        .bind(&order_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Invoice already exists for this order".to_string(),
            ));
        }

        let order = lock_order(&mut *tx, &order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices
                (invoice_id, reference_number, order_id, product_id, product_name,
                 customer_name, customer_email, customer_phone, quantity_ordered,
                 price_per_unit, total_amount, status, order_date, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(generate_invoice_id())
        .bind(generate_reference_number())
        .bind(&order.order_id)
        .bind(&order.product_id)
        .bind(&order.product_name)
        .bind(&order.customer_info.name)
        .bind(&order.customer_info.email)
        .bind(&order.customer_info.phone)
        .bind(order.quantity_ordered)
        .bind(order.price_per_unit)
        .bind(order.total_amount)
        .bind(InvoiceStatus::Unpaid)
        .bind(order.order_date)
        .bind(due_date(order.order_date, self.terms.due_days))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique(e, "order_id"))?;

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.invoice_id,
            order_id = %invoice.order_id,
            "Invoice created"
        );
        Ok(invoice)
    }

    pub async fn pay(&self, invoice_id: &str, input: PayInvoiceInput) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let invoice = lock_invoice(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;
        invoice
            .status
            .check_payable()
            .map_err(|e| AppError::InvalidStateTransition(e.to_string()))?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $2, paid_date = NOW(), notes = COALESCE($3, notes), updated_at = NOW()
            WHERE invoice_id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(InvoiceStatus::Paid)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(invoice_id = %invoice.invoice_id, "Invoice paid");
        Ok(invoice)
    }

    /// Return or cancel an unpaid invoice; its order is cancelled and the stock restored
    pub async fn return_or_cancel(
        &self,
        invoice_id: &str,
        input: VoidInvoiceInput,
    ) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let invoice = lock_invoice(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;
        let next = invoice
            .status
            .void(input.action)
            .map_err(|e| AppError::InvalidStateTransition(e.to_string()))?;

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET status = $2, notes = COALESCE($3, notes), updated_at = NOW()
            WHERE invoice_id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .bind(next)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        match lock_order(&mut *tx, &invoice.order_id).await? {
            Some(order) => {
                cancel_order(&mut *tx, &order, Utc::now().date_naive()).await?;
            }
            None => tracing::warn!(
                invoice_id = %invoice.invoice_id,
                order_id = %invoice.order_id,
                "Order missing for voided invoice"
            ),
        }

        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.invoice_id,
            status = invoice.status.as_str(),
            quantity = invoice.quantity_ordered,
            "Invoice voided and stock restored"
        );
        Ok(invoice)
    }
}

async fn lock_invoice(
    conn: &mut PgConnection,
    invoice_id: &str,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {} FROM invoices WHERE invoice_id = $1 FOR UPDATE",
        INVOICE_COLUMNS
    ))
    .bind(invoice_id)
    .fetch_optional(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("Paid")).unwrap(),
            Some(InvoiceStatus::Paid)
        );
        assert!(parse_status_filter(Some("settled")).is_err());
    }

    #[test]
    fn test_search_escapes_wildcards() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
    }

    #[test]
    fn test_void_input_defaults_to_cancel() {
        let input: VoidInvoiceInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.action, VoidAction::Cancel);
        let input: VoidInvoiceInput =
            serde_json::from_str(r#"{"action":"return","notes":"damaged"}"#).unwrap();
        assert_eq!(input.action, VoidAction::Return);
    }
}
