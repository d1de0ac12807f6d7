//! Periodic re-evaluation of product expiry and stock status

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::services::product::{persist_status, PRODUCT_COLUMNS};
use shared::models::{Availability, Product, ProductStatus, StatusEvaluation};

/// Outcome of one pass over the active products
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCheckSummary {
    pub checked: u32,
    pub updated: u32,
    pub expired: u32,
    pub out_of_stock: u32,
    pub low_stock: u32,
    pub checked_at: DateTime<Utc>,
}

impl StatusCheckSummary {
    fn new(checked_at: DateTime<Utc>) -> Self {
        Self {
            checked: 0,
            updated: 0,
            expired: 0,
            out_of_stock: 0,
            low_stock: 0,
            checked_at,
        }
    }

    /// State counters only move for products that transitioned this run
    fn count(&mut self, evaluation: StatusEvaluation, changed: bool) {
        self.checked += 1;
        if !changed {
            return;
        }
        self.updated += 1;
        match evaluation.availability {
            Availability::Expired => self.expired += 1,
            Availability::OutOfStock => self.out_of_stock += 1,
            Availability::LowStock => self.low_stock += 1,
            Availability::InStock => {}
        }
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    is_running: bool,
    last_run: Option<DateTime<Utc>>,
    last_summary: Option<StatusCheckSummary>,
}

#[derive(Debug, Serialize)]
pub struct MonitorStatus {
    pub is_running: bool,
    pub has_task: bool,
    pub message: String,
    pub interval_secs: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_summary: Option<StatusCheckSummary>,
}

/// Product without its cost price, as listed by status
#[derive(Debug, Serialize)]
pub struct StatusListedProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub selling_price: Decimal,
    pub quantity: i32,
    pub unit: String,
    pub threshold_value: i32,
    pub expiry_date: NaiveDate,
    pub availability: Availability,
    pub status: ProductStatus,
    pub last_status_check: DateTime<Utc>,
}

impl From<Product> for StatusListedProduct {
    fn from(p: Product) -> Self {
        Self {
            product_id: p.product_id,
            product_name: p.product_name,
            category: p.category,
            selling_price: p.selling_price,
            quantity: p.quantity,
            unit: p.unit,
            threshold_value: p.threshold_value,
            expiry_date: p.expiry_date,
            availability: p.availability,
            status: p.status,
            last_status_check: p.last_status_check,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsByStatus {
    pub status: String,
    pub count: usize,
    pub products: Vec<StatusListedProduct>,
}

/// Background job that keeps derived product status current
#[derive(Clone)]
pub struct StatusMonitor {
    db: PgPool,
    interval: Duration,
    state: Arc<RwLock<MonitorState>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StatusMonitor {
    pub fn new(db: PgPool, interval: Duration) -> Self {
        Self {
            db,
            interval,
            state: Arc::new(RwLock::new(MonitorState::default())),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the interval loop; the first check runs immediately
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            tracing::debug!("Status monitor already running");
            return;
        }

        self.state.write().await.is_running = true;
        let monitor = self.clone();
        *task = Some(tokio::spawn(async move { monitor.run().await }));
        tracing::info!(interval_secs = self.interval.as_secs(), "Status monitor started");
    }

    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        self.state.write().await.is_running = false;
        tracing::info!("Status monitor stopped");
    }

    async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.trigger().await {
                tracing::error!(error = %e, "Product status check failed");
            }
        }
    }

    /// Run one check now and remember its summary
    pub async fn trigger(&self) -> AppResult<StatusCheckSummary> {
        let summary = self.check_product_status(Utc::now().date_naive()).await?;

        let mut state = self.state.write().await;
        state.last_run = Some(summary.checked_at);
        state.last_summary = Some(summary.clone());
        Ok(summary)
    }

    /// Re-derive status for every active product, writing only the ones that changed
    pub async fn check_product_status(&self, today: NaiveDate) -> AppResult<StatusCheckSummary> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE status = $1",
            PRODUCT_COLUMNS
        ))
        .bind(ProductStatus::Active)
        .fetch_all(&self.db)
        .await?;

        let mut summary = StatusCheckSummary::new(Utc::now());
        let mut conn = self.db.acquire().await?;

        for product in &products {
            let evaluation = product.evaluate(today);
            let changed = evaluation.status != product.status
                || evaluation.availability != product.availability;

            if changed {
                if let Err(e) = persist_status(&mut *conn, product, today).await {
                    tracing::error!(
                        product_id = %product.product_id,
                        error = %e,
                        "Failed to store product status"
                    );
                    summary.count(evaluation, false);
                    continue;
                }
                tracing::debug!(
                    product_id = %product.product_id,
                    availability = %evaluation.availability,
                    "Product status changed"
                );
            }
            summary.count(evaluation, changed);
        }

        tracing::info!(
            checked = summary.checked,
            updated = summary.updated,
            expired = summary.expired,
            out_of_stock = summary.out_of_stock,
            low_stock = summary.low_stock,
            "Product status check completed"
        );
        Ok(summary)
    }

    pub async fn status(&self) -> MonitorStatus {
        let has_task = self
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_finished());
        let state = self.state.read().await;
        let is_running = state.is_running && has_task;

        MonitorStatus {
            is_running,
            has_task,
            message: if is_running {
                "Product status monitor is running".to_string()
            } else {
                "Product status monitor is stopped".to_string()
            },
            interval_secs: self.interval.as_secs(),
            last_run: state.last_run,
            last_summary: state.last_summary.clone(),
        }
    }

    /// Products in one availability state; accepts `expired`, `low-stock`, `out-of-stock`, `in-stock`
    pub async fn products_by_availability(&self, slug: &str) -> AppResult<ProductsByStatus> {
        let availability = Availability::from_slug(slug).ok_or_else(|| {
            AppError::validation(
                "status",
                "Status must be one of expired, low-stock, out-of-stock, in-stock",
            )
        })?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE availability = $1 ORDER BY last_status_check DESC",
            PRODUCT_COLUMNS
        ))
        .bind(availability)
        .fetch_all(&self.db)
        .await?;

        let products: Vec<StatusListedProduct> = products.into_iter().map(Into::into).collect();
        Ok(ProductsByStatus {
            status: slug.to_string(),
            count: products.len(),
            products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(availability: Availability) -> StatusEvaluation {
        StatusEvaluation {
            status: if availability == Availability::Expired {
                ProductStatus::Expired
            } else {
                ProductStatus::Active
            },
            availability,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = StatusCheckSummary::new(Utc::now());
        summary.count(eval(Availability::Expired), true);
        summary.count(eval(Availability::LowStock), true);
        summary.count(eval(Availability::OutOfStock), true);
        summary.count(eval(Availability::InStock), true);

        assert_eq!(summary.checked, 4);
        assert_eq!(summary.updated, 4);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.low_stock, 1);
        assert_eq!(summary.out_of_stock, 1);
    }

    #[test]
    fn test_unchanged_products_only_count_as_checked() {
        let mut summary = StatusCheckSummary::new(Utc::now());
        summary.count(eval(Availability::LowStock), false);
        summary.count(eval(Availability::OutOfStock), false);
        summary.count(eval(Availability::Expired), false);

        assert_eq!(summary.checked, 3);
        assert_eq!(summary.updated, 0);
        assert_eq!(summary.low_stock, 0);
        assert_eq!(summary.out_of_stock, 0);
        assert_eq!(summary.expired, 0);
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = MonitorState::default();
        assert!(!state.is_running);
        assert!(state.last_run.is_none());
        assert!(state.last_summary.is_none());
    }
}
