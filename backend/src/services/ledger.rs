//! Sales/purchase ledger backing the analytics rollups

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::AppResult;
use shared::analytics::LedgerPoint;
use shared::models::{LedgerEntry, LedgerEntryType, NewLedgerEntry};

/// Ledger service
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

impl LedgerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an entry outside of any transaction
    pub async fn record(&self, entry: &NewLedgerEntry) -> AppResult<LedgerEntry> {
        let mut conn = self.db.acquire().await?;
        Ok(insert_entry(&mut *conn, entry).await?)
    }

    /// Entries with `start <= entry_date < end`, oldest first
    pub async fn entries_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, entry_date, entry_type, amount, product_id, product_name,
                   quantity, unit_price, order_id, source, created_at
            FROM ledger_entries
            WHERE entry_date >= $1 AND entry_date < $2
            ORDER BY entry_date
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    pub async fn points_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<LedgerPoint>> {
        Ok(self
            .entries_between(start, end)
            .await?
            .iter()
            .map(to_point)
            .collect())
    }
}

pub fn to_point(entry: &LedgerEntry) -> LedgerPoint {
    LedgerPoint {
        at: entry.entry_date,
        entry_type: entry.entry_type,
        amount: entry.amount,
    }
}

/// Insert a ledger row on an existing connection or transaction
pub async fn insert_entry(
    conn: &mut PgConnection,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO ledger_entries
            (entry_type, amount, product_id, product_name, quantity, unit_price, order_id, source)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, entry_date, entry_type, amount, product_id, product_name,
                  quantity, unit_price, order_id, source, created_at
        "#,
    )
    .bind(entry.entry_type)
    .bind(entry.amount())
    .bind(&entry.product_id)
    .bind(&entry.product_name)
    .bind(entry.quantity)
    .bind(entry.unit_price)
    .bind(&entry.order_id)
    .bind(entry.source)
    .fetch_one(conn)
    .await
}

/// Drop the sale recorded for an order; returns the number of rows removed
pub async fn delete_sale_for_order(
    conn: &mut PgConnection,
    order_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ledger_entries WHERE order_id = $1 AND entry_type = $2")
        .bind(order_id)
        .bind(LedgerEntryType::Sale)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
