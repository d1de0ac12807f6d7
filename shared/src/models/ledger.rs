//! Sales and purchase ledger entries feeding the analytics rollups

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Purchase,
    Sale,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Purchase => "purchase",
            LedgerEntryType::Sale => "sale",
        }
    }
}

/// Where a ledger entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    SingleProduct,
    BulkUpload,
    Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_date: DateTime<Utc>,
    pub entry_type: LedgerEntryType,
    pub amount: Decimal,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub order_id: Option<String>,
    pub source: LedgerSource,
    pub created_at: DateTime<Utc>,
}

/// Values for a new ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub entry_type: LedgerEntryType,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub order_id: Option<String>,
    pub source: LedgerSource,
}

impl NewLedgerEntry {
    pub fn purchase(
        product_id: &str,
        product_name: &str,
        quantity: i32,
        cost_price: Decimal,
        source: LedgerSource,
    ) -> Self {
        Self {
            entry_type: LedgerEntryType::Purchase,
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            quantity,
            unit_price: cost_price,
            order_id: None,
            source,
        }
    }

    pub fn sale(
        order_id: &str,
        product_id: &str,
        product_name: &str,
        quantity: i32,
        price_per_unit: Decimal,
    ) -> Self {
        Self {
            entry_type: LedgerEntryType::Sale,
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            quantity,
            unit_price: price_per_unit,
            order_id: Some(order_id.to_string()),
            source: LedgerSource::Order,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
