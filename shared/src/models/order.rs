//! Order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const GUEST_CUSTOMER: &str = "Guest Customer";

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Check a status change and report whether stock must be returned
    pub fn transition(self, next: OrderStatus) -> Result<StatusChange, OrderTransitionError> {
        match (self, next) {
            (OrderStatus::Cancelled, OrderStatus::Cancelled) => Ok(StatusChange::Unchanged),
            (OrderStatus::Cancelled, _) => Err(OrderTransitionError::LeavingCancelled),
            (_, OrderStatus::Cancelled) => Ok(StatusChange::Cancelled),
            (from, to) if from == to => Ok(StatusChange::Unchanged),
            _ => Ok(StatusChange::Updated),
        }
    }
}

/// Effect of an accepted status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Updated,
    /// Stock goes back to the product and the sale leaves the ledger
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderTransitionError {
    #[error("A cancelled order cannot be reopened")]
    LeavingCancelled,
}

/// Customer details captured with an order, stored as `customer_*` columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerInfo {
    #[serde(default = "default_customer_name")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_name"))]
    pub name: String,
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_email"))]
    pub email: String,
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_phone"))]
    pub phone: String,
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "customer_address"))]
    pub address: String,
}

fn default_customer_name() -> String {
    GUEST_CUSTOMER.to_string()
}

impl Default for CustomerInfo {
    fn default() -> Self {
        Self {
            name: default_customer_name(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
        }
    }
}

impl CustomerInfo {
    /// Blank names fall back to the guest placeholder
    pub fn normalized(mut self) -> Self {
        if self.name.trim().is_empty() {
            self.name = default_customer_name();
        }
        self
    }
}

/// A customer order for a single product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity_ordered: i32,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub order_status: OrderStatus,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub customer_info: CustomerInfo,
    pub order_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub rating: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order total from the unit price snapshot
pub fn order_total(price_per_unit: Decimal, quantity_ordered: i32) -> Decimal {
    price_per_unit * Decimal::from(quantity_ordered)
}
