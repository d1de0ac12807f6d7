//! Invoice models and payment lifecycle

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_DUE_DAYS: i64 = 15;

/// Invoice payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Unpaid,
    Cancelled,
    Returned,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Paid,
        InvoiceStatus::Unpaid,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Returned => "returned",
        }
    }

    /// Accepts both the display form (`Paid`) and the stored form (`paid`)
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == lower)
    }

    pub fn is_voided(&self) -> bool {
        matches!(self, InvoiceStatus::Cancelled | InvoiceStatus::Returned)
    }

    pub fn check_payable(self) -> Result<(), InvoiceTransitionError> {
        match self {
            InvoiceStatus::Unpaid => Ok(()),
            InvoiceStatus::Paid => Err(InvoiceTransitionError::AlreadyPaid),
            voided => Err(InvoiceTransitionError::PayVoided(voided)),
        }
    }

    /// Status after a return or cancel request
    pub fn void(self, action: VoidAction) -> Result<InvoiceStatus, InvoiceTransitionError> {
        match self {
            InvoiceStatus::Paid => Err(InvoiceTransitionError::VoidPaid),
            InvoiceStatus::Unpaid => Ok(match action {
                VoidAction::Return => InvoiceStatus::Returned,
                VoidAction::Cancel => InvoiceStatus::Cancelled,
            }),
            voided => Err(InvoiceTransitionError::AlreadyVoided(voided)),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Cancelled => "Cancelled",
            InvoiceStatus::Returned => "Returned",
        };
        f.write_str(label)
    }
}

/// Requested way of voiding an unpaid invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoidAction {
    Return,
    #[default]
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvoiceTransitionError {
    #[error("Invoice is already paid")]
    AlreadyPaid,
    #[error("Cannot pay a {} invoice", .0.as_str())]
    PayVoided(InvoiceStatus),
    #[error("Cannot return/cancel a paid invoice")]
    VoidPaid,
    #[error("Invoice is already {}", .0.as_str())]
    AlreadyVoided(InvoiceStatus),
}

/// Invoice generated from an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_id: String,
    pub reference_number: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub quantity_ordered: i32,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub order_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Unpaid && self.due_date < now
    }
}

pub fn due_date(order_date: DateTime<Utc>, due_days: i64) -> DateTime<Utc> {
    order_date + Duration::days(due_days)
}

/// Subtotal, tax and amount due for a printable invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_due: Decimal,
}

impl TaxBreakdown {
    /// `rate_percent` is a whole percentage such as 15
    pub fn compute(subtotal: Decimal, rate_percent: Decimal) -> Self {
        let tax_rate = rate_percent / Decimal::ONE_HUNDRED;
        let cents = |value: Decimal| {
            value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        };
        Self {
            subtotal,
            tax_rate,
            tax_amount: cents(subtotal * tax_rate),
            total_due: cents(subtotal * (Decimal::ONE + tax_rate)),
        }
    }
}
