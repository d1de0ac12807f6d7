//! Product catalog models and stock status derivation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived stock state shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
pub enum Availability {
    #[serde(rename = "In stock")]
    InStock,
    #[serde(rename = "Low stock")]
    LowStock,
    #[serde(rename = "Out of stock")]
    OutOfStock,
    #[serde(rename = "Expired")]
    Expired,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::InStock => "in_stock",
            Availability::LowStock => "low_stock",
            Availability::OutOfStock => "out_of_stock",
            Availability::Expired => "expired",
        }
    }

    /// Parse the dashed form used in URLs (`low-stock`, `in-stock`, ...)
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.to_ascii_lowercase().as_str() {
            "in-stock" => Some(Availability::InStock),
            "low-stock" => Some(Availability::LowStock),
            "out-of-stock" => Some(Availability::OutOfStock),
            "expired" => Some(Availability::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::InStock => write!(f, "In stock"),
            Availability::LowStock => write!(f, "Low stock"),
            Availability::OutOfStock => write!(f, "Out of stock"),
            Availability::Expired => write!(f, "Expired"),
        }
    }
}

/// Lifecycle status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "VARCHAR", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Active,
    Expired,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Expired => "expired",
        }
    }
}

/// Result of re-deriving a product's status fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEvaluation {
    pub status: ProductStatus,
    pub availability: Availability,
}

/// Stock availability ignoring expiry
pub fn stock_availability(quantity: i32, threshold: i32) -> Availability {
    if quantity <= 0 {
        Availability::OutOfStock
    } else if quantity <= threshold {
        Availability::LowStock
    } else {
        Availability::InStock
    }
}

/// Derive status and availability; expiry is compared by calendar date only
pub fn evaluate_status(
    quantity: i32,
    threshold: i32,
    expiry_date: NaiveDate,
    today: NaiveDate,
) -> StatusEvaluation {
    if expiry_date < today {
        StatusEvaluation {
            status: ProductStatus::Expired,
            availability: Availability::Expired,
        }
    } else {
        StatusEvaluation {
            status: ProductStatus::Active,
            availability: stock_availability(quantity, threshold),
        }
    }
}

/// A catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub quantity: i32,
    pub unit: String,
    pub expiry_date: NaiveDate,
    pub threshold_value: i32,
    pub availability: Availability,
    pub status: ProductStatus,
    pub last_status_check: DateTime<Utc>,
    pub image_url: Option<String>,
    pub average_rating: Decimal,
    pub total_ratings: i32,
    pub rating_sum: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether an order may be placed against this product right now
    pub fn is_orderable(&self) -> bool {
        self.status == ProductStatus::Active
            && !matches!(
                self.availability,
                Availability::OutOfStock | Availability::Expired
            )
            && self.quantity > 0
    }

    /// Check a requested quantity against the current stock
    pub fn check_availability(&self, requested: i32) -> Result<(), StockRejection> {
        if self.status != ProductStatus::Active {
            return Err(StockRejection::Inactive);
        }
        if self.availability == Availability::Expired {
            return Err(StockRejection::Expired);
        }
        if self.availability == Availability::OutOfStock || self.quantity <= 0 {
            return Err(StockRejection::OutOfStock);
        }
        if requested > self.quantity {
            return Err(StockRejection::Insufficient {
                available: self.quantity,
            });
        }
        Ok(())
    }

    pub fn evaluate(&self, today: NaiveDate) -> StatusEvaluation {
        evaluate_status(self.quantity, self.threshold_value, self.expiry_date, today)
    }
}

/// Why a product cannot satisfy an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StockRejection {
    #[error("Product is not available for ordering")]
    Inactive,
    #[error("Product has expired and cannot be ordered")]
    Expired,
    #[error("Product is out of stock")]
    OutOfStock,
    #[error("Only {available} units available. Please order accordingly.")]
    Insufficient { available: i32 },
}

impl StockRejection {
    pub fn available_quantity(&self) -> i32 {
        match self {
            StockRejection::Insufficient { available } => *available,
            _ => 0,
        }
    }
}

/// Running rating aggregate stored on a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RatingAggregate {
    pub rating_sum: i32,
    pub total_ratings: i32,
    pub average_rating: Decimal,
}

impl RatingAggregate {
    /// Fold one more 1-5 rating in; the average keeps one decimal place
    pub fn record(self, rating: i32) -> Self {
        let rating_sum = self.rating_sum + rating;
        let total_ratings = self.total_ratings + 1;
        Self {
            rating_sum,
            total_ratings,
            average_rating: average_rating(rating_sum, total_ratings),
        }
    }
}

/// Average rounded half away from zero to one decimal place
pub fn average_rating(rating_sum: i32, total_ratings: i32) -> Decimal {
    if total_ratings <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(rating_sum) / Decimal::from(total_ratings))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_quantity_is_out_of_stock_even_with_zero_threshold() {
        assert_eq!(stock_availability(0, 0), Availability::OutOfStock);
    }

    #[test]
    fn test_threshold_boundary_is_low_stock() {
        assert_eq!(stock_availability(5, 5), Availability::LowStock);
        assert_eq!(stock_availability(6, 5), Availability::InStock);
    }

    #[test]
    fn test_expiring_today_is_still_active() {
        let today = date(2025, 8, 25);
        let eval = evaluate_status(10, 2, today, today);
        assert_eq!(eval.status, ProductStatus::Active);
        assert_eq!(eval.availability, Availability::InStock);
    }

    #[test]
    fn test_expired_yesterday_overrides_stock() {
        let eval = evaluate_status(100, 2, date(2025, 8, 24), date(2025, 8, 25));
        assert_eq!(eval.status, ProductStatus::Expired);
        assert_eq!(eval.availability, Availability::Expired);
    }

    #[test]
    fn test_average_rating_rounding() {
        assert_eq!(average_rating(9, 2), Decimal::new(45, 1));
        assert_eq!(average_rating(10, 3), Decimal::new(33, 1));
        assert_eq!(average_rating(0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_rating_aggregate_record() {
        let agg = RatingAggregate::default().record(5).record(4);
        assert_eq!(agg.rating_sum, 9);
        assert_eq!(agg.total_ratings, 2);
        assert_eq!(agg.average_rating, Decimal::new(45, 1));
    }

    #[test]
    fn test_slug_parsing() {
        assert_eq!(Availability::from_slug("Low-Stock"), Some(Availability::LowStock));
        assert_eq!(Availability::from_slug("sold-out"), None);
    }

    #[test]
    fn test_availability_json_labels() {
        let json = serde_json::to_string(&Availability::OutOfStock).unwrap();
        assert_eq!(json, "\"Out of stock\"");
    }
}
