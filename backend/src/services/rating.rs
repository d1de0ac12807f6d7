//! Direct product ratings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::product::{lock_product, store_rating};
use shared::models::RatingAggregate;
use shared::validation::validate_rating;

/// Rating service
#[derive(Clone)]
pub struct RatingService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct RateProductInput {
    pub product_id: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProductRating {
    pub product_id: String,
    pub product_name: String,
    pub average_rating: Decimal,
    pub total_ratings: i32,
}

impl RatingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Fold a rating into the product aggregates without creating an order
    pub async fn rate_product(&self, input: RateProductInput) -> AppResult<ProductRating> {
        let product_id = input
            .product_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::validation("product_id", "Product ID is required"))?;
        let rating = input
            .rating
            .ok_or_else(|| AppError::validation("rating", "Rating is required"))?;
        validate_rating(rating).map_err(|m| AppError::validation("rating", m))?;

        let mut tx = self.db.begin().await?;

        let product = lock_product(&mut *tx, &product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let aggregate = RatingAggregate {
            rating_sum: product.rating_sum,
            total_ratings: product.total_ratings,
            average_rating: product.average_rating,
        }
        .record(rating);
        let product = store_rating(&mut *tx, &product.product_id, aggregate)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        tx.commit().await?;

        tracing::debug!(
            product_id = %product.product_id,
            rating,
            average = %product.average_rating,
            "Product rated"
        );

        Ok(ProductRating {
            product_id: product.product_id,
            product_name: product.product_name,
            average_rating: product.average_rating,
            total_ratings: product.total_ratings,
        })
    }
}
