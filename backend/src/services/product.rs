//! Product catalog service

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::ids::generate_product_id;
use shared::models::{evaluate_status, LedgerSource, NewLedgerEntry, Product, RatingAggregate};
use shared::types::{Pagination, PaginationMeta};
use shared::validation::{parse_short_date, validate_price, validate_stock_count};

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, product_id, product_name, category, description, cost_price, selling_price,
    quantity, unit, expiry_date, threshold_value, availability, status, last_status_check,
    image_url, average_rating, total_ratings, rating_sum, created_at, updated_at
"#;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product from JSON
#[derive(Debug, Default, Deserialize)]
pub struct CreateProductInput {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    /// `DD/MM/YY`
    pub expiry_date: Option<String>,
    pub threshold_value: Option<i32>,
    pub image_url: Option<String>,
}

/// Partial update of editable fields
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    /// `DD/MM/YY`
    pub expiry_date: Option<String>,
    pub threshold_value: Option<i32>,
    pub image_url: Option<String>,
}

/// A validated product ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
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
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProductSearchResult {
    pub query: String,
    pub products: Vec<Product>,
    pub pagination: PaginationMeta,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateProductInput {
    /// Check required fields and formats; quantity defaults to 1
    pub fn into_new_product(self) -> AppResult<NewProduct> {
        let product_name = non_blank(self.product_name);
        let category = non_blank(self.category);
        let unit = non_blank(self.unit);
        let expiry = non_blank(self.expiry_date);

        let (
            Some(product_name),
            Some(category),
            Some(cost_price),
            Some(selling_price),
            Some(unit),
            Some(expiry),
            Some(threshold_value),
        ) = (
            product_name,
            category,
            self.cost_price,
            self.selling_price,
            unit,
            expiry,
            self.threshold_value,
        )
        else {
            return Err(AppError::ValidationError(
                "Missing required fields: product_name, category, cost_price, selling_price, \
                 unit, expiry_date (DD/MM/YY), and threshold_value are required"
                    .to_string(),
            ));
        };

        let expiry_date = parse_short_date(&expiry)
            .map_err(|e| AppError::validation("expiry_date", format!("Date error: {}", e)))?;
        let quantity = self.quantity.unwrap_or(1);

        validate_price(cost_price).map_err(|m| AppError::validation("cost_price", m))?;
        validate_price(selling_price).map_err(|m| AppError::validation("selling_price", m))?;
        validate_stock_count(quantity).map_err(|m| AppError::validation("quantity", m))?;
        validate_stock_count(threshold_value)
            .map_err(|m| AppError::validation("threshold_value", m))?;

        Ok(NewProduct {
            product_id: non_blank(self.product_id)
                .unwrap_or_else(|| generate_product_id(Utc::now())),
            product_name,
            category,
            description: self.description.unwrap_or_default().trim().to_string(),
            cost_price,
            selling_price,
            quantity,
            unit,
            expiry_date,
            threshold_value,
            image_url: non_blank(self.image_url),
        })
    }
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern
pub(crate) fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product and record its purchase in the ledger
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        let new_product = input.into_new_product()?;
        let product = self
            .insert_with_purchase(&new_product, LedgerSource::SingleProduct)
            .await?;

        tracing::info!(
            product_id = %product.product_id,
            quantity = product.quantity,
            "Product created"
        );
        Ok(product)
    }

    /// Insert a product; a failed ledger write is logged and does not undo the product
    pub async fn insert_with_purchase(
        &self,
        new_product: &NewProduct,
        source: LedgerSource,
    ) -> AppResult<Product> {
        let mut conn = self.db.acquire().await?;
        let product = insert_product(&mut *conn, new_product, Utc::now().date_naive())
            .await
            .map_err(|e| AppError::from_unique(e, "product_id"))?;
        drop(conn);

        let purchase = NewLedgerEntry::purchase(
            &product.product_id,
            &product.product_name,
            product.quantity,
            product.cost_price,
            source,
        );
        if let Err(e) = LedgerService::new(self.db.clone()).record(&purchase).await {
            tracing::error!(
                product_id = %product.product_id,
                error = %e,
                "Failed to record purchase"
            );
        }

        Ok(product)
    }

    pub async fn get(&self, product_id: &str) -> AppResult<Product> {
        let mut conn = self.db.acquire().await?;
        find_product(&mut *conn, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn list_all(&self) -> AppResult<ProductList> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(ProductList {
            count: products.len(),
            products,
        })
    }

    /// Case-insensitive substring search over text, numeric and date fields
    pub async fn search(&self, query: &str, pagination: Pagination) -> AppResult<ProductSearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("query", "Search query is required"));
        }
        let pattern = like_pattern(query);

        let filter = r#"
            product_id ILIKE $1
            OR product_name ILIKE $1
            OR category ILIKE $1
            OR description ILIKE $1
            OR unit ILIKE $1
            OR status ILIKE $1
            OR availability ILIKE $1
            OR REPLACE(availability, '_', ' ') ILIKE $1
            OR CAST(cost_price AS TEXT) ILIKE $1
            OR CAST(selling_price AS TEXT) ILIKE $1
            OR CAST(quantity AS TEXT) ILIKE $1
            OR CAST(threshold_value AS TEXT) ILIKE $1
            OR TO_CHAR(expiry_date, 'DD/MM/YYYY') ILIKE $1
            OR TO_CHAR(expiry_date, 'YYYY-MM-DD') ILIKE $1
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products WHERE {}",
            filter
        ))
        .bind(&pattern)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            PRODUCT_COLUMNS, filter
        ))
        .bind(&pattern)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(ProductSearchResult {
            query: query.to_string(),
            products,
            pagination: PaginationMeta::new(pagination, u64::try_from(total).unwrap_or(0)),
        })
    }

    /// Apply a partial update and re-derive status fields
    pub async fn update(&self, product_id: &str, input: UpdateProductInput) -> AppResult<Product> {
        let mut product = self.get(product_id).await?;

        if let Some(name) = non_blank(input.product_name) {
            product.product_name = name;
        }
        if let Some(category) = non_blank(input.category) {
            product.category = category;
        }
        if let Some(description) = input.description {
            product.description = description.trim().to_string();
        }
        if let Some(unit) = non_blank(input.unit) {
            product.unit = unit;
        }
        if let Some(cost_price) = input.cost_price {
            validate_price(cost_price).map_err(|m| AppError::validation("cost_price", m))?;
            product.cost_price = cost_price;
        }
        if let Some(selling_price) = input.selling_price {
            validate_price(selling_price).map_err(|m| AppError::validation("selling_price", m))?;
            product.selling_price = selling_price;
        }
        if let Some(quantity) = input.quantity {
            validate_stock_count(quantity).map_err(|m| AppError::validation("quantity", m))?;
            product.quantity = quantity;
        }
        if let Some(threshold) = input.threshold_value {
            validate_stock_count(threshold)
                .map_err(|m| AppError::validation("threshold_value", m))?;
            product.threshold_value = threshold;
        }
        if let Some(expiry) = non_blank(input.expiry_date) {
            product.expiry_date = parse_short_date(&expiry)
                .map_err(|e| AppError::validation("expiry_date", format!("Date error: {}", e)))?;
        }
        if let Some(image_url) = input.image_url {
            product.image_url = non_blank(Some(image_url));
        }

        let eval = product.evaluate(Utc::now().date_naive());

        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET product_name = $2, category = $3, description = $4, cost_price = $5,
                selling_price = $6, quantity = $7, unit = $8, expiry_date = $9,
                threshold_value = $10, image_url = $11, availability = $12, status = $13,
                last_status_check = NOW(), updated_at = NOW()
            WHERE product_id = $1
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(&product.product_name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.cost_price)
        .bind(product.selling_price)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(product.expiry_date)
        .bind(product.threshold_value)
        .bind(&product.image_url)
        .bind(eval.availability)
        .bind(eval.status)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(updated)
    }

    pub async fn delete(&self, product_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        tracing::info!(product_id = %product_id, "Product deleted");
        Ok(())
    }

    /// Lower-cased names from `names` that already exist in the catalog
    pub async fn existing_names(&self, names: &[String]) -> AppResult<HashSet<String>> {
        if names.is_empty() {
            return Ok(HashSet::new());
        }
        let lowered: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        let found = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT LOWER(product_name) FROM products WHERE LOWER(product_name) = ANY($1)",
        )
        .bind(&lowered)
        .fetch_all(&self.db)
        .await?;

        Ok(found.into_iter().collect())
    }

    /// Product ids from `ids` that are already taken
    pub async fn existing_ids(&self, ids: &[String]) -> AppResult<HashSet<String>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found = sqlx::query_scalar::<_, String>(
            "SELECT product_id FROM products WHERE product_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(found.into_iter().collect())
    }
}

pub(crate) async fn find_product(
    conn: &mut PgConnection,
    product_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE product_id = $1",
        PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .fetch_optional(conn)
    .await
}

/// Load a product and hold its row lock until the transaction ends
pub(crate) async fn lock_product(
    conn: &mut PgConnection,
    product_id: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE product_id = $1 FOR UPDATE",
        PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .fetch_optional(conn)
    .await
}

/// Store new rating aggregates on a product
pub(crate) async fn store_rating(
    conn: &mut PgConnection,
    product_id: &str,
    aggregate: RatingAggregate,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET rating_sum = $2, total_ratings = $3, average_rating = $4, updated_at = NOW()
        WHERE product_id = $1
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .bind(aggregate.rating_sum)
    .bind(aggregate.total_ratings)
    .bind(aggregate.average_rating)
    .fetch_optional(conn)
    .await
}

pub(crate) async fn insert_product(
    conn: &mut PgConnection,
    product: &NewProduct,
    today: NaiveDate,
) -> Result<Product, sqlx::Error> {
    let eval = evaluate_status(
        product.quantity,
        product.threshold_value,
        product.expiry_date,
        today,
    );

    sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products
            (product_id, product_name, category, description, cost_price, selling_price,
             quantity, unit, expiry_date, threshold_value, image_url, availability, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(&product.product_id)
    .bind(&product.product_name)
    .bind(&product.category)
    .bind(&product.description)
    .bind(product.cost_price)
    .bind(product.selling_price)
    .bind(product.quantity)
    .bind(&product.unit)
    .bind(product.expiry_date)
    .bind(product.threshold_value)
    .bind(&product.image_url)
    .bind(eval.availability)
    .bind(eval.status)
    .fetch_one(conn)
    .await
}

/// Add `delta` units (negative to take stock) and re-derive status fields.
///
/// Taking stock only succeeds while enough units remain; `None` means the
/// product is missing or the guard failed.
pub(crate) async fn adjust_stock(
    conn: &mut PgConnection,
    product_id: &str,
    delta: i32,
    today: NaiveDate,
) -> Result<Option<Product>, sqlx::Error> {
    let adjusted = sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET quantity = quantity + $2, updated_at = NOW()
        WHERE product_id = $1 AND quantity + $2 >= 0
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(product_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await?;

    match adjusted {
        Some(product) => Ok(Some(persist_status(conn, &product, today).await?)),
        None => Ok(None),
    }
}

/// Write freshly derived status and availability back to the row
pub(crate) async fn persist_status(
    conn: &mut PgConnection,
    product: &Product,
    today: NaiveDate,
) -> Result<Product, sqlx::Error> {
    let eval = product.evaluate(today);
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET availability = $2, status = $3, last_status_check = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    ))
    .bind(product.id)
    .bind(eval.availability)
    .bind(eval.status)
    .fetch_one(conn)
    .await
}
