//! Order placement and lifecycle service

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};
use crate::services::ledger::{delete_sale_for_order, insert_entry};
use crate::services::product::{adjust_stock, lock_product, store_rating};
use shared::ids::generate_order_id;
use shared::models::{
    Availability, CustomerInfo, NewLedgerEntry, Order, OrderStatus, Product, ProductStatus,
    RatingAggregate, StatusChange, StockRejection,
};
use shared::types::{Pagination, PaginationMeta};
use shared::validation::{validate_order_quantity, validate_rating};

pub(crate) const ORDER_COLUMNS: &str = r#"
    id, order_id, product_id, product_name, quantity_ordered, price_per_unit, total_amount,
    order_status, customer_name, customer_email, customer_phone, customer_address,
    order_date, notes, rating, review, created_at, updated_at
"#;

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Product details shown on the order form
#[derive(Debug, Serialize)]
pub struct OrderableProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub selling_price: Decimal,
    pub quantity: i32,
    pub unit: String,
    pub availability: Availability,
    pub status: ProductStatus,
    pub expiry_date: NaiveDate,
    pub image_url: Option<String>,
    pub average_rating: Decimal,
    pub total_ratings: i32,
    pub is_available: bool,
}

impl From<Product> for OrderableProduct {
    fn from(p: Product) -> Self {
        let is_available = p.is_orderable();
        Self {
            product_id: p.product_id,
            product_name: p.product_name,
            category: p.category,
            description: p.description,
            selling_price: p.selling_price,
            quantity: p.quantity,
            unit: p.unit,
            availability: p.availability,
            status: p.status,
            expiry_date: p.expiry_date,
            image_url: p.image_url,
            average_rating: p.average_rating,
            total_ratings: p.total_ratings,
            is_available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityInput {
    pub product_id: String,
    pub requested_quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub product_id: String,
    pub product_name: String,
    pub requested_quantity: i32,
    pub available_quantity: i32,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderInput {
    pub product_id: String,
    pub quantity_ordered: i32,
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
}

#[derive(Debug, Serialize)]
pub struct StockAfterOrder {
    pub product_id: String,
    pub product_name: String,
    pub remaining_quantity: i32,
    pub availability: Availability,
    pub average_rating: Decimal,
    pub total_ratings: i32,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub updated_product: StockAfterOrder,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: Option<String>,
}

fn rejection_error(rejection: StockRejection) -> AppError {
    AppError::InsufficientStock {
        message: rejection.to_string(),
        available: rejection.available_quantity(),
    }
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn product_for_order(&self, product_id: &str) -> AppResult<OrderableProduct> {
        let product = crate::services::ProductService::new(self.db.clone())
            .get(product_id)
            .await?;
        Ok(product.into())
    }

    pub async fn check_availability(
        &self,
        input: CheckAvailabilityInput,
    ) -> AppResult<AvailabilityCheck> {
        validate_order_quantity(input.requested_quantity)
            .map_err(|m| AppError::validation("requested_quantity", m))?;

        let product = crate::services::ProductService::new(self.db.clone())
            .get(&input.product_id)
            .await?;
        product
            .check_availability(input.requested_quantity)
            .map_err(rejection_error)?;

        Ok(AvailabilityCheck {
            available: true,
            product_id: product.product_id,
            product_name: product.product_name,
            requested_quantity: input.requested_quantity,
            available_quantity: product.quantity,
            price_per_unit: product.selling_price,
            total_amount: shared::models::order_total(
                product.selling_price,
                input.requested_quantity,
            ),
        })
    }

    /// Create an order, take the stock, fold in the rating and record the sale
    pub async fn place_order(&self, input: PlaceOrderInput) -> AppResult<PlacedOrder> {
        validate_order_quantity(input.quantity_ordered)
            .map_err(|m| AppError::validation("quantity_ordered", m))?;
        let rating = input
            .rating
            .ok_or_else(|| AppError::validation("rating", "Rating is required"))?;
        validate_rating(rating).map_err(|m| AppError::validation("rating", m))?;

        let today = Utc::now().date_naive();
        let mut tx = self.db.begin().await?;

        let product = lock_product(&mut *tx, &input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        product
            .check_availability(input.quantity_ordered)
            .map_err(rejection_error)?;

        let product = adjust_stock(&mut *tx, &product.product_id, -input.quantity_ordered, today)
            .await?
            .ok_or_else(|| {
                rejection_error(StockRejection::Insufficient {
                    available: product.quantity,
                })
            })?;

        let aggregate = RatingAggregate {
            rating_sum: product.rating_sum,
            total_ratings: product.total_ratings,
            average_rating: product.average_rating,
        }
        .record(rating);
        let product = store_rating(&mut *tx, &product.product_id, aggregate)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let customer = input.customer_info.unwrap_or_default().normalized();
        let price_per_unit = product.selling_price;
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders
                (order_id, product_id, product_name, quantity_ordered, price_per_unit,
                 total_amount, customer_name, customer_email, customer_phone,
                 customer_address, notes, rating, review)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(generate_order_id(Utc::now()))
        .bind(&product.product_id)
        .bind(&product.product_name)
        .bind(input.quantity_ordered)
        .bind(price_per_unit)
        .bind(shared::models::order_total(price_per_unit, input.quantity_ordered))
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&input.notes)
        .bind(rating)
        .bind(&input.review)
        .fetch_one(&mut *tx)
        .await?;

        let sale = NewLedgerEntry::sale(
            &order.order_id,
            &order.product_id,
            &order.product_name,
            order.quantity_ordered,
            order.price_per_unit,
        );
        insert_entry(&mut *tx, &sale).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.order_id,
            product_id = %order.product_id,
            quantity = order.quantity_ordered,
            remaining = product.quantity,
            "Order placed"
        );

        Ok(PlacedOrder {
            updated_product: StockAfterOrder {
                product_id: product.product_id,
                product_name: product.product_name,
                remaining_quantity: product.quantity,
                availability: product.availability,
                average_rating: product.average_rating,
                total_ratings: product.total_ratings,
            },
            order,
        })
    }

    pub async fn get_order(&self, order_id: &str) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    /// Newest first, optionally filtered by status
    pub async fn list_orders(&self, query: ListOrdersQuery) -> AppResult<OrderList> {
        let status = match query.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(raw) => Some(
                OrderStatus::parse(raw)
                    .ok_or_else(|| AppError::validation("status", "Unknown order status"))?,
            ),
        };
        let pagination = Pagination::from_query(query.page, query.limit, 10);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE ($1::VARCHAR IS NULL OR order_status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {}
            FROM orders
            WHERE ($1::VARCHAR IS NULL OR order_status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            ORDER_COLUMNS
        ))
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(OrderList {
            orders,
            pagination: PaginationMeta::new(pagination, u64::try_from(total).unwrap_or(0)),
        })
    }

    /// Change an order's status; cancelling returns its stock and removes its sale
    pub async fn update_status(
        &self,
        order_id: &str,
        input: UpdateOrderStatusInput,
    ) -> AppResult<Order> {
        let next = input
            .status
            .as_deref()
            .and_then(OrderStatus::parse)
            .ok_or_else(|| AppError::validation("status", "Valid status is required"))?;

        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut *tx, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let change = order
            .order_status
            .transition(next)
            .map_err(|e| AppError::InvalidStateTransition(e.to_string()))?;

        let order = match change {
            StatusChange::Unchanged => order,
            StatusChange::Updated => set_order_status(&mut *tx, &order.order_id, next).await?,
            StatusChange::Cancelled => {
                cancel_order(&mut *tx, &order, Utc::now().date_naive()).await?
            }
        };

        tx.commit().await?;

        tracing::info!(
            order_id = %order.order_id,
            status = order.order_status.as_str(),
            "Order status updated"
        );
        Ok(order)
    }
}

pub(crate) async fn lock_order(
    conn: &mut PgConnection,
    order_id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE order_id = $1 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

async fn set_order_status(
    conn: &mut PgConnection,
    order_id: &str,
    status: OrderStatus,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET order_status = $2, updated_at = NOW()
        WHERE order_id = $1
        RETURNING {}
        "#,
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(status)
    .fetch_one(conn)
    .await
}

/// Mark an order cancelled, put its units back and drop its sale from the ledger.
///
/// A product deleted since the order was placed is skipped.
pub(crate) async fn cancel_order(
    conn: &mut PgConnection,
    order: &Order,
    today: NaiveDate,
) -> Result<Order, sqlx::Error> {
    if order.order_status == OrderStatus::Cancelled {
        return Ok(order.clone());
    }

    let restored = adjust_stock(&mut *conn, &order.product_id, order.quantity_ordered, today).await?;
    if restored.is_none() {
        tracing::warn!(
            order_id = %order.order_id,
            product_id = %order.product_id,
            "Product missing while returning stock for cancelled order"
        );
    }
    delete_sale_for_order(&mut *conn, &order.order_id).await?;

    set_order_status(conn, &order.order_id, OrderStatus::Cancelled).await
}
