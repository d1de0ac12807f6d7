//! Sales statistics, chart rollups and ledger summaries

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LedgerService;
use shared::analytics::{
    chart_metadata, daily_breakdown, month_range, monthly_breakdown, percentage_change,
    previous_month_range, rollup, start_of_day, week_info, week_start, ChartMetadata, ChartPeriod,
    ChartPoint, DailySummary, LedgerSummary, MonthlySummary, SaleRecord, WeekInfo,
};
use shared::types::{Pagination, PaginationMeta};

/// Statistics service
#[derive(Clone)]
pub struct StatisticsService {
    db: PgPool,
}

#[derive(Debug, Default, sqlx::FromRow)]
struct MonthTotals {
    revenue: Decimal,
    units_sold: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthComparison {
    pub current: Decimal,
    pub previous: Decimal,
    pub change_percent: Decimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RatedProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub selling_price: Decimal,
    pub image_url: Option<String>,
    pub average_rating: Decimal,
    pub total_ratings: i32,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub revenue: MonthComparison,
    pub units_sold: MonthComparison,
    pub total_units_in_stock: i64,
    pub top_rated_products: Vec<RatedProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ChartData {
    pub data: Vec<ChartPoint>,
    pub metadata: ChartMetadata,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderCostRow {
    order_date: DateTime<Utc>,
    total_amount: Decimal,
    cost: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CurrentWeekSummary {
    #[serde(flatten)]
    pub week: WeekInfo,
    #[serde(flatten)]
    pub summary: LedgerSummary,
}

#[derive(Debug, Serialize)]
pub struct WeeklySalesPurchase {
    #[serde(flatten)]
    pub week: WeekInfo,
    pub totals: LedgerSummary,
    pub daily: Vec<DailySummary>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySalesPurchase {
    pub year: i32,
    pub months: Vec<MonthlySummary>,
}

#[derive(Debug, Serialize)]
pub struct YearlySalesPurchase {
    pub year: i32,
    pub totals: LedgerSummary,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub selling_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub current_stock: Option<i32>,
    pub average_rating: Option<Decimal>,
    pub order_count: i64,
    pub units_sold: i64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopProducts {
    pub period: String,
    pub since: DateTime<Utc>,
    pub products: Vec<TopProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductReview {
    pub order_id: String,
    pub customer_name: String,
    pub rating: i32,
    pub review: Option<String>,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub product_id: String,
    pub product_name: String,
    pub average_rating: Decimal,
    pub total_ratings: i32,
    pub reviews: Vec<ProductReview>,
    pub pagination: PaginationMeta,
}

/// Start of the top-products window ending now
fn period_start(period: &str, today: NaiveDate) -> Option<DateTime<Utc>> {
    match period {
        "week" => Some(start_of_day(week_start(today))),
        "month" => Some(month_range(today).0),
        "year" => NaiveDate::from_ymd_opt(today.year(), 1, 1).map(start_of_day),
        _ => None,
    }
}

impl StatisticsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn month_totals(&self, (start, end): (DateTime<Utc>, DateTime<Utc>)) -> AppResult<MonthTotals> {
        let totals = sqlx::query_as::<_, MonthTotals>(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS revenue,
                   COALESCE(SUM(quantity), 0)::BIGINT AS units_sold
            FROM ledger_entries
            WHERE entry_type = 'sale' AND entry_date >= $1 AND entry_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;
        Ok(totals)
    }

    /// This month against the previous one, plus stock and rating highlights
    pub async fn overview(&self) -> AppResult<Overview> {
        let today = Utc::now().date_naive();
        let current = self.month_totals(month_range(today)).await?;
        let previous = self.month_totals(previous_month_range(today)).await?;

        let total_units_in_stock = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM products",
        )
        .fetch_one(&self.db)
        .await?;

        let top_rated_products = self.products_by_rating(Some(6)).await?;

        let current_units = Decimal::from(current.units_sold);
        let previous_units = Decimal::from(previous.units_sold);
        Ok(Overview {
            revenue: MonthComparison {
                change_percent: percentage_change(current.revenue, previous.revenue),
                current: current.revenue,
                previous: previous.revenue,
            },
            units_sold: MonthComparison {
                change_percent: percentage_change(current_units, previous_units),
                current: current_units,
                previous: previous_units,
            },
            total_units_in_stock,
            top_rated_products,
        })
    }

    /// Sales against cost of goods sold, bucketed for the requested period
    pub async fn chart_data(&self, period: Option<&str>) -> AppResult<ChartData> {
        let period = match period {
            None | Some("") => ChartPeriod::default(),
            Some(raw) => ChartPeriod::parse(raw).ok_or_else(|| {
                AppError::validation("period", "Period must be one of day, week, month, year")
            })?,
        };
        let buckets = period.buckets(Utc::now());
        let (Some(first), Some(last)) = (buckets.first(), buckets.last()) else {
            return Ok(ChartData {
                metadata: chart_metadata(period, &[]),
                data: Vec::new(),
            });
        };

        let rows = sqlx::query_as::<_, OrderCostRow>(
            r#"
            SELECT o.order_date,
                   o.total_amount,
                   COALESCE(p.cost_price, 0) * o.quantity_ordered AS cost
            FROM orders o
            LEFT JOIN products p ON p.product_id = o.product_id
            WHERE o.order_status <> 'cancelled'
              AND o.order_date >= $1 AND o.order_date < $2
            "#,
        )
        .bind(first.start)
        .bind(last.end)
        .fetch_all(&self.db)
        .await?;

        let records: Vec<SaleRecord> = rows
            .into_iter()
            .map(|r| SaleRecord {
                at: r.order_date,
                sales: r.total_amount,
                cost: r.cost,
            })
            .collect();
        let data = rollup(&buckets, &records);

        Ok(ChartData {
            metadata: chart_metadata(period, &data),
            data,
        })
    }

    pub async fn current_week_summary(&self) -> AppResult<CurrentWeekSummary> {
        let week = week_info(Utc::now().date_naive());
        let points = LedgerService::new(self.db.clone())
            .points_between(
                start_of_day(week.week_start),
                start_of_day(week.week_end + Duration::days(1)),
            )
            .await?;

        Ok(CurrentWeekSummary {
            week,
            summary: LedgerSummary::from_entries(points.iter().map(|p| (p.entry_type, p.amount))),
        })
    }

    pub async fn weekly_sales_purchase(&self) -> AppResult<WeeklySalesPurchase> {
        let today = Utc::now().date_naive();
        let week = week_info(today);
        let points = LedgerService::new(self.db.clone())
            .points_between(
                start_of_day(week.week_start),
                start_of_day(week.week_end + Duration::days(1)),
            )
            .await?;

        Ok(WeeklySalesPurchase {
            week,
            totals: LedgerSummary::from_entries(points.iter().map(|p| (p.entry_type, p.amount))),
            daily: daily_breakdown(today, &points),
        })
    }

    pub async fn monthly_sales_purchase(&self) -> AppResult<MonthlySalesPurchase> {
        let year = Utc::now().year();
        let points = self.year_points(year).await?;
        Ok(MonthlySalesPurchase {
            year,
            months: monthly_breakdown(year, &points),
        })
    }

    pub async fn yearly_sales_purchase(&self) -> AppResult<YearlySalesPurchase> {
        let year = Utc::now().year();
        let points = self.year_points(year).await?;
        Ok(YearlySalesPurchase {
            year,
            totals: LedgerSummary::from_entries(points.iter().map(|p| (p.entry_type, p.amount))),
        })
    }

    async fn year_points(&self, year: i32) -> AppResult<Vec<shared::analytics::LedgerPoint>> {
        let bounds = NaiveDate::from_ymd_opt(year, 1, 1).zip(NaiveDate::from_ymd_opt(year + 1, 1, 1));
        let Some((start, end)) = bounds else {
            return Ok(Vec::new());
        };
        LedgerService::new(self.db.clone())
            .points_between(start_of_day(start), start_of_day(end))
            .await
    }

    /// Best sellers by revenue over non-cancelled orders
    pub async fn top_products(&self, query: PeriodQuery) -> AppResult<TopProducts> {
        let period = query.period.unwrap_or_else(|| "month".to_string());
        let since = period_start(&period, Utc::now().date_naive()).ok_or_else(|| {
            AppError::validation("period", "Period must be one of week, month, year")
        })?;
        let limit = i64::from(query.limit.unwrap_or(10).clamp(1, 100));

        let products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT o.product_id,
                   MAX(o.product_name) AS product_name,
                   MAX(p.category) AS category,
                   MAX(p.selling_price) AS selling_price,
                   MAX(p.cost_price) AS cost_price,
                   MAX(p.quantity) AS current_stock,
                   MAX(p.average_rating) AS average_rating,
                   COUNT(*) AS order_count,
                   COALESCE(SUM(o.quantity_ordered), 0)::BIGINT AS units_sold,
                   COALESCE(SUM(o.total_amount), 0) AS revenue,
                   COALESCE(SUM(o.total_amount - COALESCE(p.cost_price, 0) * o.quantity_ordered), 0)
                       AS profit
            FROM orders o
            LEFT JOIN products p ON p.product_id = o.product_id
            WHERE o.order_status <> 'cancelled' AND o.order_date >= $1
            GROUP BY o.product_id
            ORDER BY revenue DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(TopProducts {
            period,
            since,
            products,
        })
    }

    /// Rated products, best first
    pub async fn products_by_rating(&self, limit: Option<u32>) -> AppResult<Vec<RatedProduct>> {
        let limit = i64::from(limit.unwrap_or(10).clamp(1, 100));
        let products = sqlx::query_as::<_, RatedProduct>(
            r#"
            SELECT product_id, product_name, category, selling_price, image_url,
                   average_rating, total_ratings
            FROM products
            WHERE total_ratings > 0
            ORDER BY average_rating DESC, total_ratings DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    pub async fn product_reviews(
        &self,
        product_id: &str,
        query: ReviewsQuery,
    ) -> AppResult<ProductReviews> {
        let product = crate::services::ProductService::new(self.db.clone())
            .get(product_id)
            .await?;
        let pagination = Pagination::from_query(query.page, query.limit, 10);

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(&self.db)
            .await?;

        let reviews = sqlx::query_as::<_, ProductReview>(
            r#"
            SELECT order_id, customer_name, rating, review, order_date
            FROM orders
            WHERE product_id = $1
            ORDER BY order_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(ProductReviews {
            product_id: product.product_id,
            product_name: product.product_name,
            average_rating: product.average_rating,
            total_ratings: product.total_ratings,
            reviews,
            pagination: PaginationMeta::new(pagination, u64::try_from(total).unwrap_or(0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_start() {
        // 2025-03-12 is a Wednesday
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert_eq!(
            period_start("week", today).unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
        assert_eq!(
            period_start("month", today).unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
        assert_eq!(
            period_start("year", today).unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert!(period_start("decade", today).is_none());
    }
}
