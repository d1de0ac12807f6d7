//! Date bucketing and rollups for the statistics endpoints
//!
//! All calendar arithmetic is done in UTC. Weeks run Sunday to Saturday.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::LedgerEntryType;

/// Granularity of the sales/purchase chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    /// 24 hourly buckets of today
    Day,
    /// Sunday..Saturday of the current week
    #[default]
    Week,
    /// Jan..Dec of the current year
    Month,
    /// Jan..Dec of the current year, labelled with the year
    Year,
}

impl ChartPeriod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "day" => Some(ChartPeriod::Day),
            "week" => Some(ChartPeriod::Week),
            "month" => Some(ChartPeriod::Month),
            "year" => Some(ChartPeriod::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartPeriod::Day => "day",
            ChartPeriod::Week => "week",
            ChartPeriod::Month => "month",
            ChartPeriod::Year => "year",
        }
    }

    /// Contiguous half-open buckets covering the period that contains `now`
    pub fn buckets(&self, now: DateTime<Utc>) -> Vec<ChartBucket> {
        let today = now.date_naive();
        match self {
            ChartPeriod::Day => {
                let midnight = start_of_day(today);
                (0..24)
                    .map(|hour| {
                        let start = midnight + Duration::hours(hour);
                        ChartBucket {
                            label: start.format("%H:00").to_string(),
                            start,
                            end: start + Duration::hours(1),
                        }
                    })
                    .collect()
            }
            ChartPeriod::Week => {
                let sunday = week_start(today);
                (0..7)
                    .map(|offset| {
                        let day = sunday + Duration::days(offset);
                        ChartBucket {
                            label: day.format("%a").to_string(),
                            start: start_of_day(day),
                            end: start_of_day(day + Duration::days(1)),
                        }
                    })
                    .collect()
            }
            ChartPeriod::Month => month_buckets(today.year(), "%b"),
            ChartPeriod::Year => month_buckets(today.year(), "%b %Y"),
        }
    }
}

fn month_buckets(year: i32, label_format: &str) -> Vec<ChartBucket> {
    (1..=12)
        .filter_map(|month| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            let next = first.checked_add_months(Months::new(1))?;
            Some(ChartBucket {
                label: first.format(label_format).to_string(),
                start: start_of_day(first),
                end: start_of_day(next),
            })
        })
        .collect()
}

/// A labelled `[start, end)` time window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ChartBucket {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// One non-cancelled order as seen by the chart: revenue and cost of goods sold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleRecord {
    pub at: DateTime<Utc>,
    pub sales: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub sales: Decimal,
    pub purchases: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartMetadata {
    pub period: ChartPeriod,
    pub total_data_points: usize,
    pub date_range: String,
    pub total_sales: Decimal,
    pub total_cogs: Decimal,
    pub total_profit: Decimal,
}

/// Sum records into their buckets; records outside every bucket are ignored
pub fn rollup(buckets: &[ChartBucket], records: &[SaleRecord]) -> Vec<ChartPoint> {
    buckets
        .iter()
        .map(|bucket| {
            let (sales, purchases) = records
                .iter()
                .filter(|r| bucket.contains(r.at))
                .fold((Decimal::ZERO, Decimal::ZERO), |(s, c), r| {
                    (s + r.sales, c + r.cost)
                });
            ChartPoint {
                label: bucket.label.clone(),
                sales,
                purchases,
                profit: sales - purchases,
            }
        })
        .collect()
}

pub fn chart_metadata(period: ChartPeriod, points: &[ChartPoint]) -> ChartMetadata {
    let total_sales: Decimal = points.iter().map(|p| p.sales).sum();
    let total_cogs: Decimal = points.iter().map(|p| p.purchases).sum();
    let date_range = match (points.first(), points.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.label, last.label),
        _ => String::new(),
    };
    ChartMetadata {
        period,
        total_data_points: points.len(),
        date_range,
        total_sales,
        total_cogs,
        total_profit: total_sales - total_cogs,
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// The Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Sunday-based week number; week 1 starts on the Sunday on or before Jan 1
pub fn week_of_year(date: NaiveDate) -> u32 {
    let jan_first = date - Duration::days(i64::from(date.ordinal0()));
    let first_sunday = week_start(jan_first);
    ((date - first_sunday).num_days() / 7) as u32 + 1
}

/// Calendar placement of the week containing a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekInfo {
    pub year: i32,
    pub month: u32,
    pub week: u32,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

pub fn week_info(date: NaiveDate) -> WeekInfo {
    let start = week_start(date);
    WeekInfo {
        year: date.year(),
        month: date.month(),
        week: week_of_year(date),
        week_start: start,
        week_end: start + Duration::days(6),
    }
}

/// Calendar month window `[start, end)` containing `date`
pub fn month_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = date - Duration::days(i64::from(date.day0()));
    let next = first
        .checked_add_months(Months::new(1))
        .unwrap_or(first + Duration::days(31));
    (start_of_day(first), start_of_day(next))
}

/// The month window before the one containing `date`
pub fn previous_month_range(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = date - Duration::days(i64::from(date.day0()));
    let previous = first.pred_opt().unwrap_or(first);
    month_range(previous)
}

/// Purchase/sale totals over a set of ledger entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LedgerSummary {
    pub total_purchases: Decimal,
    pub total_sales: Decimal,
    pub profit: Decimal,
    pub purchase_count: u32,
    pub sale_count: u32,
    pub total_transactions: u32,
}

impl LedgerSummary {
    pub fn add(&mut self, entry_type: LedgerEntryType, amount: Decimal) {
        match entry_type {
            LedgerEntryType::Purchase => {
                self.total_purchases += amount;
                self.purchase_count += 1;
            }
            LedgerEntryType::Sale => {
                self.total_sales += amount;
                self.sale_count += 1;
            }
        }
        self.total_transactions += 1;
        self.profit = self.total_sales - self.total_purchases;
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (LedgerEntryType, Decimal)>,
    {
        let mut summary = Self::default();
        for (entry_type, amount) in entries {
            summary.add(entry_type, amount);
        }
        summary
    }
}

/// Minimal view of a ledger row used by the breakdowns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPoint {
    pub at: DateTime<Utc>,
    pub entry_type: LedgerEntryType,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub day: String,
    #[serde(flatten)]
    pub summary: LedgerSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: u32,
    pub label: String,
    #[serde(flatten)]
    pub summary: LedgerSummary,
}

/// Seven daily summaries starting at the Sunday of `date`'s week
pub fn daily_breakdown(date: NaiveDate, points: &[LedgerPoint]) -> Vec<DailySummary> {
    let sunday = week_start(date);
    (0..7)
        .map(|offset| {
            let day = sunday + Duration::days(offset);
            let summary = LedgerSummary::from_entries(
                points
                    .iter()
                    .filter(|p| p.at.date_naive() == day)
                    .map(|p| (p.entry_type, p.amount)),
            );
            DailySummary {
                date: day,
                day: day.format("%A").to_string(),
                summary,
            }
        })
        .collect()
}

/// Twelve monthly summaries for `year`
pub fn monthly_breakdown(year: i32, points: &[LedgerPoint]) -> Vec<MonthlySummary> {
    (1..=12)
        .map(|month| {
            let summary = LedgerSummary::from_entries(
                points
                    .iter()
                    .filter(|p| p.at.year() == year && p.at.month() == month)
                    .map(|p| (p.entry_type, p.amount)),
            );
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B").to_string())
                .unwrap_or_default();
            MonthlySummary {
                month,
                label,
                summary,
            }
        })
        .collect()
}

/// Relative change in percent, one decimal place
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    ((current - previous) / previous * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2025-08-25 is a Monday
        assert_eq!(week_start(date(2025, 8, 25)), date(2025, 8, 24));
        assert_eq!(week_start(date(2025, 8, 24)), date(2025, 8, 24));
    }

    #[test]
    fn test_week_of_year() {
        // Jan 1 2025 is a Wednesday, so week 1 starts Sun Dec 29 2024
        assert_eq!(week_of_year(date(2025, 1, 1)), 1);
        assert_eq!(week_of_year(date(2025, 1, 4)), 1);
        assert_eq!(week_of_year(date(2025, 1, 5)), 2);
        assert_eq!(week_of_year(date(2025, 8, 25)), 35);
    }

    #[test]
    fn test_week_info_bounds() {
        let info = week_info(date(2025, 8, 27));
        assert_eq!(info.week_start, date(2025, 8, 24));
        assert_eq!(info.week_end, date(2025, 8, 30));
        assert_eq!(info.month, 8);
    }

    #[test]
    fn test_day_buckets_labels() {
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 15, 12, 0).unwrap();
        let buckets = ChartPeriod::Day.buckets(now);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[0].label, "00:00");
        assert_eq!(buckets[23].label, "23:00");
    }

    #[test]
    fn test_week_buckets_start_on_sunday() {
        let now = Utc.with_ymd_and_hms(2025, 8, 27, 8, 0, 0).unwrap();
        let labels: Vec<String> = ChartPeriod::Week
            .buckets(now)
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(labels, ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);
    }

    #[test]
    fn test_year_buckets_carry_year() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let buckets = ChartPeriod::Year.buckets(now);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].label, "Jan 2026");
        assert_eq!(buckets[11].label, "Dec 2026");
        assert_eq!(ChartPeriod::Month.buckets(now)[1].label, "Feb");
    }

    #[test]
    fn test_rollup_profit() {
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 10, 30, 0).unwrap();
        let buckets = ChartPeriod::Day.buckets(now);
        let records = [
            SaleRecord {
                at: now,
                sales: Decimal::from(100),
                cost: Decimal::from(60),
            },
            SaleRecord {
                at: now + Duration::minutes(10),
                sales: Decimal::from(50),
                cost: Decimal::from(20),
            },
        ];
        let points = rollup(&buckets, &records);
        assert_eq!(points[10].sales, Decimal::from(150));
        assert_eq!(points[10].profit, Decimal::from(70));
        assert_eq!(points[11].sales, Decimal::ZERO);

        let meta = chart_metadata(ChartPeriod::Day, &points);
        assert_eq!(meta.total_profit, Decimal::from(70));
        assert_eq!(meta.date_range, "00:00 to 23:00");
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(Decimal::from(5), Decimal::ZERO), Decimal::ONE_HUNDRED);
        assert_eq!(percentage_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            percentage_change(Decimal::from(150), Decimal::from(100)),
            Decimal::new(500, 1)
        );
        assert_eq!(
            percentage_change(Decimal::from(1), Decimal::from(3)),
            Decimal::new(-667, 1)
        );
    }

    #[test]
    fn test_previous_month_wraps_year() {
        let (start, end) = previous_month_range(date(2026, 1, 15));
        assert_eq!(start.date_naive(), date(2025, 12, 1));
        assert_eq!(end.date_naive(), date(2026, 1, 1));
    }

    #[test]
    fn test_ledger_summary() {
        let summary = LedgerSummary::from_entries([
            (LedgerEntryType::Purchase, Decimal::from(40)),
            (LedgerEntryType::Sale, Decimal::from(100)),
            (LedgerEntryType::Sale, Decimal::from(25)),
        ]);
        assert_eq!(summary.total_sales, Decimal::from(125));
        assert_eq!(summary.profit, Decimal::from(85));
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.total_transactions, 3);
    }
}
