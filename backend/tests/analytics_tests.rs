//! Sales analytics tests
//!
//! - Chart buckets cover their period without gaps
//! - Rollups conserve sales and cost
//! - Ledger summaries and week numbering

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::analytics::{
    chart_metadata, daily_breakdown, monthly_breakdown, percentage_change, rollup, week_info,
    week_of_year, ChartPeriod, LedgerPoint, LedgerSummary, SaleRecord,
};
use shared::models::LedgerEntryType;

fn period_strategy() -> impl Strategy<Value = ChartPeriod> {
    prop::sample::select(vec![
        ChartPeriod::Day,
        ChartPeriod::Week,
        ChartPeriod::Month,
        ChartPeriod::Year,
    ])
}

fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..315_360_000).prop_map(|secs| {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs)
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_bucket_labels() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 15, 30, 0).unwrap();

        let day = ChartPeriod::Day.buckets(now);
        assert_eq!(day.len(), 24);
        assert_eq!(day[0].label, "00:00");
        assert_eq!(day[23].label, "23:00");

        let week = ChartPeriod::Week.buckets(now);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].label, "Sun");
        assert_eq!(week[0].start.weekday(), Weekday::Sun);

        let month = ChartPeriod::Month.buckets(now);
        assert_eq!(month[0].label, "Jan");
        assert_eq!(month[11].label, "Dec");

        let year = ChartPeriod::Year.buckets(now);
        assert_eq!(year[2].label, "Mar 2025");
    }

    #[test]
    fn test_chart_profit_is_sales_minus_cost() {
        let now = Utc.with_ymd_and_hms(2025, 3, 12, 15, 30, 0).unwrap();
        let buckets = ChartPeriod::Day.buckets(now);
        let records = [
            SaleRecord {
                at: Utc.with_ymd_and_hms(2025, 3, 12, 15, 5, 0).unwrap(),
                sales: Decimal::from(120),
                cost: Decimal::from(80),
            },
            SaleRecord {
                at: Utc.with_ymd_and_hms(2025, 3, 11, 15, 5, 0).unwrap(),
                sales: Decimal::from(999),
                cost: Decimal::from(1),
            },
        ];
        let points = rollup(&buckets, &records);
        assert_eq!(points[15].sales, Decimal::from(120));
        assert_eq!(points[15].profit, Decimal::from(40));

        let meta = chart_metadata(ChartPeriod::Day, &points);
        assert_eq!(meta.total_data_points, 24);
        assert_eq!(meta.total_sales, Decimal::from(120));
        assert_eq!(meta.total_cogs, Decimal::from(80));
        assert_eq!(meta.date_range, "00:00 to 23:00");
    }

    #[test]
    fn test_week_info_is_sunday_based() {
        // Saturday 2025-03-15 belongs to the week starting Sunday 2025-03-09
        let info = week_info(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(info.week_start, NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!(info.week_end, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(week_of_year(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 1);
        // 2025-01-05 is the first Sunday after Jan 1
        assert_eq!(week_of_year(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()), 2);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(
            percentage_change(Decimal::from(150), Decimal::from(100)),
            Decimal::from(50)
        );
        assert_eq!(
            percentage_change(Decimal::from(10), Decimal::ZERO),
            Decimal::from(100)
        );
        assert_eq!(percentage_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            percentage_change(Decimal::from(1), Decimal::from(3)),
            Decimal::new(-667, 1)
        );
    }

    #[test]
    fn test_breakdowns() {
        let at = Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();
        let points = [
            LedgerPoint {
                at,
                entry_type: LedgerEntryType::Sale,
                amount: Decimal::from(300),
            },
            LedgerPoint {
                at,
                entry_type: LedgerEntryType::Purchase,
                amount: Decimal::from(200),
            },
        ];

        let daily = daily_breakdown(at.date_naive(), &points);
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[3].day, "Wednesday");
        assert_eq!(daily[3].summary.profit, Decimal::from(100));
        assert_eq!(daily[0].summary.total_transactions, 0);

        let monthly = monthly_breakdown(2025, &points);
        assert_eq!(monthly.len(), 12);
        assert_eq!(monthly[2].label, "March");
        assert_eq!(monthly[2].summary.sale_count, 1);
        assert_eq!(monthly[2].summary.purchase_count, 1);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Buckets are contiguous and every instant of the period lands in exactly one
        #[test]
        fn prop_buckets_cover_period(period in period_strategy(), now in instant_strategy()) {
            let buckets = period.buckets(now);
            prop_assert!(!buckets.is_empty());
            for pair in buckets.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            let hits = buckets.iter().filter(|b| b.contains(now)).count();
            prop_assert_eq!(hits, 1);
        }

        /// Rolling up never invents or loses money that falls inside the period
        #[test]
        fn prop_rollup_conserves_totals(
            now in instant_strategy(),
            period in period_strategy(),
            amounts in prop::collection::vec((0i64..1_000_000, 0i64..1_000_000, 0i64..86_400), 0..30)
        ) {
            let buckets = period.buckets(now);
            let start = buckets[0].start;
            let records: Vec<SaleRecord> = amounts
                .iter()
                .map(|(sales, cost, offset)| SaleRecord {
                    at: start + Duration::seconds(*offset % 3600),
                    sales: Decimal::new(*sales, 2),
                    cost: Decimal::new(*cost, 2),
                })
                .collect();

            let points = rollup(&buckets, &records);
            let meta = chart_metadata(period, &points);
            let sales: Decimal = records.iter().map(|r| r.sales).sum();
            let cost: Decimal = records.iter().map(|r| r.cost).sum();

            prop_assert_eq!(points.len(), buckets.len());
            prop_assert_eq!(meta.total_sales, sales);
            prop_assert_eq!(meta.total_cogs, cost);
            prop_assert_eq!(meta.total_profit, sales - cost);
        }

        /// Summary counts and profit follow the entries fed in
        #[test]
        fn prop_ledger_summary(
            entries in prop::collection::vec((any::<bool>(), 0i64..1_000_000), 0..50)
        ) {
            let typed: Vec<(LedgerEntryType, Decimal)> = entries
                .iter()
                .map(|(sale, cents)| {
                    let kind = if *sale { LedgerEntryType::Sale } else { LedgerEntryType::Purchase };
                    (kind, Decimal::new(*cents, 2))
                })
                .collect();
            let summary = LedgerSummary::from_entries(typed.iter().copied());

            prop_assert_eq!(summary.total_transactions as usize, typed.len());
            prop_assert_eq!(
                (summary.sale_count + summary.purchase_count) as usize,
                typed.len()
            );
            prop_assert_eq!(summary.profit, summary.total_sales - summary.total_purchases);
        }

        /// Week numbers stay in range and the week always spans Sunday to Saturday
        #[test]
        fn prop_week_info(now in instant_strategy()) {
            let info = week_info(now.date_naive());
            prop_assert!(info.week >= 1 && info.week <= 54);
            prop_assert_eq!(info.week_start.weekday(), Weekday::Sun);
            prop_assert_eq!(info.week_end.weekday(), Weekday::Sat);
            prop_assert!(info.week_start <= now.date_naive());
            prop_assert!(now.date_naive() <= info.week_end);
        }
    }
}
