//! Invoice tests
//!
//! - Due dates derived from the order date
//! - Payment and void transitions
//! - Tax breakdown rounding

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::ids::{generate_invoice_id, generate_reference_number};
use shared::models::{
    due_date, InvoiceStatus, InvoiceTransitionError, TaxBreakdown, VoidAction, DEFAULT_DUE_DAYS,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn status_strategy() -> impl Strategy<Value = InvoiceStatus> {
    prop::sample::select(InvoiceStatus::ALL.to_vec())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_default_status_is_unpaid() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Unpaid);
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Unpaid).unwrap(),
            "\"Unpaid\""
        );
    }

    #[test]
    fn test_due_date_crosses_month() {
        let ordered = Utc.with_ymd_and_hms(2025, 12, 25, 8, 0, 0).unwrap();
        assert_eq!(
            due_date(ordered, DEFAULT_DUE_DAYS),
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_void_messages() {
        assert_eq!(
            InvoiceStatus::Paid.void(VoidAction::Return).unwrap_err().to_string(),
            "Cannot return/cancel a paid invoice"
        );
        assert_eq!(
            InvoiceStatus::Cancelled.void(VoidAction::Cancel).unwrap_err(),
            InvoiceTransitionError::AlreadyVoided(InvoiceStatus::Cancelled)
        );
        assert_eq!(
            InvoiceStatus::Paid.check_payable().unwrap_err().to_string(),
            "Invoice is already paid"
        );
    }

    #[test]
    fn test_tax_breakdown_at_fifteen_percent() {
        let tax = TaxBreakdown::compute(dec("199.99"), Decimal::from(15));
        assert_eq!(tax.tax_rate, dec("0.15"));
        assert_eq!(tax.tax_amount, dec("30.00"));
        assert_eq!(tax.total_due, dec("229.99"));
    }

    #[test]
    fn test_identifier_prefixes() {
        assert!(generate_invoice_id().starts_with("INV-"));
        assert!(generate_reference_number().starts_with("REF-"));
        assert_ne!(generate_invoice_id(), generate_invoice_id());
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

        /// The due date is always the configured number of days after the order
        #[test]
        fn prop_due_date_offset(offset_secs in 0i64..400_000_000, days in 1i64..90) {
            let ordered = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
                + Duration::seconds(offset_secs);
            let due = due_date(ordered, days);
            prop_assert_eq!(due - ordered, Duration::days(days));
        }

        /// Only unpaid invoices can be paid or voided
        #[test]
        fn prop_only_unpaid_moves(status in status_strategy(), returning in any::<bool>()) {
            let action = if returning { VoidAction::Return } else { VoidAction::Cancel };
            let payable = status.check_payable().is_ok();
            let voidable = status.void(action).is_ok();
            prop_assert_eq!(payable, status == InvoiceStatus::Unpaid);
            prop_assert_eq!(voidable, status == InvoiceStatus::Unpaid);
        }

        /// A void lands on a voided status matching the requested action
        #[test]
        fn prop_void_target(returning in any::<bool>()) {
            let action = if returning { VoidAction::Return } else { VoidAction::Cancel };
            let next = InvoiceStatus::Unpaid.void(action).unwrap();
            prop_assert!(next.is_voided());
            prop_assert_eq!(next == InvoiceStatus::Returned, returning);
        }

        /// Tax plus subtotal equals the amount due to within a cent
        #[test]
        fn prop_tax_adds_up(cents in 0i64..10_000_000, rate in 0u32..40) {
            let subtotal = Decimal::new(cents, 2);
            let tax = TaxBreakdown::compute(subtotal, Decimal::from(rate));
            let diff = (tax.subtotal + tax.tax_amount - tax.total_due).abs();
            prop_assert!(diff <= dec("0.01"));
            prop_assert!(tax.total_due >= subtotal);
        }
    }
}
