//! Order lifecycle tests
//!
//! - Status transitions and stock return on cancellation
//! - Order totals and sale ledger amounts
//! - Order id format

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::ids::generate_order_id;
use shared::models::{
    order_total, CustomerInfo, LedgerEntryType, LedgerSource, NewLedgerEntry, OrderStatus,
    OrderTransitionError, StatusChange, GUEST_CUSTOMER,
};
use shared::validation::{validate_order_quantity, validate_rating};

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::ALL.to_vec())
}

fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(OrderStatus::parse("shipped"), Some(OrderStatus::Shipped));
        assert_eq!(OrderStatus::parse("refunded"), None);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_reopening_cancelled_order_rejected() {
        assert_eq!(
            OrderStatus::Cancelled.transition(OrderStatus::Pending),
            Err(OrderTransitionError::LeavingCancelled)
        );
        assert_eq!(
            OrderStatus::Cancelled.transition(OrderStatus::Cancelled),
            Ok(StatusChange::Unchanged)
        );
    }

    #[test]
    fn test_customer_defaults_to_guest() {
        let info: CustomerInfo = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert_eq!(info.name, GUEST_CUSTOMER);

        let blank = CustomerInfo {
            name: "  ".to_string(),
            ..CustomerInfo::default()
        }
        .normalized();
        assert_eq!(blank.name, GUEST_CUSTOMER);
    }

    #[test]
    fn test_sale_entry_links_order() {
        let sale = NewLedgerEntry::sale("ORD-1", "PROD-1", "Tea", 3, Decimal::new(1250, 2));
        assert_eq!(sale.entry_type, LedgerEntryType::Sale);
        assert_eq!(sale.source, LedgerSource::Order);
        assert_eq!(sale.order_id.as_deref(), Some("ORD-1"));
        assert_eq!(sale.amount(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_order_id_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let id = generate_order_id(now);
        assert!(id.starts_with("ORD-"));
        assert_eq!(id, id.to_uppercase());
        assert_eq!(id.split('-').count(), 3);
        assert_eq!(id.rsplit('-').next().unwrap().len(), 5);
    }

    #[test]
    fn test_order_input_validation() {
        assert!(validate_order_quantity(0).is_err());
        assert!(validate_order_quantity(1).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(3).is_ok());
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

        /// Cancelling any live order asks for its stock back
        #[test]
        fn prop_cancel_returns_stock(from in status_strategy()) {
            let result = from.transition(OrderStatus::Cancelled);
            if from == OrderStatus::Cancelled {
                prop_assert_eq!(result, Ok(StatusChange::Unchanged));
            } else {
                prop_assert_eq!(result, Ok(StatusChange::Cancelled));
            }
        }

        /// Only a cancelled order refuses to move
        #[test]
        fn prop_transition_rules(from in status_strategy(), to in status_strategy()) {
            let result = from.transition(to);
            match (from, to) {
                (OrderStatus::Cancelled, OrderStatus::Cancelled) => {
                    prop_assert_eq!(result, Ok(StatusChange::Unchanged))
                }
                (OrderStatus::Cancelled, _) => prop_assert!(result.is_err()),
                (_, OrderStatus::Cancelled) => {
                    prop_assert_eq!(result, Ok(StatusChange::Cancelled))
                }
                _ if from == to => prop_assert_eq!(result, Ok(StatusChange::Unchanged)),
                _ => prop_assert_eq!(result, Ok(StatusChange::Updated)),
            }
        }

        /// The sale recorded for an order carries exactly the order total
        #[test]
        fn prop_sale_amount_matches_total(price in price_strategy(), quantity in 1i32..1000) {
            let sale = NewLedgerEntry::sale("ORD-X", "PROD-X", "Item", quantity, price);
            prop_assert_eq!(sale.amount(), order_total(price, quantity));
            prop_assert!(sale.amount() >= Decimal::ZERO);
        }
    }
}
