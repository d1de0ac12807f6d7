//! Public identifier generation for products, orders and invoices

use chrono::{DateTime, Utc};
use uuid::Uuid;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode a non-negative integer in lowercase base 36
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Uppercase hex characters taken from a fresh v4 uuid
fn random_hex(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    hex[..len.min(hex.len())].to_string()
}

fn millis(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or(0)
}

/// `PROD-<base36 millis>-<6 hex>`
pub fn generate_product_id(now: DateTime<Utc>) -> String {
    format!("PROD-{}-{}", to_base36(millis(now)), random_hex(6))
}

/// `ORD-<BASE36 MILLIS>-<5 chars>`, all upper case
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    format!("ORD-{}-{}", to_base36(millis(now)), random_hex(5)).to_uppercase()
}

/// `INV-<8 hex>`
pub fn generate_invoice_id() -> String {
    format!("INV-{}", random_hex(8))
}

/// `REF-<6 hex>`
pub fn generate_reference_number() -> String {
    format!("REF-{}", random_hex(6))
}
