//! Validation utilities for the Inventory Back-Office service

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Product Validations
// ============================================================================

/// Why a `DD/MM/YY` date was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("Date is required")]
    Missing,
    #[error("Date must be in DD/MM/YY format (e.g., 31/12/25)")]
    Format,
    #[error("Invalid date provided")]
    Invalid,
}

/// Parse a `DD/MM/YY` date; two-digit years land in 2000-2099
pub fn parse_short_date(value: &str) -> Result<NaiveDate, DateParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DateParseError::Missing);
    }

    let parts: Vec<&str> = value.split('/').collect();
    let (day, month, year) = match parts.as_slice() {
        [d, m, y] => (*d, *m, *y),
        _ => return Err(DateParseError::Format),
    };
    fn digits(s: &str, min: usize, max: usize) -> bool {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    }
    if !digits(day, 1, 2) || !digits(month, 1, 2) || !digits(year, 2, 2) {
        return Err(DateParseError::Format);
    }

    let day: u32 = day.parse().map_err(|_| DateParseError::Format)?;
    let month: u32 = month.parse().map_err(|_| DateParseError::Format)?;
    let year: i32 = year.parse().map_err(|_| DateParseError::Format)?;

    NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or(DateParseError::Invalid)
}

/// Validate an order or product rating
pub fn validate_rating(rating: i32) -> Result<(), &'static str> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err("Rating must be an integer between 1 and 5")
    }
}

/// Validate a price is not negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Validate a stock count is not negative
pub fn validate_stock_count(count: i32) -> Result<(), &'static str> {
    if count < 0 {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Validate an ordered quantity
pub fn validate_order_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || email.len() < 5 {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_date() {
        assert_eq!(
            parse_short_date("31/12/25"),
            Ok(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
        );
        assert_eq!(
            parse_short_date("1/2/30"),
            Ok(NaiveDate::from_ymd_opt(2030, 2, 1).unwrap())
        );
    }

    #[test]
    fn test_parse_short_date_rejects_bad_shapes() {
        assert_eq!(parse_short_date(""), Err(DateParseError::Missing));
        assert_eq!(parse_short_date("2025-12-31"), Err(DateParseError::Format));
        assert_eq!(parse_short_date("31/12/2025"), Err(DateParseError::Format));
        assert_eq!(parse_short_date("aa/12/25"), Err(DateParseError::Format));
    }

    #[test]
    fn test_parse_short_date_rejects_impossible_days() {
        assert_eq!(parse_short_date("30/02/25"), Err(DateParseError::Invalid));
        assert_eq!(parse_short_date("31/04/25"), Err(DateParseError::Invalid));
        assert!(parse_short_date("29/02/28").is_ok());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@shop.com").is_ok());
        assert!(validate_email("@shop.com").is_err());
        assert!(validate_email("owner.shop.com").is_err());
    }
}
