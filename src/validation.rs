//! Input validation shared by the record handlers

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex"));

/// One or more rejected input fields
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.clone());
        Self { message, fields }
    }

    pub fn missing(fields: &[&str]) -> Self {
        Self {
            message: "Missing required fields".to_string(),
            fields: fields
                .iter()
                .map(|f| (f.to_string(), "This field is required".to_string()))
                .collect(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_error(err.message, Some(err.fields.into_iter().collect()))
    }
}

/// Trim and drop empty strings
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Emails are compared case-insensitively everywhere
pub fn normalize_email(field: &str, email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ValidationError::field(field, "Invalid email address"));
    }
    Ok(email)
}

/// Money columns are `NUMERIC(12, 2)`
pub const AMOUNT_SCALE: u32 = 2;
const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// Non-negative, fewer than ten integer digits and at most two decimals
pub fn check_amount(field: &str, amount: Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::field(field, "Amount cannot be negative"));
    }
    if amount >= Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS)) {
        return Err(ValidationError::field(field, "Amount is too large"));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(ValidationError::field(
            field,
            "Amount cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare date
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn email_format() {
        assert!(is_valid_email("ana.perez@example.com"));
        assert!(is_valid_email("a_b-c@sub.example.co"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn email_local_part_is_ascii_only() {
        assert!(!is_valid_email("josé@example.com"));
        assert!(!is_valid_email("ana@exämple.com"));
        assert!(is_valid_email("jose_1@example.com"));
    }

    #[test]
    fn amounts_fit_the_money_column() {
        assert!(check_amount("cash_in", Decimal::ZERO).is_ok());
        assert!(check_amount("cash_in", Decimal::new(999_999_999_999, 2)).is_ok());
        assert!(check_amount("cash_in", Decimal::new(1250, 3)).is_ok());

        let err = check_amount("cash_in", Decimal::new(10_000_000_000, 0)).unwrap_err();
        assert_eq!(err.fields["cash_in"], "Amount is too large");

        let err = check_amount("cash_out", Decimal::new(1239, 3)).unwrap_err();
        assert!(err.fields.contains_key("cash_out"));

        assert!(check_amount("cash_out", Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn normalizes_email_case() {
        assert_eq!(normalize_email("email", "  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("email", "nope").is_err());
    }

    #[test]
    fn digits_only() {
        assert!(is_all_digits("0102030405"));
        assert!(!is_all_digits("01-0203"));
        assert!(!is_all_digits(""));
        assert!(!is_all_digits("１２３"));
    }

    #[test]
    fn timestamps() {
        let ts = parse_timestamp("2024-05-01T10:30:00-04:00").unwrap();
        assert_eq!(ts.hour(), 14);

        let ts = parse_timestamp("2024-05-01").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 5, 1, 0));

        assert!(parse_timestamp("2024-05-01T08:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn clean_trims_and_drops_blank() {
        assert_eq!(clean(Some("  x ".into())).as_deref(), Some("x"));
        assert_eq!(clean(Some("   ".into())), None);
        assert_eq!(clean(None), None);
    }
}
