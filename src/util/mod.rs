mod error;

pub use error::*;

use lazy_static::lazy_static;
use regex::Regex;
use time::{Date, OffsetDateTime};

/// Trim a form field, and turn it into None if it's blank. Every text field
/// we store goes through here first.
pub fn clean_form_field(field: &str) -> Option<&str> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Validate a sale price as typed by a human. Only plain ascii digits are
/// allowed: no sign, no decimal point, no thousands separators, no padding.
pub fn parse_price(price: &str) -> Result<i64, ValidationError> {
    lazy_static! {
        static ref PRICE_REGEX: Regex = Regex::new(r#"\A[0-9]+\z"#).unwrap();
    }
    if !PRICE_REGEX.is_match(price) {
        return Err(ValidationError::BadPrice {
            price: price.to_string(),
        });
    }
    // Digits-only can still overflow an i64.
    price.parse::<i64>().map_err(|_| ValidationError::PriceTooLarge {
        price: price.to_string(),
    })
}

/// Parse a `<select>` value that holds a row ID. The "choose one" sentinel
/// option has an empty value, which comes back as None.
pub fn parse_selection(value: &str, field: &'static str) -> Result<Option<i64>, ValidationError> {
    let Some(value) = clean_form_field(value) else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ValidationError::BadSelection {
            field,
            value: value.to_string(),
        })
}

/// The date to stamp on a new order. Local time if the platform will tell
/// us the offset, otherwise UTC.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Template filter: group the digits of a price by thousands, like 15,000.
pub fn group_digits(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_validation() {
        assert_eq!(parse_price("15000").unwrap(), 15000);
        assert_eq!(parse_price("0").unwrap(), 0);
        assert_eq!(parse_price("007").unwrap(), 7);
        for bad in ["", "12.5", "-5", "+5", "abc", "1,000", " 10", "10 ", "1e3"] {
            assert!(
                matches!(parse_price(bad), Err(ValidationError::BadPrice { .. })),
                "{bad:?} should have been rejected"
            );
        }
        // Non-ascii digits don't count.
        assert!(parse_price("١٢").is_err());
        assert!(matches!(
            parse_price("99999999999999999999"),
            Err(ValidationError::PriceTooLarge { .. })
        ));
    }

    #[test]
    fn form_fields() {
        assert_eq!(clean_form_field("  Kim "), Some("Kim"));
        assert_eq!(clean_form_field(" \t\n"), None);
        assert_eq!(clean_form_field(""), None);
    }

    #[test]
    fn selections() {
        assert_eq!(parse_selection("", "customer").unwrap(), None);
        assert_eq!(parse_selection("12", "customer").unwrap(), Some(12));
        assert!(matches!(
            parse_selection("twelve", "book"),
            Err(ValidationError::BadSelection { field: "book", .. })
        ));
    }

    #[test]
    fn digit_grouping() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(15000), "15,000");
        assert_eq!(group_digits(1234567), "1,234,567");
        assert_eq!(group_digits(-1234), "-1,234");
    }
}
