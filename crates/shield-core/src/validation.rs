//! # Validation Module
//!
//! Field rules shared by the purchase and claim flows.
//!
//! ## Rule Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Field Name → Rule                                  │
//! │                                                                         │
//! │  email ─────────────────────────────► Email    local@domain.tld        │
//! │  phone, mpesaPhoneNumber ───────────► Phone    10 digits after strip   │
//! │  devicePrice, estimatedCost ────────► Price    \d+(\.\d{1,2})? and > 0 │
//! │  purchaseDate, incidentDate ────────► Date     YYYY-MM-DD              │
//! │  anything else ─────────────────────► Presence not blank               │
//! │                                                                         │
//! │  Every rule checks presence first, so an empty email reports           │
//! │  "This field is required." rather than a format message.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shield_core::validation::validate;
//!
//! assert!(validate("email", "a@b.co").is_ok());
//! assert!(validate("email", "a@b").is_err());
//! assert!(validate("phone", "(071) 234-5678").is_ok());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::format::strip_phone;
use crate::money::Money;
use crate::{PHONE_DIGITS, PRICE_FRACTION_DIGITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Rules
// =============================================================================

/// The rule a field is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRule {
    /// Must not be blank.
    Presence,
    /// Presence plus `local@domain.tld` shape.
    Email,
    /// Presence plus exactly ten digits once formatting is removed.
    Phone,
    /// Presence plus a positive decimal with at most two fraction digits.
    Price,
    /// Presence plus an ISO `YYYY-MM-DD` calendar date.
    Date,
}

impl FieldRule {
    /// Picks the rule for a field by its form name.
    pub fn for_field(field: &str) -> Self {
        match field {
            "email" => FieldRule::Email,
            "phone" | "mpesaPhoneNumber" => FieldRule::Phone,
            "devicePrice" | "estimatedCost" => FieldRule::Price,
            "purchaseDate" | "incidentDate" => FieldRule::Date,
            _ => FieldRule::Presence,
        }
    }

    /// Checks `raw` against this rule on behalf of `field`.
    pub fn check(self, field: &str, raw: &str) -> ValidationResult<()> {
        validate_required(field, raw)?;
        match self {
            FieldRule::Presence => Ok(()),
            FieldRule::Email => validate_email(field, raw),
            FieldRule::Phone => validate_phone(field, raw),
            FieldRule::Price => validate_price(field, raw),
            FieldRule::Date => validate_date(field, raw).map(|_| ()),
        }
    }
}

/// Validates a field value using the rule registered for its name.
///
/// ## Example
/// ```rust
/// use shield_core::validation::validate;
/// use shield_core::ValidationError;
///
/// let err = validate("firstName", "   ").unwrap_err();
/// assert_eq!(err.to_string(), "This field is required.");
/// assert!(matches!(err, ValidationError::Required { .. }));
/// ```
pub fn validate(field: &str, raw: &str) -> ValidationResult<()> {
    FieldRule::for_field(field).check(field, raw)
}

// =============================================================================
// Individual Rules
// =============================================================================

/// Fails when the value is empty or whitespace only.
pub fn validate_required(field: &str, raw: &str) -> ValidationResult<()> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - No whitespace anywhere
/// - Exactly one `@` with something on both sides
/// - The domain holds a `.` with something on both sides
pub fn validate_email(field: &str, raw: &str) -> ValidationResult<()> {
    if is_valid_email(raw) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail {
            field: field.to_string(),
        })
    }
}

/// Validates a local phone number (formatting characters are ignored).
pub fn validate_phone(field: &str, raw: &str) -> ValidationResult<()> {
    if strip_phone(raw).len() == PHONE_DIGITS {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone {
            field: field.to_string(),
        })
    }
}

/// Validates a price typed by the user.
///
/// ## Rules
/// - Digits, optionally followed by `.` and one or two digits
/// - Strictly greater than zero
/// - Small enough to be held as [`Money`] (a whole cent count in an `i64`)
///
/// ## Example
/// ```rust
/// use shield_core::validation::validate_price;
///
/// assert!(validate_price("devicePrice", "999.99").is_ok());
/// assert!(validate_price("devicePrice", "0.00").is_err());
/// assert!(validate_price("devicePrice", "10.999").is_err());
/// assert!(validate_price("devicePrice", "99999999999999999999").is_err());
/// ```
pub fn validate_price(field: &str, raw: &str) -> ValidationResult<()> {
    let holdable =
        is_price_shape(raw) && Money::parse_decimal(raw).is_ok_and(|m| m.is_positive());
    if holdable {
        Ok(())
    } else {
        Err(ValidationError::InvalidPrice {
            field: field.to_string(),
        })
    }
}

/// Validates and parses an ISO calendar date.
pub fn validate_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field: field.to_string(),
    })
}

// =============================================================================
// Shape Checks
// =============================================================================

/// Returns true for `local@domain.tld` shaped input.
pub fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = raw.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    // Some dot must have at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Returns true for `\d+(\.\d{1,2})?` with nothing else around it.
pub fn is_price_shape(raw: &str) -> bool {
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match fraction {
        None => true,
        Some(f) => {
            !f.is_empty()
                && f.len() <= PRICE_FRACTION_DIGITS
                && f.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
