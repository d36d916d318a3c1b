//! # Formatters
//!
//! Normalise raw keystrokes into the canonical form a field displays.
//!
//! Every formatter here is idempotent: feeding its own output back in
//! returns the same string, so the engine can format on every keystroke
//! without the value drifting.
//!
//! ```text
//! "0712345678"   ──format_phone──►  "(071) 234-5678"
//! "(071) 234-5678" ──format_phone──►  "(071) 234-5678"
//! "1.2.3"        ──format_price──►  "1.23"
//! "KSh 1,200"    ──format_price──►  "1200"
//! ```

use crate::money::Money;
use crate::validation::FieldRule;
use crate::PHONE_DIGITS;

/// Formats a field value according to the rule registered for its name.
///
/// Phone fields are grouped, price fields are cleaned up, everything else
/// passes through untouched.
pub fn format(field: &str, raw: &str) -> String {
    match FieldRule::for_field(field) {
        FieldRule::Phone => format_phone(raw),
        FieldRule::Price => format_price(raw),
        FieldRule::Presence | FieldRule::Email | FieldRule::Date => raw.to_string(),
    }
}

/// Keeps only the ASCII digits of a phone number.
///
/// This is the form phone numbers travel in.
pub fn strip_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Groups a phone number as `(XXX) YYY-ZZZZ` while it is being typed.
///
/// ## Rules
/// - Up to 3 digits: digits as typed
/// - 4 to 6 digits: `(XXX) YYY`
/// - More: `(XXX) YYY-ZZZZ`, extra digits beyond ten are dropped
///
/// ## Example
/// ```rust
/// use shield_core::format::format_phone;
///
/// assert_eq!(format_phone("071"), "071");
/// assert_eq!(format_phone("07123"), "(071) 23");
/// assert_eq!(format_phone("071234567890"), "(071) 234-5678");
/// ```
pub fn format_phone(raw: &str) -> String {
    let mut digits = strip_phone(raw);
    digits.truncate(PHONE_DIGITS);

    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Strips everything but digits and the decimal point from a price.
///
/// A second (or third...) decimal point is removed and the digits after
/// it are folded into the fractional part: `1.2.3` becomes `1.23`.
pub fn format_price(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match cleaned.split_once('.') {
        Some((whole, rest)) if rest.contains('.') => {
            let fraction: String = rest.chars().filter(|c| *c != '.').collect();
            format!("{whole}.{fraction}")
        }
        _ => cleaned,
    }
}

/// Formats money for display, e.g. `KSh 1,234.50`.
pub fn format_currency(amount: Money) -> String {
    amount.to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_phone_grouping_progresses_while_typing() {
        let typed = "0712345678";
        let steps: Vec<String> = (1..=typed.len())
            .map(|n| format_phone(&typed[..n]))
            .collect();
        assert_eq!(steps[2], "071");
        assert_eq!(steps[3], "(071) 2");
        assert_eq!(steps[5], "(071) 234");
        assert_eq!(steps[6], "(071) 234-5");
        assert_eq!(steps[9], "(071) 234-5678");
    }

    #[test]
    fn test_phone_never_exceeds_ten_digits() {
        let formatted = format_phone("+254 712 345 678 999");
        assert_eq!(strip_phone(&formatted).len(), 10);
    }

    #[test]
    fn test_price_cleanup() {
        assert_eq!(format_price("KSh 1,200"), "1200");
        assert_eq!(format_price("1.2.3"), "1.23");
        assert_eq!(format_price("..5"), ".5");
        assert_eq!(format_price("999.99"), "999.99");
        assert_eq!(format_price(""), "");
    }

    #[test]
    fn test_format_dispatches_on_field_name() {
        assert_eq!(format("phone", "0712345678"), "(071) 234-5678");
        assert_eq!(format("mpesaPhoneNumber", "0712"), "(071) 2");
        assert_eq!(format("devicePrice", "1a2"), "12");
        assert_eq!(format("firstName", " Jane "), " Jane ");
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(format_currency(Money::from_cents(123_450)), "KSh 1,234.50");
    }

    proptest! {
        #[test]
        fn prop_phone_format_is_idempotent(raw in ".{0,20}") {
            let once = format("phone", &raw);
            prop_assert_eq!(format("phone", &once), once);
        }

        #[test]
        fn prop_price_format_is_idempotent(raw in "[0-9.a-z ,]{0,16}") {
            let once = format("devicePrice", &raw);
            prop_assert_eq!(format("devicePrice", &once), once.clone());
            prop_assert!(once.matches('.').count() <= 1);
        }
    }
}
