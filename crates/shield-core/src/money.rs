//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A declared device value of "999.99" parsed as f64 is                   │
//! │    999.99000000000000909494701772928237915039062500                     │
//! │  and 20% of it lands on a rounding boundary by luck, not by design.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "999.99" → 99_999 cents, parsed digit by digit                      │
//! │    20% cover → 19_999.8 cents → premium rounds half-up to KSh 200      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shield_core::money::Money;
//!
//! let value = Money::parse_decimal("1500.5").unwrap();
//! assert_eq!(value.cents(), 150_050);
//! assert_eq!(value.to_decimal_string(), "1500.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::CoverRate;
use crate::validation::is_price_shape;
use crate::CURRENCY_SYMBOL;

/// Cents per whole currency unit.
const CENTS_PER_UNIT: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// devicePrice (text) ──parse_decimal──► Money ──cover()──► Money
///                                         │                  │
///                                         ▼                  ▼
///                              cover_amount (wire)      premium (wire)
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * CENTS_PER_UNIT)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / CENTS_PER_UNIT
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % CENTS_PER_UNIT).abs()
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parses a decimal amount as typed into a price field.
    ///
    /// ## Rules
    /// - Digits, optionally `.` and one or two fraction digits
    /// - No signs, separators or currency symbols (run the price formatter first)
    ///
    /// ## Example
    /// ```rust
    /// use shield_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("10.5").unwrap().cents(), 1050);
    /// assert_eq!(Money::parse_decimal("7").unwrap().cents(), 700);
    /// assert!(Money::parse_decimal("1.005").is_err());
    /// assert!(Money::parse_decimal("-3").is_err());
    /// ```
    pub fn parse_decimal(raw: &str) -> CoreResult<Self> {
        let invalid = || CoreError::InvalidAmount {
            input: raw.to_string(),
        };
        let trimmed = raw.trim();
        if !is_price_shape(trimmed) {
            return Err(invalid());
        }

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let units: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(cents))
            .map(Money)
            .ok_or_else(invalid)
    }

    /// Renders the amount as a plain decimal with two fraction digits.
    ///
    /// This is the form amounts travel in on the wire (`"999.99"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }

    /// Calculates the share of this amount covered at `rate`, rounded
    /// half-up to whole currency units.
    ///
    /// ## Implementation
    /// Integer math: `(cents * bps + 500_000) / 1_000_000` yields whole units.
    /// 10_000 bps per 100% times 100 cents per unit gives the 1_000_000
    /// divisor; adding half of it rounds half-up.
    ///
    /// ## Example
    /// ```rust
    /// use shield_core::money::Money;
    /// use shield_core::types::CoverRate;
    ///
    /// let value = Money::from_units(100_000);
    /// let premium = value.cover(CoverRate::from_bps(2000)); // 20%
    /// assert_eq!(premium.units(), 20_000);
    /// ```
    pub fn cover(&self, rate: CoverRate) -> Money {
        const DIVISOR: i128 = 10_000 * CENTS_PER_UNIT as i128;
        // i128: a large device value times bps overflows i64
        let scaled = self.0 as i128 * rate.bps() as i128;
        let units = if scaled >= 0 {
            (scaled + DIVISOR / 2) / DIVISOR
        } else {
            (scaled - DIVISOR / 2) / DIVISOR
        };
        Money::from_units(units as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money the way the rendering layer prints it:
/// currency symbol, thousands separators, two decimals.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.units().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(
            f,
            "{} {}{}.{:02}",
            CURRENCY_SYMBOL,
            sign,
            grouped,
            self.cents_part()
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
