//! # Pricing Engine
//!
//! Premium = device value × cover percentage, rounded half-up to a whole
//! currency unit.
//!
//! ## Guards
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input                                   Premium                        │
//! │  ─────────────────────────────────────   ───────                        │
//! │  value not finite, or ≤ 0                0                              │
//! │  no plan selected                        0                              │
//! │  cover % outside 0..=100 / not finite    0                              │
//! │  otherwise                               round_half_up(value × % / 100) │
//! │                                                                         │
//! │  0 means "premium unknown" to the rendering layer, never a real quote. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CoverRate, PricingPlan};

/// Computes the premium in whole currency units.
///
/// ## Example
/// ```rust
/// use shield_core::pricing::compute_premium;
///
/// assert_eq!(compute_premium(100_000.0, Some(20.0)), 20_000);
/// assert_eq!(compute_premium(0.0, Some(20.0)), 0);
/// assert_eq!(compute_premium(100_000.0, None), 0);
/// ```
pub fn compute_premium(device_value: f64, cover_percentage: Option<f64>) -> i64 {
    if !device_value.is_finite() || device_value <= 0.0 {
        return 0;
    }
    let Some(rate) = cover_percentage.and_then(CoverRate::from_percentage) else {
        return 0;
    };
    // Float → cents happens once; everything after is integer math.
    let value = Money::from_cents((device_value * 100.0).round() as i64);
    value.cover(rate).units()
}

/// Computes the premium for an exact device value and an optional plan.
pub fn premium_for(device_value: Money, plan: Option<&PricingPlan>) -> Money {
    if !device_value.is_positive() {
        return Money::zero();
    }
    plan.and_then(PricingPlan::cover_rate)
        .map(|rate| device_value.cover(rate))
        .unwrap_or_else(Money::zero)
}

// =============================================================================
// Quote
// =============================================================================

/// What the review step shows before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Quote {
    /// Declared device value; zero when the price field is not a valid amount
    pub cover_amount: Money,
    /// Whole-unit premium; zero means "unknown"
    pub premium: Money,
}

impl Quote {
    /// Returns true if the quote can be shown as a real price.
    pub fn is_known(&self) -> bool {
        self.premium.is_positive()
    }
}

/// Quotes a premium straight from the device price field text.
///
/// ## Example
/// ```rust
/// use shield_core::pricing::quote;
/// use shield_core::types::PricingPlan;
///
/// let plan = PricingPlan {
///     id: 1,
///     cover_type: "Full Cover".into(),
///     cover_percentage: 20.0,
///     components: vec![],
/// };
/// let q = quote("999.99", Some(&plan));
/// assert_eq!(q.premium.units(), 200);
/// assert!(!quote("abc", Some(&plan)).is_known());
/// ```
pub fn quote(device_price: &str, plan: Option<&PricingPlan>) -> Quote {
    let cover_amount = Money::parse_decimal(device_price).unwrap_or_default();
    Quote {
        cover_amount,
        premium: premium_for(cover_amount, plan),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
