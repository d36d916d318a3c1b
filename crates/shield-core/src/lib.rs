//! # shield-core: Pure Business Logic for DeviceShield
//!
//! This crate holds the rules every DeviceShield flow leans on: field
//! validation, input formatting, premium calculation and the domain types
//! exchanged with the insurance backend. Everything here is a pure function.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DeviceShield Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (out of tree)                      │   │
//! │  │    Device ──► Personal ──► Device Info ──► Plan ──► Pay ──► ✓  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ actions / snapshots                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                shield-flow (workflow engine)                    │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────┐  ┌────────▼──────────────────┐    │
//! │  │   ★ shield-core (THIS CRATE) ★  │  │  shield-gateway (HTTP)    │    │
//! │  │                                 │  │  plans, policies, claims  │    │
//! │  │  validation  format  pricing    │  └───────────────────────────┘    │
//! │  │  money       types              │                                   │
//! │  │                                 │                                   │
//! │  │  NO I/O • NO NETWORK • PURE     │                                   │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`validation`] - Field rules (presence, email, phone, price, date)
//! - [`format`] - Input normalisation (phone grouping, price cleanup, currency)
//! - [`pricing`] - Premium calculation from a device value and a plan
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (plans, devices, claim categories, statuses)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shield_core::money::Money;
//! use shield_core::pricing::compute_premium;
//!
//! // KSh 100,000 device at 20% cover
//! assert_eq!(compute_premium(100_000.0, Some(20.0)), 20_000);
//!
//! let value = Money::parse_decimal("999.99").unwrap();
//! assert_eq!(value.cents(), 99_999);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod format;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;
pub use validation::{FieldRule, ValidationResult};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of significant digits in a local phone number.
pub const PHONE_DIGITS: usize = 10;

/// Maximum fraction digits accepted for a price.
pub const PRICE_FRACTION_DIGITS: usize = 2;

/// Currency code shown in front of every formatted amount.
pub const CURRENCY_SYMBOL: &str = "KSh";
