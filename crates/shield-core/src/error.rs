//! # Error Types
//!
//! Domain-specific error types for shield-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shield-core errors (this file)                                        │
//! │  ├── ValidationError  - Field-scoped input failures (user facing)      │
//! │  └── CoreError        - General domain errors                          │
//! │                                                                         │
//! │  shield-gateway errors (separate crate)                                │
//! │  └── GatewayError     - Remote failures with HTTP status               │
//! │                                                                         │
//! │  shield-flow errors (separate crate)                                   │
//! │  └── FlowError        - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → FlowError::Validation → message under field   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. The `Display` of a [`ValidationError`] IS the message shown under the
//!    field, so the wording is part of the contract
//! 2. Every variant carries the field it belongs to
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An amount string could not be read as a decimal currency value.
    #[error("Invalid amount: {input:?}")]
    InvalidAmount { input: String },

    /// A label does not name any known variant of a reference list.
    ///
    /// ## When This Occurs
    /// - A device category id that is not phone/laptop/tablet/watch
    /// - A claim category label typed by hand instead of picked
    #[error("Unknown {kind}: {value:?}")]
    UnknownLabel { kind: &'static str, value: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements. They never
/// leave the device: the workflow engine stores them in its error map and
/// no network call is made while any are outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or whitespace only.
    #[error("This field is required.")]
    Required { field: String },

    /// Email does not look like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    InvalidEmail { field: String },

    /// Phone does not reduce to exactly ten digits.
    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhone { field: String },

    /// Price is malformed, has more than two decimals, or is not above zero.
    #[error("Please enter a valid price (e.g., 999.99)")]
    InvalidPrice { field: String },

    /// Date is not an ISO calendar date.
    #[error("Please enter a valid date (YYYY-MM-DD)")]
    InvalidDate { field: String },

    /// A choice that is made by picking, not typing, has not been made.
    ///
    /// ## User Workflow
    /// ```text
    /// Step 4: no plan card clicked
    ///      │
    ///      ▼
    /// Continue
    ///      │
    ///      ▼
    /// SelectionRequired { field: "selectedPricingPlan", item: "pricing plan" }
    ///      │
    ///      ▼
    /// UI shows: "Please select a pricing plan"
    /// ```
    #[error("Please select a {item}")]
    SelectionRequired { field: String, item: String },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::InvalidEmail { field }
            | ValidationError::InvalidPhone { field }
            | ValidationError::InvalidPrice { field }
            | ValidationError::InvalidDate { field }
            | ValidationError::SelectionRequired { field, .. } => field,
        }
    }

    /// Returns true if the field was simply left empty.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            ValidationError::Required { .. } | ValidationError::SelectionRequired { .. }
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
