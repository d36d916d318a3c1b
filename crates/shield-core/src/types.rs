//! # Domain Types
//!
//! Core domain types for DeviceShield.
//!
//! ## Type Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Domain Model                                     │
//! │                                                                         │
//! │  ┌──────────────┐        ┌──────────────┐        ┌──────────────┐      │
//! │  │DeviceCategory│        │ PricingPlan  │ 1────* │PlanComponent │      │
//! │  │ phone/laptop │        │ cover_type   │        │ name         │      │
//! │  │ tablet/watch │        │ cover %  ────┼──► CoverRate (bps)    │      │
//! │  └──────────────┘        └──────────────┘        └──────────────┘      │
//! │                                                                         │
//! │  ┌──────────────┐        ┌──────────────┐        ┌──────────────┐      │
//! │  │PolicySummary │ ─────► │ PolicyStatus │        │ClaimCategory │      │
//! │  │ number/owner │        │ claimable?   │        │ Theft, Loss… │      │
//! │  └──────────────┘        └──────────────┘        └──────────────┘      │
//! │                                                                         │
//! │  ┌──────────────┐                                                       │
//! │  │ DeviceOutlet │  repair / seller shop a claim is routed to           │
//! │  └──────────────┘                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Wire shapes follow the backend's field names (`snake_case`); the
//! backend serialises decimals as strings, so amounts arriving from it are
//! kept as text and parsed into [`Money`] on demand.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Cover Rate
// =============================================================================

/// Cover percentage in basis points (1/100th of a percent).
///
/// ## Why Basis Points?
/// - Plans arrive as floats (`7.5`, `20`); storing bps keeps the premium
///   arithmetic in integers
/// - 2000 bps = 20%, 10_000 bps = 100%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoverRate(u32);

impl CoverRate {
    /// Full cover (100%).
    pub const FULL: CoverRate = CoverRate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CoverRate(bps)
    }

    /// Creates a rate from a percentage.
    ///
    /// Returns `None` unless the percentage is finite and within 0..=100.
    pub fn from_percentage(pct: f64) -> Option<Self> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return None;
        }
        Some(CoverRate((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage.
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Pricing Plans
// =============================================================================

/// One named coverage item inside a plan ("Screen damage", "Theft"...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlanComponent {
    pub name: String,
    #[serde(default)]
    pub included: bool,
}

/// A coverage option offered by the backend.
///
/// Plans are read-only: the engine fetches a fresh list every time the
/// user moves from device details to plan selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingPlan {
    pub id: i64,

    /// "Full Cover" / "Partial Cover"
    pub cover_type: String,

    /// Percentage of the device value charged as premium (0-100)
    pub cover_percentage: f64,

    #[serde(rename = "pricingcomponents", default)]
    pub components: Vec<PlanComponent>,
}

impl PricingPlan {
    /// Cover rate of this plan, `None` if the percentage is out of range.
    pub fn cover_rate(&self) -> Option<CoverRate> {
        CoverRate::from_percentage(self.cover_percentage)
    }

    /// Components the plan actually includes.
    pub fn included_components(&self) -> impl Iterator<Item = &PlanComponent> {
        self.components.iter().filter(|c| c.included)
    }
}

// =============================================================================
// Device Category
// =============================================================================

/// Kind of device being insured, picked on the first purchase step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DeviceCategory {
    Phone,
    Laptop,
    Tablet,
    Watch,
}

impl DeviceCategory {
    /// All categories in display order.
    pub const ALL: [DeviceCategory; 4] = [
        DeviceCategory::Phone,
        DeviceCategory::Laptop,
        DeviceCategory::Tablet,
        DeviceCategory::Watch,
    ];

    /// Identifier used by the selection cards.
    pub fn id(&self) -> &'static str {
        match self {
            DeviceCategory::Phone => "phone",
            DeviceCategory::Laptop => "laptop",
            DeviceCategory::Tablet => "tablet",
            DeviceCategory::Watch => "watch",
        }
    }

    /// Human label.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceCategory::Phone => "Smartphone",
            DeviceCategory::Laptop => "Laptop",
            DeviceCategory::Tablet => "Tablet",
            DeviceCategory::Watch => "Smartwatch",
        }
    }

    /// `device_type` value expected by the policy purchase endpoint.
    pub fn wire_type(&self) -> &'static str {
        match self {
            DeviceCategory::Phone => "smartphone",
            DeviceCategory::Laptop => "laptop",
            DeviceCategory::Tablet => "tablet",
            DeviceCategory::Watch => "smartwatch",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceCategory {
    type Err = CoreError;

    /// Accepts the card id or the wire type, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        DeviceCategory::ALL
            .into_iter()
            .find(|c| c.id() == needle || c.wire_type() == needle)
            .ok_or_else(|| CoreError::UnknownLabel {
                kind: "device category",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Claim Category
// =============================================================================

/// What happened to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClaimCategory {
    #[serde(rename = "Accidental Damage")]
    AccidentalDamage,
    Theft,
    Loss,
    #[serde(rename = "Liquid Damage")]
    LiquidDamage,
    Other,
}

impl ClaimCategory {
    /// All categories in display order.
    pub const ALL: [ClaimCategory; 5] = [
        ClaimCategory::AccidentalDamage,
        ClaimCategory::Theft,
        ClaimCategory::Loss,
        ClaimCategory::LiquidDamage,
        ClaimCategory::Other,
    ];

    /// Label shown in the picker and sent as `claim_type`.
    pub fn label(&self) -> &'static str {
        match self {
            ClaimCategory::AccidentalDamage => "Accidental Damage",
            ClaimCategory::Theft => "Theft",
            ClaimCategory::Loss => "Loss",
            ClaimCategory::LiquidDamage => "Liquid Damage",
            ClaimCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ClaimCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ClaimCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownLabel {
                kind: "claim category",
                value: s.to_string(),
            })
    }
}

// =============================================================================
// Policy Status
// =============================================================================

/// Lifecycle status of an issued policy.
///
/// ## Claimability
/// ```text
/// Draft ──► Created ──► Active ──► Lapsed / Cancelled / Deactivated
///             ✓           ✓              ✗
/// ```
/// Only `Created` and `Active` policies accept claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyStatus {
    Draft,
    Created,
    Active,
    Cancelled,
    Lapsed,
    Deactivated,
    /// A status this build does not know about (kept verbatim).
    Unknown(String),
}

impl PolicyStatus {
    /// Reads a status label case-insensitively. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "draft" => PolicyStatus::Draft,
            "created" => PolicyStatus::Created,
            "active" => PolicyStatus::Active,
            "cancelled" => PolicyStatus::Cancelled,
            "lapsed" => PolicyStatus::Lapsed,
            "deactivated" => PolicyStatus::Deactivated,
            _ => PolicyStatus::Unknown(raw.to_string()),
        }
    }

    /// Returns true if a claim may be filed against a policy in this status.
    pub fn is_claimable(&self) -> bool {
        matches!(self, PolicyStatus::Created | PolicyStatus::Active)
    }
}

// =============================================================================
// Policies & Outlets
// =============================================================================

/// A row of the policy list or of a policy search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PolicySummary {
    pub id: i64,
    pub policy_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub policy_owner_name: Option<String>,
    /// Decimal string as sent by the backend, e.g. `"85000.00"`
    #[serde(default)]
    pub cover_amount: Option<String>,
    #[serde(default)]
    pub premium: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl PolicySummary {
    /// Parsed status.
    pub fn status(&self) -> PolicyStatus {
        PolicyStatus::parse(&self.status)
    }

    /// Returns true if a claim may be filed against this policy.
    pub fn is_claimable(&self) -> bool {
        self.status().is_claimable()
    }

    /// Returns true if the policy belongs to `owner` (case-insensitive).
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.policy_owner_name
            .as_deref()
            .is_some_and(|name| name.trim().to_lowercase() == owner.trim().to_lowercase())
    }

    /// Cover amount, `None` if absent or malformed.
    pub fn cover_amount(&self) -> Option<Money> {
        self.cover_amount
            .as_deref()
            .and_then(|raw| Money::parse_decimal(raw).ok())
    }
}

/// A seller or repair shop a claim can be routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeviceOutlet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: Option<String>,
    /// "Seller" / "Repair"
    #[serde(default)]
    pub agent_type: Option<String>,
}

impl fmt::Display for DeviceOutlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.location)
    }
}

/// Gender choices accepted by the backend.
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];

// =============================================================================
// Unit Tests
// =============================================================================
