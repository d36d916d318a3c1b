//! # Wire Payloads
//!
//! Request and response bodies exchanged with the insurance backend.
//!
//! ## Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outgoing                                Incoming                       │
//! │  ─────────────────────────────────       ──────────────────────────     │
//! │  PolicyApplication ─► purchase           PolicyReceipt  (lenient)      │
//! │    ├── PolicyOwner                       ClaimReceipt   (lenient)      │
//! │    ├── InsuredDevice[]                   Page<T>        results / []   │
//! │    └── PaymentDetails                    PolicyDetail, ClaimDetail     │
//! │  ClaimSubmission   ─► claims             ClaimDocument                  │
//! │  DocumentUpload    ─► multipart                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts go out as decimal strings (`"45000.00"`), which the backend's
//! decimal fields accept without float rounding. Receipts are read leniently:
//! a created policy must never be reported as a failure because the response
//! body had an unexpected shape.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shield_core::types::{ClaimCategory, PolicySummary, PricingPlan};

use crate::error::GatewayResult;

// =============================================================================
// Pagination
// =============================================================================

/// A list endpoint's body: either a paginated envelope or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Page<T> {
    Envelope {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
    },
    Bare(Vec<T>),
}

impl<T> Page<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Page::Envelope { results } => results,
            Page::Bare(items) => items,
        }
    }
}

/// Parses a list body from raw JSON.
pub fn parse_page<T: DeserializeOwned>(value: Value) -> GatewayResult<Vec<T>> {
    Ok(serde_json::from_value::<Page<T>>(value)?.into_vec())
}

// =============================================================================
// Policy Purchase
// =============================================================================

/// Person the policy is issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyOwner {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Digits only
    pub phone_number: String,
    pub id_number: String,
    pub gender: String,
}

/// The device being insured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsuredDevice {
    /// `smartphone`, `laptop`, `tablet`, `smartwatch`
    pub device_type: String,
    pub device_brand: String,
    pub device_model: String,
    pub purchase_date: NaiveDate,
    /// Decimal string
    pub device_cost: String,
    pub description: String,
    pub imei_number: String,
    pub serial_number: String,
}

/// How the premium is collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentDetails {
    pub payment_method: String,
    pub account_name: String,
    /// Digits only
    pub phone_number: String,
}

/// Payment method label the backend expects for mobile money.
pub const PAYMENT_METHOD_MPESA: &str = "Mpesa";

/// Body of the policy purchase call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyApplication {
    pub start_date: NaiveDate,
    /// Whole currency units
    pub premium: i64,
    /// Pricing plan id
    pub pricing: i64,
    /// Decimal string
    pub cover_amount: String,
    pub cover_type: String,
    pub policy_owner: PolicyOwner,
    pub devices: Vec<InsuredDevice>,
    pub payment_details: PaymentDetails,
}

/// What the backend told us about a created policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyReceipt {
    pub id: Option<String>,
    pub policy_number: Option<String>,
}

impl PolicyReceipt {
    /// Picks `id` and `policy_number` out of any response body.
    ///
    /// Also looks one level down in a nested `policy` object.
    pub fn from_json(body: &Value) -> Self {
        let nested = body.get("policy");
        Self {
            id: id_string(body.get("id")).or_else(|| id_string(nested.and_then(|p| p.get("id")))),
            policy_number: non_empty_str(body.get("policy_number"))
                .or_else(|| non_empty_str(nested.and_then(|p| p.get("policy_number")))),
        }
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Body of the claim creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimSubmission {
    /// Advisory `CLM_MM/NNN/YYYY`; the backend may assign its own
    pub claim_number: String,
    pub description: String,
    pub claim_type: ClaimCategory,
    pub incident_date: NaiveDate,
    /// Decimal string
    pub estimated_cost: String,
    /// Policy id
    pub policy: i64,
    /// Device outlet id
    pub device_outlet: i64,
}

/// What the backend told us about a created claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub id: Option<i64>,
    pub claim_number: Option<String>,
}

impl ClaimReceipt {
    pub fn from_json(body: &Value) -> Self {
        let id = match body.get("id") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Self {
            id,
            claim_number: non_empty_str(body.get("claim_number")),
        }
    }
}

/// A claim row as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub id: i64,
    #[serde(default)]
    pub claim_number: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub claim_type: Option<String>,
    #[serde(default)]
    pub incident_date: Option<String>,
    #[serde(default)]
    pub estimated_cost: Option<String>,
}

/// A document attached to a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDocument {
    pub id: i64,
    pub claim: i64,
    pub document_name: String,
    /// URL of the stored file
    #[serde(default)]
    pub document_file: Option<String>,
}

/// Full claim record including its documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDetail {
    #[serde(flatten)]
    pub claim: ClaimSummary,
    #[serde(default)]
    pub claim_documents: Vec<ClaimDocument>,
    #[serde(default)]
    pub device_outlet_name: Option<String>,
    #[serde(default)]
    pub claim_owner: Option<String>,
}

/// One file to attach to a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub claim_id: i64,
    /// Label typed by the user ("Police abstract")
    pub name: String,
    pub file_name: String,
    pub content: Vec<u8>,
    /// Defaults to `application/octet-stream`
    pub mime_type: Option<String>,
}

// =============================================================================
// Policy Detail
// =============================================================================

/// A device recorded on an issued policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuredDeviceRecord {
    pub id: i64,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub device_brand: Option<String>,
    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub imei_number: Option<String>,
    #[serde(default)]
    pub device_cost: Option<String>,
}

/// Full policy record with its devices, plan and claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDetail {
    #[serde(flatten)]
    pub policy: PolicySummary,
    #[serde(default)]
    pub policy_gadgets: Vec<InsuredDeviceRecord>,
    #[serde(default)]
    pub gadget_pricing: Option<PricingPlan>,
    #[serde(default)]
    pub policy_claims: Vec<ClaimSummary>,
}

// =============================================================================
// Helpers
// =============================================================================

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
