//! # Domain Events
//!
//! What a successful submission reports back to the caller.

use serde::Serialize;
use ts_rs::TS;

use shield_core::Money;

/// A policy was bought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PolicyCreated {
    /// Server-issued number, or a local `DS-XXXXXXXXX` placeholder
    pub policy_number: String,
    pub policy_id: Option<String>,
    pub premium: Money,
    /// True when the backend did not return a policy number
    pub placeholder_number: bool,
}

/// A claim was filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClaimFiled {
    /// The backend's number when it returned one, otherwise the advisory one
    pub claim_number: String,
    pub claim_id: Option<i64>,
    pub policy_id: i64,
}
