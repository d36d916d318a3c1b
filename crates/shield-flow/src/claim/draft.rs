//! # Claim Draft
//!
//! The policy being claimed against plus the five details of step 2.

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;
use ts_rs::TS;

use shield_core::types::{ClaimCategory, DeviceOutlet, PolicySummary};
use shield_core::validation::{validate, validate_date};
use shield_core::{Money, ValidationError, ValidationResult};
use shield_gateway::ClaimSubmission;

use crate::form::FormField;

/// A step-2 claim field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClaimField {
    ClaimType,
    IncidentDate,
    Description,
    EstimatedCost,
    DeviceOutlet,
}

impl ClaimField {
    pub const ALL: [ClaimField; 5] = [
        ClaimField::ClaimType,
        ClaimField::IncidentDate,
        ClaimField::Description,
        ClaimField::EstimatedCost,
        ClaimField::DeviceOutlet,
    ];
}

impl FormField for ClaimField {
    fn name(&self) -> &'static str {
        match self {
            ClaimField::ClaimType => "claimType",
            ClaimField::IncidentDate => "incidentDate",
            ClaimField::Description => "description",
            ClaimField::EstimatedCost => "estimatedCost",
            ClaimField::DeviceOutlet => "deviceOutlet",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClaimDraft {
    pub policy: Option<PolicySummary>,
    pub claim_type: Option<ClaimCategory>,
    pub incident_date: String,
    pub description: String,
    pub estimated_cost: String,
    pub outlet: Option<DeviceOutlet>,
}

impl ClaimDraft {
    pub fn text(&self, field: ClaimField) -> Option<&str> {
        match field {
            ClaimField::IncidentDate => Some(&self.incident_date),
            ClaimField::Description => Some(&self.description),
            ClaimField::EstimatedCost => Some(&self.estimated_cost),
            ClaimField::ClaimType | ClaimField::DeviceOutlet => None,
        }
    }

    pub(crate) fn text_mut(&mut self, field: ClaimField) -> Option<&mut String> {
        match field {
            ClaimField::IncidentDate => Some(&mut self.incident_date),
            ClaimField::Description => Some(&mut self.description),
            ClaimField::EstimatedCost => Some(&mut self.estimated_cost),
            ClaimField::ClaimType | ClaimField::DeviceOutlet => None,
        }
    }

    pub fn check(&self, field: ClaimField) -> ValidationResult<()> {
        match field {
            ClaimField::ClaimType if self.claim_type.is_none() => {
                Err(selection_required(field, "claim type"))
            }
            ClaimField::DeviceOutlet if self.outlet.is_none() => {
                Err(selection_required(field, "device outlet"))
            }
            ClaimField::ClaimType | ClaimField::DeviceOutlet => Ok(()),
            text => validate(text.name(), self.text(text).unwrap_or_default()),
        }
    }

    pub fn check_all(&self) -> Vec<(ClaimField, ValidationError)> {
        ClaimField::ALL
            .iter()
            .filter_map(|f| self.check(*f).err().map(|e| (*f, e)))
            .collect()
    }

    /// Builds the wire body. `None` until a policy is picked.
    pub fn to_submission(
        &self,
        claim_number: String,
    ) -> ValidationResult<Option<ClaimSubmission>> {
        let Some(policy) = &self.policy else {
            return Ok(None);
        };
        let claim_type = self
            .claim_type
            .ok_or_else(|| selection_required(ClaimField::ClaimType, "claim type"))?;
        let outlet = self
            .outlet
            .as_ref()
            .ok_or_else(|| selection_required(ClaimField::DeviceOutlet, "device outlet"))?;
        let incident_date = validate_date(ClaimField::IncidentDate.name(), &self.incident_date)?;
        let estimated_cost = Money::parse_decimal(&self.estimated_cost).map_err(|_| {
            ValidationError::InvalidPrice {
                field: ClaimField::EstimatedCost.name().to_string(),
            }
        })?;

        Ok(Some(ClaimSubmission {
            claim_number,
            description: self.description.trim().to_string(),
            claim_type,
            incident_date,
            estimated_cost: estimated_cost.to_decimal_string(),
            policy: policy.id,
            device_outlet: outlet.id,
        }))
    }
}

fn selection_required(field: ClaimField, item: &str) -> ValidationError {
    ValidationError::SelectionRequired {
        field: field.name().to_string(),
        item: item.to_string(),
    }
}

// =============================================================================
// Claim Numbers
// =============================================================================

const CLAIM_SEQUENCE_MIN: u16 = 1;
const CLAIM_SEQUENCE_MAX: u16 = 999;

/// `CLM_<MM>/<NNN>/<YYYY>`.
///
/// `sequence` is clamped to `1..=999` so the middle part is always three
/// digits.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use shield_flow::claim::claim_number;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// assert_eq!(claim_number(date, 7), "CLM_03/007/2025");
/// assert_eq!(claim_number(date, 4200), "CLM_03/999/2025");
/// ```
pub fn claim_number(date: NaiveDate, sequence: u16) -> String {
    let sequence = sequence.clamp(CLAIM_SEQUENCE_MIN, CLAIM_SEQUENCE_MAX);
    format!("CLM_{:02}/{:03}/{}", date.month(), sequence, date.year())
}

/// A claim number with a random 001-999 middle part.
///
/// Only a suggestion to the backend, which may assign its own.
pub fn advisory_claim_number(date: NaiveDate, rng: &mut impl Rng) -> String {
    claim_number(date, rng.gen_range(CLAIM_SEQUENCE_MIN..=CLAIM_SEQUENCE_MAX))
}
