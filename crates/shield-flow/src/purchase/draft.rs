//! # Purchase Draft
//!
//! The in-progress policy application. Only [`PurchaseFlow`](super::PurchaseFlow)
//! holds it mutably; the rendering layer reads it through `&PurchaseDraft`.
//!
//! Text fields hold exactly what the user sees (phone numbers grouped as
//! `(071) 234-5678`). Formatting is stripped only when the draft becomes a
//! [`PolicyApplication`].

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use shield_core::format::strip_phone;
use shield_core::pricing::premium_for;
use shield_core::types::{DeviceCategory, PricingPlan};
use shield_core::validation::{validate, validate_date};
use shield_core::{Money, ValidationError, ValidationResult};
use shield_gateway::{
    InsuredDevice, PaymentDetails, PolicyApplication, PolicyOwner, PAYMENT_METHOD_MPESA,
};

use crate::form::FormField;

// =============================================================================
// Fields
// =============================================================================

/// A purchase draft field, including the two picked ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PurchaseField {
    Device,
    FirstName,
    LastName,
    Email,
    Phone,
    Gender,
    IdNumber,
    DeviceBrand,
    DeviceModel,
    DeviceDescription,
    PurchaseDate,
    SerialNumber,
    ImeiNumber,
    DevicePrice,
    PricingPlan,
    PaymentAccountName,
    MpesaPhoneNumber,
}

impl PurchaseField {
    pub const ALL: [PurchaseField; 17] = [
        PurchaseField::Device,
        PurchaseField::FirstName,
        PurchaseField::LastName,
        PurchaseField::Email,
        PurchaseField::Phone,
        PurchaseField::Gender,
        PurchaseField::IdNumber,
        PurchaseField::DeviceBrand,
        PurchaseField::DeviceModel,
        PurchaseField::DeviceDescription,
        PurchaseField::PurchaseDate,
        PurchaseField::SerialNumber,
        PurchaseField::ImeiNumber,
        PurchaseField::DevicePrice,
        PurchaseField::PricingPlan,
        PurchaseField::PaymentAccountName,
        PurchaseField::MpesaPhoneNumber,
    ];

    /// Returns true for fields set by picking rather than typing.
    pub fn is_selection(&self) -> bool {
        matches!(self, PurchaseField::Device | PurchaseField::PricingPlan)
    }
}

impl FormField for PurchaseField {
    fn name(&self) -> &'static str {
        match self {
            PurchaseField::Device => "selectedDevice",
            PurchaseField::FirstName => "firstName",
            PurchaseField::LastName => "lastName",
            PurchaseField::Email => "email",
            PurchaseField::Phone => "phone",
            PurchaseField::Gender => "gender",
            PurchaseField::IdNumber => "idNumber",
            PurchaseField::DeviceBrand => "deviceBrand",
            PurchaseField::DeviceModel => "deviceModel",
            PurchaseField::DeviceDescription => "deviceDescription",
            PurchaseField::PurchaseDate => "purchaseDate",
            PurchaseField::SerialNumber => "serialNumber",
            PurchaseField::ImeiNumber => "imeiNumber",
            PurchaseField::DevicePrice => "devicePrice",
            PurchaseField::PricingPlan => "selectedPricingPlan",
            PurchaseField::PaymentAccountName => "paymentAccountName",
            PurchaseField::MpesaPhoneNumber => "mpesaPhoneNumber",
        }
    }
}

// =============================================================================
// Draft
// =============================================================================

/// Everything the user has entered so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseDraft {
    pub device: Option<DeviceCategory>,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub id_number: String,

    pub device_brand: String,
    pub device_model: String,
    pub device_description: String,
    pub purchase_date: String,
    pub serial_number: String,
    pub imei_number: String,
    pub device_price: String,

    pub plan: Option<PricingPlan>,

    pub payment_account_name: String,
    pub mpesa_phone_number: String,
}

impl PurchaseDraft {
    /// Text behind a typed field; `None` for the picked ones.
    pub fn text(&self, field: PurchaseField) -> Option<&str> {
        Some(match field {
            PurchaseField::FirstName => &self.first_name,
            PurchaseField::LastName => &self.last_name,
            PurchaseField::Email => &self.email,
            PurchaseField::Phone => &self.phone,
            PurchaseField::Gender => &self.gender,
            PurchaseField::IdNumber => &self.id_number,
            PurchaseField::DeviceBrand => &self.device_brand,
            PurchaseField::DeviceModel => &self.device_model,
            PurchaseField::DeviceDescription => &self.device_description,
            PurchaseField::PurchaseDate => &self.purchase_date,
            PurchaseField::SerialNumber => &self.serial_number,
            PurchaseField::ImeiNumber => &self.imei_number,
            PurchaseField::DevicePrice => &self.device_price,
            PurchaseField::PaymentAccountName => &self.payment_account_name,
            PurchaseField::MpesaPhoneNumber => &self.mpesa_phone_number,
            PurchaseField::Device | PurchaseField::PricingPlan => return None,
        })
    }

    pub(crate) fn text_mut(&mut self, field: PurchaseField) -> Option<&mut String> {
        Some(match field {
            PurchaseField::FirstName => &mut self.first_name,
            PurchaseField::LastName => &mut self.last_name,
            PurchaseField::Email => &mut self.email,
            PurchaseField::Phone => &mut self.phone,
            PurchaseField::Gender => &mut self.gender,
            PurchaseField::IdNumber => &mut self.id_number,
            PurchaseField::DeviceBrand => &mut self.device_brand,
            PurchaseField::DeviceModel => &mut self.device_model,
            PurchaseField::DeviceDescription => &mut self.device_description,
            PurchaseField::PurchaseDate => &mut self.purchase_date,
            PurchaseField::SerialNumber => &mut self.serial_number,
            PurchaseField::ImeiNumber => &mut self.imei_number,
            PurchaseField::DevicePrice => &mut self.device_price,
            PurchaseField::PaymentAccountName => &mut self.payment_account_name,
            PurchaseField::MpesaPhoneNumber => &mut self.mpesa_phone_number,
            PurchaseField::Device | PurchaseField::PricingPlan => return None,
        })
    }

    /// Runs the rule registered for one field.
    pub fn check(&self, field: PurchaseField) -> ValidationResult<()> {
        match field {
            PurchaseField::Device => match self.device {
                Some(_) => Ok(()),
                None => Err(selection_required(field, "device")),
            },
            PurchaseField::PricingPlan => match self.plan {
                Some(_) => Ok(()),
                None => Err(selection_required(field, "pricing plan")),
            },
            text => validate(text.name(), self.text(text).unwrap_or_default()),
        }
    }

    /// Errors for every failing field in `fields`, in order.
    pub fn check_all(&self, fields: &[PurchaseField]) -> Vec<(PurchaseField, ValidationError)> {
        fields
            .iter()
            .filter_map(|f| self.check(*f).err().map(|e| (*f, e)))
            .collect()
    }

    /// Returns true if the hard submission preconditions hold.
    pub fn has_submission_essentials(&self) -> bool {
        !self.email.trim().is_empty()
            && !self.device_model.trim().is_empty()
            && self.plan.is_some()
    }

    /// Premium for the current price and plan, zero when unknown.
    pub fn premium(&self) -> Money {
        let value = Money::parse_decimal(&self.device_price).unwrap_or_default();
        premium_for(value, self.plan.as_ref())
    }

    /// Builds the wire body for the purchase call.
    ///
    /// Assumes every step has validated; any field that still fails is
    /// returned as the first [`ValidationError`].
    pub fn to_application(&self, start_date: NaiveDate) -> ValidationResult<PolicyApplication> {
        let device = self
            .device
            .ok_or_else(|| selection_required(PurchaseField::Device, "device"))?;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| selection_required(PurchaseField::PricingPlan, "pricing plan"))?;
        let purchase_date = validate_date(PurchaseField::PurchaseDate.name(), &self.purchase_date)?;
        let device_cost = Money::parse_decimal(&self.device_price).map_err(|_| {
            ValidationError::InvalidPrice {
                field: PurchaseField::DevicePrice.name().to_string(),
            }
        })?;

        let owner_phone = strip_phone(&self.phone);
        let mpesa_phone = match strip_phone(&self.mpesa_phone_number) {
            digits if digits.is_empty() => owner_phone.clone(),
            digits => digits,
        };
        let account_name = match self.payment_account_name.trim() {
            "" => format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            name => name.to_string(),
        };

        Ok(PolicyApplication {
            start_date,
            premium: premium_for(device_cost, Some(plan)).units(),
            pricing: plan.id,
            cover_amount: device_cost.to_decimal_string(),
            cover_type: plan.cover_type.clone(),
            policy_owner: PolicyOwner {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                email: self.email.trim().to_string(),
                phone_number: owner_phone,
                id_number: self.id_number.trim().to_string(),
                gender: self.gender.trim().to_string(),
            },
            devices: vec![InsuredDevice {
                device_type: device.wire_type().to_string(),
                device_brand: self.device_brand.trim().to_string(),
                device_model: self.device_model.trim().to_string(),
                purchase_date,
                device_cost: device_cost.to_decimal_string(),
                description: self.device_description.trim().to_string(),
                imei_number: self.imei_number.trim().to_string(),
                serial_number: self.serial_number.trim().to_string(),
            }],
            payment_details: PaymentDetails {
                payment_method: PAYMENT_METHOD_MPESA.to_string(),
                account_name,
                phone_number: mpesa_phone,
            },
        })
    }
}

fn selection_required(field: PurchaseField, item: &str) -> ValidationError {
    ValidationError::SelectionRequired {
        field: field.name().to_string(),
        item: item.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
