//! # Purchase Steps and Transition Table
//!
//! ```text
//!  SelectDevice(1) ─► PersonalInfo(2) ─► DeviceDetails(3) ──Advance──► FetchingPlans
//!        ▲                 ▲    ▲              ▲    ▲                      │   │   │
//!        │                 │    └──── Retreat ─┼────┼──────────────────────┘   │   │
//!        │                 │                   │    └────── PlansFailed ───────┘   │
//!        │                 │                   │                                   │
//!        │                 │            PlanSelection(4) ◄──── PlansLoaded ────────┘
//!        │                 │                   │
//!        │                 │               Payment(5) ─► Review(6) ──Submit──► Submitting
//!        │                 │                                ▲                   │     │
//!        │                 │                                └── SubmitFailed ───┘     │
//!        └──────────── Reset ───────────────── Done ◄──────── Submitted ──────────────┘
//! ```
//!
//! Every `{state, event}` pair not listed in [`transition`] is illegal and
//! leaves the state unchanged.

use serde::Serialize;
use ts_rs::TS;

use super::draft::PurchaseField;

/// A user-visible page of the purchase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub enum PurchaseStep {
    SelectDevice,
    PersonalInfo,
    DeviceDetails,
    PlanSelection,
    Payment,
    Review,
}

impl PurchaseStep {
    pub const ALL: [PurchaseStep; 6] = [
        PurchaseStep::SelectDevice,
        PurchaseStep::PersonalInfo,
        PurchaseStep::DeviceDetails,
        PurchaseStep::PlanSelection,
        PurchaseStep::Payment,
        PurchaseStep::Review,
    ];

    /// 1-based position shown in the progress bar.
    pub fn number(&self) -> u8 {
        match self {
            PurchaseStep::SelectDevice => 1,
            PurchaseStep::PersonalInfo => 2,
            PurchaseStep::DeviceDetails => 3,
            PurchaseStep::PlanSelection => 4,
            PurchaseStep::Payment => 5,
            PurchaseStep::Review => 6,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PurchaseStep::SelectDevice => "Select Device",
            PurchaseStep::PersonalInfo => "Personal Information",
            PurchaseStep::DeviceDetails => "Device Details",
            PurchaseStep::PlanSelection => "Choose Plan",
            PurchaseStep::Payment => "Payment",
            PurchaseStep::Review => "Review & Submit",
        }
    }

    pub fn next(&self) -> Option<PurchaseStep> {
        Self::ALL.get(self.number() as usize).copied()
    }

    pub fn previous(&self) -> Option<PurchaseStep> {
        (self.number() as usize)
            .checked_sub(2)
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Fields that must pass before leaving this step forwards.
    pub fn required_fields(&self) -> &'static [PurchaseField] {
        use PurchaseField::*;
        match self {
            PurchaseStep::SelectDevice => &[Device],
            PurchaseStep::PersonalInfo => &[FirstName, LastName, Email, Phone, Gender, IdNumber],
            PurchaseStep::DeviceDetails => &[
                DeviceBrand,
                DeviceModel,
                DeviceDescription,
                PurchaseDate,
                SerialNumber,
                ImeiNumber,
                DevicePrice,
            ],
            PurchaseStep::PlanSelection => &[PricingPlan],
            PurchaseStep::Payment => &[PaymentAccountName, MpesaPhoneNumber],
            PurchaseStep::Review => &[],
        }
    }
}

/// Where the purchase flow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum PurchaseState {
    /// On a step, accepting edits.
    Editing(PurchaseStep),
    /// Device details passed; waiting for pricing plans.
    FetchingPlans,
    /// Application sent; waiting for the backend.
    Submitting,
    /// Policy created and draft cleared.
    Done,
}

/// Something that moves the purchase flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseEvent {
    /// "Continue", after the step's fields passed.
    Advance,
    /// "Back".
    Retreat,
    PlansLoaded,
    PlansFailed,
    Submit,
    Submitted,
    SubmitFailed,
    /// Cancel, or start over after success.
    Reset,
}

/// The purchase transition table.
///
/// ## Example
/// ```rust
/// use shield_flow::purchase::{transition, PurchaseEvent, PurchaseState, PurchaseStep};
///
/// let details = PurchaseState::Editing(PurchaseStep::DeviceDetails);
/// assert_eq!(transition(details, PurchaseEvent::Advance), Some(PurchaseState::FetchingPlans));
/// assert_eq!(transition(PurchaseState::Submitting, PurchaseEvent::Retreat), None);
/// ```
pub fn transition(state: PurchaseState, event: PurchaseEvent) -> Option<PurchaseState> {
    use PurchaseEvent as E;
    use PurchaseState as S;
    use PurchaseStep as P;

    match (state, event) {
        (S::Editing(P::DeviceDetails), E::Advance) => Some(S::FetchingPlans),
        (S::Editing(P::Review), E::Advance) => None,
        (S::Editing(step), E::Advance) => step.next().map(S::Editing),
        (S::Editing(step), E::Retreat) => step.previous().map(S::Editing),
        (S::Editing(P::Review), E::Submit) => Some(S::Submitting),
        (S::Editing(_), E::Reset) => Some(S::Editing(P::SelectDevice)),

        (S::FetchingPlans, E::PlansLoaded) => Some(S::Editing(P::PlanSelection)),
        (S::FetchingPlans, E::PlansFailed) => Some(S::Editing(P::DeviceDetails)),
        (S::FetchingPlans, E::Retreat) => Some(S::Editing(P::PersonalInfo)),
        (S::FetchingPlans, E::Reset) => Some(S::Editing(P::SelectDevice)),

        (S::Submitting, E::Submitted) => Some(S::Done),
        (S::Submitting, E::SubmitFailed) => Some(S::Editing(P::Review)),

        (S::Done, E::Reset) => Some(S::Editing(P::SelectDevice)),

        _ => None,
    }
}
