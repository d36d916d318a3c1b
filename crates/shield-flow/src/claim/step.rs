//! # Claim Steps and Transition Table
//!
//! ```text
//!  SelectPolicy(1) ──PolicySelected──► ClaimDetails(2) ──Submit──► Submitting
//!        ▲                                │      ▲                   │     │
//!        └──────────── Retreat ───────────┘      └── SubmitFailed ───┘     │
//!        ▲                                                                 │
//!        └──────────── Reset ───────────── Done ◄──── Submitted ───────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub enum ClaimStep {
    SelectPolicy,
    ClaimDetails,
}

impl ClaimStep {
    pub fn number(&self) -> u8 {
        match self {
            ClaimStep::SelectPolicy => 1,
            ClaimStep::ClaimDetails => 2,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ClaimStep::SelectPolicy => "Select Policy",
            ClaimStep::ClaimDetails => "Claim Details",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum ClaimState {
    Editing(ClaimStep),
    Submitting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimEvent {
    /// A policy row was picked; the pick is the step's validation.
    PolicySelected,
    Retreat,
    Submit,
    Submitted,
    SubmitFailed,
    Reset,
}

/// The claim transition table.
pub fn transition(state: ClaimState, event: ClaimEvent) -> Option<ClaimState> {
    use ClaimEvent as E;
    use ClaimState as S;
    use ClaimStep as C;

    match (state, event) {
        (S::Editing(C::SelectPolicy), E::PolicySelected) => Some(S::Editing(C::ClaimDetails)),
        (S::Editing(C::ClaimDetails), E::Retreat) => Some(S::Editing(C::SelectPolicy)),
        (S::Editing(C::ClaimDetails), E::Submit) => Some(S::Submitting),
        (S::Editing(_), E::Reset) => Some(S::Editing(C::SelectPolicy)),

        (S::Submitting, E::Submitted) => Some(S::Done),
        (S::Submitting, E::SubmitFailed) => Some(S::Editing(C::ClaimDetails)),

        (S::Done, E::Reset) => Some(S::Editing(C::SelectPolicy)),

        _ => None,
    }
}
