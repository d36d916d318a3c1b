//! # Claim Flow
//!
//! Two steps: pick a claimable policy, then describe what happened.
//!
//! ## Caller Modes
//! ```text
//! ┌──────────────────────────┬───────────────┬──────────┬────────────────────┐
//! │ Mode                     │ Loads on entry│ Search   │ Policies shown     │
//! ├──────────────────────────┼───────────────┼──────────┼────────────────────┤
//! │ SelfService { names }    │ yes           │ no       │ caller's, claimable│
//! │ Search                   │ no            │ yes      │ claimable matches  │
//! └──────────────────────────┴───────────────┴──────────┴────────────────────┘
//! ```
//!
//! ## Regions
//! Policy list, search and device outlets each have their own ticket slot
//! and loading flag, separate from the submission slot. A slow outlet list
//! never blocks picking a claim type.
//!
//! ## Claim Numbers
//! The flow suggests `CLM_<MM>/<NNN>/<YYYY>` in the request. Whatever the
//! backend returns in its receipt is what [`ClaimFiled`] reports.

pub mod draft;
pub mod step;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use shield_core::format::format;
use shield_core::types::{ClaimCategory, DeviceOutlet, PolicySummary};
use shield_core::ValidationError;
use shield_gateway::{AuthToken, ClaimReceipt, ClaimSubmission, Gateway, GatewayResult};

use crate::error::{FlowError, FlowResult, PreconditionError};
use crate::events::ClaimFiled;
use crate::form::{FormField, FormState};
use crate::ticket::{Operation, Ticket, TicketSlot};

pub use draft::{advisory_claim_number, claim_number, ClaimDraft, ClaimField};
pub use step::{transition, ClaimEvent, ClaimState, ClaimStep};

// =============================================================================
// Caller Mode
// =============================================================================

/// Who is filing the claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerMode {
    /// A policyholder claiming on their own policies.
    ///
    /// `names` are every name the holder may appear under on a policy,
    /// e.g. display name and username.
    SelfService { names: Vec<String> },
    /// An agent looking policies up by number or name.
    Search,
}

/// What a caller mode may do on step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub auto_load: bool,
    pub search: bool,
}

impl CallerMode {
    /// Self-service for a holder known by a single name.
    pub fn owner(name: impl Into<String>) -> Self {
        CallerMode::SelfService {
            names: vec![name.into()],
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            CallerMode::SelfService { .. } => Capabilities {
                auto_load: true,
                search: false,
            },
            CallerMode::Search => Capabilities {
                auto_load: false,
                search: true,
            },
        }
    }

    /// Keeps the policies this caller may claim against.
    fn admits(&self, policy: &PolicySummary) -> bool {
        match self {
            CallerMode::SelfService { names } => {
                names.iter().any(|name| policy.is_owned_by(name)) && policy.is_claimable()
            }
            CallerMode::Search => policy.is_claimable(),
        }
    }
}

/// Why the policy list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum PolicyListNotice {
    /// The search returned nothing.
    NoMatch,
    /// The search found policies, none claimable.
    NotActive,
    /// A self-service caller has nothing to claim against.
    NoActivePolicies,
}

impl PolicyListNotice {
    pub fn message(&self) -> &'static str {
        match self {
            PolicyListNotice::NoMatch => "No policies match your search.",
            PolicyListNotice::NotActive => {
                "Policy found but it is not active. Only active policies can be claimed."
            }
            PolicyListNotice::NoActivePolicies => "You have no active policies to claim against.",
        }
    }
}

impl fmt::Display for PolicyListNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything the claim screens render from.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClaimView {
    pub step: ClaimStep,
    pub step_number: u8,
    pub state: ClaimState,
    pub draft: ClaimDraft,
    pub errors: BTreeMap<String, String>,
    pub touched: Vec<String>,
    pub can_search: bool,
    pub policies: Vec<PolicySummary>,
    pub notice: Option<String>,
    pub policies_error: Option<String>,
    pub loading_policies: bool,
    pub outlets: Vec<DeviceOutlet>,
    pub outlets_error: Option<String>,
    pub loading_outlets: bool,
    pub can_submit: bool,
    pub submitting: bool,
    pub submit_error: Option<String>,
}

// =============================================================================
// Claim Flow
// =============================================================================

/// The claim state machine. Owns its draft.
#[derive(Debug)]
pub struct ClaimFlow {
    mode: CallerMode,
    token: Option<AuthToken>,
    state: ClaimState,
    draft: ClaimDraft,
    form: FormState<ClaimField>,

    policies: Vec<PolicySummary>,
    notice: Option<PolicyListNotice>,
    policies_error: Option<String>,
    policies_slot: TicketSlot,
    search_slot: TicketSlot,

    outlets: Vec<DeviceOutlet>,
    outlets_error: Option<String>,
    outlets_slot: TicketSlot,

    submit_error: Option<String>,
    advisory_number: Option<String>,
    in_flight: TicketSlot,
}

impl ClaimFlow {
    pub fn new(mode: CallerMode, token: Option<AuthToken>) -> Self {
        Self {
            mode,
            token,
            state: ClaimState::Editing(ClaimStep::SelectPolicy),
            draft: ClaimDraft::default(),
            form: FormState::default(),
            policies: Vec::new(),
            notice: None,
            policies_error: None,
            policies_slot: TicketSlot::default(),
            search_slot: TicketSlot::default(),
            outlets: Vec::new(),
            outlets_error: None,
            outlets_slot: TicketSlot::default(),
            submit_error: None,
            advisory_number: None,
            in_flight: TicketSlot::default(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn mode(&self) -> &CallerMode {
        &self.mode
    }

    pub fn state(&self) -> ClaimState {
        self.state
    }

    pub fn current_step(&self) -> ClaimStep {
        match self.state {
            ClaimState::Editing(step) => step,
            ClaimState::Submitting => ClaimStep::ClaimDetails,
            ClaimState::Done => ClaimStep::SelectPolicy,
        }
    }

    pub fn draft(&self) -> &ClaimDraft {
        &self.draft
    }

    pub fn form(&self) -> &FormState<ClaimField> {
        &self.form
    }

    /// Policies the caller may pick from.
    pub fn policies(&self) -> &[PolicySummary] {
        &self.policies
    }

    pub fn notice(&self) -> Option<PolicyListNotice> {
        self.notice
    }

    pub fn policies_error(&self) -> Option<&str> {
        self.policies_error.as_deref()
    }

    pub fn outlets(&self) -> &[DeviceOutlet] {
        &self.outlets
    }

    pub fn outlets_error(&self) -> Option<&str> {
        self.outlets_error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn is_loading_policies(&self) -> bool {
        self.policies_slot.is_pending() || self.search_slot.is_pending()
    }

    pub fn is_loading_outlets(&self) -> bool {
        self.outlets_slot.is_pending()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == ClaimState::Submitting
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        self.state == ClaimState::Editing(ClaimStep::ClaimDetails)
            && self.draft.policy.is_some()
            && self.draft.check_all().is_empty()
    }

    pub fn view(&self) -> ClaimView {
        let step = self.current_step();
        ClaimView {
            step,
            step_number: step.number(),
            state: self.state,
            draft: self.draft.clone(),
            errors: self.form.messages(),
            touched: self.form.touched_names(),
            can_search: self.mode.capabilities().search,
            policies: self.policies.clone(),
            notice: self.notice.map(|n| n.message().to_string()),
            policies_error: self.policies_error.clone(),
            loading_policies: self.is_loading_policies(),
            outlets: self.outlets.clone(),
            outlets_error: self.outlets_error.clone(),
            loading_outlets: self.is_loading_outlets(),
            can_submit: self.can_submit(),
            submitting: self.is_submitting(),
            submit_error: self.submit_error.clone(),
        }
    }

    // =========================================================================
    // Step 1: Policies
    // =========================================================================

    /// Starts the on-entry policy load. `None` for modes that do not load.
    pub fn begin_load_policies(&mut self) -> FlowResult<Option<Ticket>> {
        if !self.mode.capabilities().auto_load {
            return Ok(None);
        }
        self.require_token().map_err(|e| {
            self.policies_error = Some(e.to_string());
            e
        })?;
        let ticket = self
            .policies_slot
            .issue(Operation::LoadPolicies)
            .ok_or(FlowError::Busy)?;
        self.policies_error = None;
        Ok(Some(ticket))
    }

    /// Stores the caller's claimable policies; returns how many.
    pub fn complete_load_policies(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<Vec<PolicySummary>>,
    ) -> FlowResult<usize> {
        if !self.policies_slot.settle(ticket) {
            return Err(FlowError::Stale);
        }
        match result {
            Ok(all) => {
                let total = all.len();
                self.policies = all.into_iter().filter(|p| self.mode.admits(p)).collect();
                self.notice = self
                    .policies
                    .is_empty()
                    .then_some(PolicyListNotice::NoActivePolicies);
                info!(total, claimable = self.policies.len(), "Policies loaded");
                Ok(self.policies.len())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load policies");
                self.policies.clear();
                self.notice = None;
                self.policies_error = Some(e.to_string());
                Err(FlowError::Gateway(e))
            }
        }
    }

    /// Starts a policy search; returns the trimmed query to send.
    pub fn begin_search(&mut self, query: &str) -> FlowResult<(Ticket, String)> {
        if !self.mode.capabilities().search {
            return Err(FlowError::SearchNotAllowed);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(PreconditionError::EmptyQuery.into());
        }
        self.require_token()?;
        let ticket = self
            .search_slot
            .issue(Operation::SearchPolicies)
            .ok_or(FlowError::Busy)?;
        self.notice = None;
        self.policies_error = None;
        debug!("Searching policies");
        Ok((ticket, query.to_string()))
    }

    /// Shows the claimable matches and explains an empty list.
    pub fn complete_search(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<Vec<PolicySummary>>,
    ) -> FlowResult<usize> {
        if !self.search_slot.settle(ticket) {
            return Err(FlowError::Stale);
        }
        match result {
            Ok(found) => {
                let matched = found.len();
                self.policies = found.into_iter().filter(|p| self.mode.admits(p)).collect();
                self.notice = if matched == 0 {
                    Some(PolicyListNotice::NoMatch)
                } else if self.policies.is_empty() {
                    Some(PolicyListNotice::NotActive)
                } else {
                    None
                };
                info!(matched, claimable = self.policies.len(), "Policy search finished");
                Ok(self.policies.len())
            }
            Err(e) => {
                warn!(error = %e, "Policy search failed");
                self.policies.clear();
                self.notice = None;
                self.policies_error = Some(e.to_string());
                Err(FlowError::Gateway(e))
            }
        }
    }

    /// Picks a listed policy and moves to step 2.
    ///
    /// Returns the ticket for the outlet fetch that step 2 needs, or `None`
    /// when it cannot be started (see [`outlets_error`](Self::outlets_error)).
    pub fn select_policy(&mut self, policy_id: i64) -> FlowResult<Option<Ticket>> {
        match self.state {
            ClaimState::Editing(ClaimStep::SelectPolicy) => {}
            ClaimState::Submitting => return Err(FlowError::Busy),
            other => return Err(FlowError::illegal(other, ClaimEvent::PolicySelected)),
        }
        let policy = self
            .policies
            .iter()
            .find(|p| p.id == policy_id)
            .cloned()
            .ok_or(FlowError::UnknownPolicy(policy_id))?;

        self.draft.policy = Some(policy);
        self.apply(ClaimEvent::PolicySelected)?;
        Ok(self.begin_load_outlets())
    }

    // =========================================================================
    // Step 2: Details
    // =========================================================================

    /// (Re)starts the outlet fetch, superseding any pending one.
    pub fn begin_load_outlets(&mut self) -> Option<Ticket> {
        if let Err(e) = self.require_token() {
            warn!("Cannot load device outlets without a token");
            self.outlets_error = Some(e.to_string());
            return None;
        }
        self.outlets_slot.abandon();
        self.outlets_error = None;
        self.outlets_slot.issue(Operation::LoadOutlets)
    }

    pub fn complete_outlets(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<Vec<DeviceOutlet>>,
    ) -> FlowResult<usize> {
        if !self.outlets_slot.settle(ticket) {
            return Err(FlowError::Stale);
        }
        match result {
            Ok(outlets) => {
                debug!(count = outlets.len(), "Device outlets loaded");
                let keep = self
                    .draft
                    .outlet
                    .as_ref()
                    .is_some_and(|o| outlets.iter().any(|n| n.id == o.id));
                if !keep {
                    self.draft.outlet = None;
                }
                self.outlets = outlets;
                Ok(self.outlets.len())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load device outlets");
                self.outlets.clear();
                self.outlets_error = Some(e.to_string());
                Err(FlowError::Gateway(e))
            }
        }
    }

    /// Stores a typed value, formatted for its field, and clears its error.
    pub fn set_field(&mut self, field: ClaimField, value: &str) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        let slot = self
            .draft
            .text_mut(field)
            .ok_or(FlowError::NotTextField(field.name()))?;
        *slot = format(field.name(), value);
        self.form.clear(field);
        Ok(())
    }

    pub fn blur(&mut self, field: ClaimField) {
        self.form.touch(field);
        self.form.record(field, self.draft.check(field));
    }

    pub fn select_claim_type(&mut self, claim_type: ClaimCategory) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        self.draft.claim_type = Some(claim_type);
        self.form.clear(ClaimField::ClaimType);
        Ok(())
    }

    /// Picks one of the loaded outlets.
    pub fn select_outlet(&mut self, outlet_id: i64) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        let outlet = self
            .outlets
            .iter()
            .find(|o| o.id == outlet_id)
            .cloned()
            .ok_or(FlowError::UnknownOutlet(outlet_id))?;
        self.draft.outlet = Some(outlet);
        self.form.clear(ClaimField::DeviceOutlet);
        Ok(())
    }

    /// Back to the policy list. Entered details are kept.
    pub fn go_back(&mut self) -> FlowResult<ClaimStep> {
        self.ensure_not_submitting()?;
        self.outlets_slot.abandon();
        self.apply(ClaimEvent::Retreat)?;
        Ok(self.current_step())
    }

    /// Clears the draft and returns to step 1. Loaded lists stay.
    pub fn cancel(&mut self) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        self.outlets_slot.abandon();
        self.apply(ClaimEvent::Reset)?;
        self.clear_draft();
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    pub fn begin_submit(&mut self, today: NaiveDate) -> FlowResult<(Ticket, ClaimSubmission)> {
        match self.state {
            ClaimState::Editing(ClaimStep::ClaimDetails) => {}
            ClaimState::Submitting => return Err(FlowError::Busy),
            other => return Err(FlowError::illegal(other, ClaimEvent::Submit)),
        }

        if let Some(policy) = self.draft.policy.as_ref().filter(|p| !p.is_claimable()) {
            let reason = PreconditionError::PolicyNotClaimable {
                policy_number: policy.policy_number.clone(),
            };
            self.submit_error = Some(reason.to_string());
            return Err(reason.into());
        }

        let errors = self.draft.check_all();
        if !errors.is_empty() {
            let count = self.form.replace(errors);
            return Err(FlowError::Validation { count });
        }
        self.require_token().map_err(|e| {
            self.submit_error = Some(e.to_string());
            e
        })?;

        let number = advisory_claim_number(today, &mut rand::thread_rng());
        let submission = match self.draft.to_submission(number.clone()) {
            Ok(Some(submission)) => submission,
            Ok(None) => return Err(FlowError::illegal(self.state, ClaimEvent::Submit)),
            Err(e) => return Err(self.reject_payload(e)),
        };

        let ticket = self
            .in_flight
            .issue(Operation::SubmitClaim)
            .ok_or(FlowError::Busy)?;
        self.submit_error = None;
        self.advisory_number = Some(number);
        self.apply(ClaimEvent::Submit)?;
        info!(
            policy = submission.policy,
            claim_type = %submission.claim_type,
            "Submitting claim"
        );
        Ok((ticket, submission))
    }

    pub fn complete_submit(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<ClaimReceipt>,
    ) -> FlowResult<ClaimFiled> {
        if !self.in_flight.settle(ticket) {
            return Err(FlowError::Stale);
        }
        let advisory = self.advisory_number.take().unwrap_or_default();

        match result {
            Ok(receipt) => {
                let policy_id = self.draft.policy.as_ref().map(|p| p.id).unwrap_or_default();
                let claim_number = receipt.claim_number.unwrap_or(advisory);
                self.apply(ClaimEvent::Submitted)?;
                self.clear_draft();
                info!(%claim_number, claim_id = ?receipt.id, "Claim filed");
                Ok(ClaimFiled {
                    claim_number,
                    claim_id: receipt.id,
                    policy_id,
                })
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), "Claim submission failed");
                self.submit_error = Some(e.to_string());
                self.apply(ClaimEvent::SubmitFailed)?;
                Err(FlowError::Gateway(e))
            }
        }
    }

    // =========================================================================
    // One-shot helpers
    // =========================================================================

    /// Runs the on-entry load for modes that have one.
    pub async fn enter(&mut self, gateway: &dyn Gateway) -> FlowResult<usize> {
        match self.begin_load_policies()? {
            Some(ticket) => {
                let result = gateway.fetch_policies(self.token.as_ref()).await;
                self.complete_load_policies(ticket, result)
            }
            None => Ok(0),
        }
    }

    pub async fn search(&mut self, gateway: &dyn Gateway, query: &str) -> FlowResult<usize> {
        let (ticket, query) = self.begin_search(query)?;
        let result = gateway.search_policies(self.token.as_ref(), &query).await;
        self.complete_search(ticket, result)
    }

    /// Picks a policy and loads the outlets for step 2.
    ///
    /// An outlet failure is left in [`outlets_error`](Self::outlets_error);
    /// the step change stands.
    pub async fn choose_policy(
        &mut self,
        gateway: &dyn Gateway,
        policy_id: i64,
    ) -> FlowResult<ClaimStep> {
        if let Some(ticket) = self.select_policy(policy_id)? {
            let result = gateway.fetch_device_outlets(self.token.as_ref()).await;
            // A gateway failure is also kept in outlets_error.
            if let Err(e) = self.complete_outlets(ticket, result) {
                debug!(error = %e, "Outlet list not applied");
            }
        }
        Ok(self.current_step())
    }

    pub async fn submit(&mut self, gateway: &dyn Gateway) -> FlowResult<ClaimFiled> {
        let (ticket, submission) = self.begin_submit(Local::now().date_naive())?;
        let result = gateway.submit_claim(self.token.as_ref(), &submission).await;
        self.complete_submit(ticket, result)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Surfaces an error from building the submission, which the field
    /// checks should already have caught.
    fn reject_payload(&mut self, error: ValidationError) -> FlowError {
        warn!(field = error.field(), error = %error, "Claim submission could not be built");
        if let Err(unfiled) = self.form.file(&ClaimField::ALL, error) {
            self.submit_error = Some(unfiled.to_string());
        }
        FlowError::Validation {
            count: self.form.error_count().max(1),
        }
    }

    fn apply(&mut self, event: ClaimEvent) -> FlowResult<ClaimState> {
        let next =
            transition(self.state, event).ok_or_else(|| FlowError::illegal(self.state, event))?;
        if next != self.state {
            info!(from = ?self.state, to = ?next, "Claim state changed");
            self.state = next;
        }
        Ok(next)
    }

    fn require_token(&self) -> FlowResult<()> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(PreconditionError::MissingToken.into()),
        }
    }

    fn ensure_not_submitting(&self) -> FlowResult<()> {
        if self.is_submitting() {
            debug!("Ignoring action while the claim is being submitted");
            return Err(FlowError::Busy);
        }
        Ok(())
    }

    fn clear_draft(&mut self) {
        self.draft = ClaimDraft::default();
        self.form.reset();
        self.submit_error = None;
        self.advisory_number = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{policy, token, ScriptedGateway};
    use shield_gateway::GatewayError;

    fn self_service() -> ClaimFlow {
        ClaimFlow::new(CallerMode::owner("Amina Otieno"), Some(token()))
    }

    fn own_policies() -> Vec<PolicySummary> {
        vec![
            policy(1, "Active", "Amina Otieno"),
            policy(2, "Draft", "Amina Otieno"),
            policy(3, "active", "Brian Kamau"),
            policy(4, "Created", "amina otieno"),
        ]
    }

    fn fill_details(flow: &mut ClaimFlow) {
        flow.select_claim_type(ClaimCategory::LiquidDamage).unwrap();
        flow.set_field(ClaimField::IncidentDate, "2025-03-02").unwrap();
        flow.set_field(ClaimField::Description, "Fell into a sink").unwrap();
        flow.set_field(ClaimField::EstimatedCost, "8500.50").unwrap();
        flow.select_outlet(11).unwrap();
    }

    async fn ready_to_submit(gateway: &ScriptedGateway) -> ClaimFlow {
        let mut flow = self_service();
        flow.enter(gateway).await.unwrap();
        flow.choose_policy(gateway, 1).await.unwrap();
        fill_details(&mut flow);
        flow
    }

    #[tokio::test]
    async fn test_self_service_loads_own_claimable_policies() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = self_service();

        assert_eq!(flow.enter(&gateway).await.unwrap(), 2);
        let ids: Vec<i64> = flow.policies().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(flow.notice(), None);
        assert_eq!(gateway.calls("fetch_policies"), 1);
    }

    #[tokio::test]
    async fn test_self_service_matches_display_name_or_username() {
        let gateway = ScriptedGateway::new().with_policies(vec![
            policy(1, "Active", "Amina Otieno"),
            policy(5, "Active", "aotieno"),
            policy(6, "Created", "AOTIENO"),
            policy(3, "Active", "Brian Kamau"),
        ]);
        let mut flow = ClaimFlow::new(
            CallerMode::SelfService {
                names: vec!["Amina Otieno".into(), "aotieno".into()],
            },
            Some(token()),
        );

        assert_eq!(flow.enter(&gateway).await.unwrap(), 3);
        let ids: Vec<i64> = flow.policies().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 5, 6]);
    }

    #[tokio::test]
    async fn test_self_service_without_names_sees_nothing() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ClaimFlow::new(CallerMode::SelfService { names: vec![] }, Some(token()));

        assert_eq!(flow.enter(&gateway).await.unwrap(), 0);
        assert_eq!(flow.notice(), Some(PolicyListNotice::NoActivePolicies));
    }

    #[tokio::test]
    async fn test_self_service_with_nothing_to_claim() {
        let gateway = ScriptedGateway::new().with_policies(vec![policy(2, "Lapsed", "Amina Otieno")]);
        let mut flow = self_service();

        assert_eq!(flow.enter(&gateway).await.unwrap(), 0);
        assert_eq!(
            flow.view().notice.as_deref(),
            Some("You have no active policies to claim against.")
        );
    }

    #[tokio::test]
    async fn test_search_mode_does_not_autoload() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ClaimFlow::new(CallerMode::Search, Some(token()));

        assert_eq!(flow.begin_load_policies(), Ok(None));
        assert_eq!(flow.enter(&gateway).await.unwrap(), 0);
        assert!(flow.policies().is_empty());
        assert_eq!(gateway.total_calls(), 0);
        assert!(flow.view().can_search);
    }

    #[tokio::test]
    async fn test_search_not_found_is_empty_not_error() {
        let gateway = ScriptedGateway::new().push_search(Ok(vec![]));
        let mut flow = ClaimFlow::new(CallerMode::Search, Some(token()));

        assert_eq!(flow.search(&gateway, "POL-404").await.unwrap(), 0);
        assert_eq!(flow.notice(), Some(PolicyListNotice::NoMatch));
        assert_eq!(flow.notice().unwrap().message(), "No policies match your search.");
        assert_eq!(flow.policies_error(), None);
    }

    #[tokio::test]
    async fn test_search_found_but_not_active() {
        let gateway =
            ScriptedGateway::new().push_search(Ok(vec![policy(5, "draft", "Brian Kamau")]));
        let mut flow = ClaimFlow::new(CallerMode::Search, Some(token()));

        assert_eq!(flow.search(&gateway, "POL-0005").await.unwrap(), 0);
        assert!(flow.policies().is_empty());
        assert_eq!(flow.notice(), Some(PolicyListNotice::NotActive));
        assert_ne!(
            PolicyListNotice::NotActive.message(),
            PolicyListNotice::NoMatch.message()
        );
    }

    #[tokio::test]
    async fn test_search_error_is_surfaced() {
        let gateway = ScriptedGateway::new().push_search(Err(GatewayError::Http {
            status: 500,
            message: "boom".into(),
        }));
        let mut flow = ClaimFlow::new(CallerMode::Search, Some(token()));

        assert!(matches!(
            flow.search(&gateway, "Kamau").await,
            Err(FlowError::Gateway(_))
        ));
        assert!(flow.policies_error().is_some());
        assert_eq!(flow.notice(), None);
    }

    #[tokio::test]
    async fn test_search_preconditions_stay_local() {
        let gateway = ScriptedGateway::new();
        let mut agent = ClaimFlow::new(CallerMode::Search, Some(token()));
        assert_eq!(
            agent.search(&gateway, "   ").await,
            Err(FlowError::Precondition(PreconditionError::EmptyQuery))
        );

        let mut anonymous = ClaimFlow::new(CallerMode::Search, None);
        assert_eq!(
            anonymous.search(&gateway, "POL-1").await,
            Err(FlowError::Precondition(PreconditionError::MissingToken))
        );

        let mut holder = self_service();
        assert_eq!(
            holder.search(&gateway, "POL-1").await,
            Err(FlowError::SearchNotAllowed)
        );
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_selecting_a_policy_moves_on_and_loads_outlets() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = self_service();
        flow.enter(&gateway).await.unwrap();

        assert_eq!(flow.select_policy(2), Err(FlowError::UnknownPolicy(2)));
        assert_eq!(
            flow.choose_policy(&gateway, 4).await.unwrap(),
            ClaimStep::ClaimDetails
        );
        assert_eq!(flow.draft().policy.as_ref().map(|p| p.id), Some(4));
        assert_eq!(flow.outlets().len(), 2);
        assert_eq!(gateway.calls("fetch_device_outlets"), 1);
    }

    #[tokio::test]
    async fn test_outlet_failure_keeps_the_step_and_reports_it() {
        let gateway = ScriptedGateway::new()
            .with_policies(own_policies())
            .push_outlets(Err(GatewayError::Http {
                status: 503,
                message: "Service unavailable".into(),
            }));
        let mut flow = self_service();
        flow.enter(&gateway).await.unwrap();

        assert_eq!(
            flow.choose_policy(&gateway, 1).await.unwrap(),
            ClaimStep::ClaimDetails
        );
        assert!(flow.outlets().is_empty());
        assert!(flow.outlets_error().is_some());
        assert!(!flow.is_loading_outlets());

        // Picking again retries the list.
        flow.go_back().unwrap();
        flow.choose_policy(&gateway, 1).await.unwrap();
        assert_eq!(flow.outlets().len(), 2);
        assert_eq!(flow.outlets_error(), None);
    }

    #[tokio::test]
    async fn test_outlets_from_an_abandoned_visit_are_dropped() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = self_service();
        flow.enter(&gateway).await.unwrap();

        let first = flow.select_policy(1).unwrap().unwrap();
        flow.go_back().unwrap();
        let second = flow.select_policy(4).unwrap().unwrap();

        assert_eq!(
            flow.complete_outlets(first, Ok(crate::testing::outlets())),
            Err(FlowError::Stale)
        );
        assert!(flow.is_loading_outlets());
        assert_eq!(flow.complete_outlets(second, Ok(crate::testing::outlets())), Ok(2));
    }

    #[tokio::test]
    async fn test_submit_enabled_only_when_complete() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = self_service();
        flow.enter(&gateway).await.unwrap();
        assert!(!flow.can_submit());
        flow.choose_policy(&gateway, 1).await.unwrap();

        flow.select_claim_type(ClaimCategory::Theft).unwrap();
        flow.set_field(ClaimField::IncidentDate, "2025-03-02").unwrap();
        flow.set_field(ClaimField::Description, "Stolen on a matatu").unwrap();
        assert!(!flow.can_submit());
        flow.set_field(ClaimField::EstimatedCost, "45,000").unwrap();
        assert_eq!(flow.draft().estimated_cost, "45000");
        assert!(!flow.can_submit());
        flow.select_outlet(10).unwrap();
        assert!(flow.can_submit());

        flow.set_field(ClaimField::Description, "").unwrap();
        assert!(!flow.can_submit());
    }

    #[tokio::test]
    async fn test_server_claim_number_wins() {
        let gateway = ScriptedGateway::new()
            .with_policies(own_policies())
            .push_claim_receipt(Ok(ClaimReceipt {
                id: Some(12),
                claim_number: Some("CLM_03/555/2025".into()),
            }));
        let mut flow = ready_to_submit(&gateway).await;

        let filed = flow.submit(&gateway).await.unwrap();
        assert_eq!(filed.claim_number, "CLM_03/555/2025");
        assert_eq!(filed.claim_id, Some(12));
        assert_eq!(filed.policy_id, 1);

        let sent = &gateway.claims()[0];
        assert!(sent.claim_number.starts_with("CLM_"));
        assert_eq!(sent.estimated_cost, "8500.50");
        assert_eq!(sent.device_outlet, 11);
        assert_eq!(flow.state(), ClaimState::Done);
        assert_eq!(flow.draft(), &ClaimDraft::default());
    }

    #[tokio::test]
    async fn test_advisory_number_used_when_server_sends_none() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;

        let filed = flow.submit(&gateway).await.unwrap();
        assert_eq!(filed.claim_number, gateway.claims()[0].claim_number);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_claim() {
        let gateway = ScriptedGateway::new()
            .with_policies(own_policies())
            .push_claim_receipt(Err(GatewayError::Http {
                status: 400,
                message: "incident_date: cannot be in the future".into(),
            }));
        let mut flow = ready_to_submit(&gateway).await;
        let before = flow.draft().clone();

        assert!(flow.submit(&gateway).await.is_err());
        assert_eq!(flow.current_step(), ClaimStep::ClaimDetails);
        assert_eq!(flow.draft(), &before);
        assert!(flow.submit_error().unwrap().contains("cannot be in the future"));
        assert!(flow.can_submit());
    }

    #[tokio::test]
    async fn test_double_submit_is_refused() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        let (ticket, body) = flow.begin_submit(today).unwrap();
        assert!(body.claim_number.starts_with("CLM_03/"));
        assert!(body.claim_number.ends_with("/2025"));
        assert_eq!(flow.begin_submit(today).unwrap_err(), FlowError::Busy);
        assert_eq!(flow.go_back(), Err(FlowError::Busy));
        assert!(!flow.can_submit());

        let filed = flow.complete_submit(ticket, Ok(ClaimReceipt::default())).unwrap();
        assert_eq!(filed.claim_number, body.claim_number);
    }

    #[tokio::test]
    async fn test_submit_without_token_never_calls() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;
        flow.token = None;

        assert_eq!(
            flow.submit(&gateway).await,
            Err(FlowError::Precondition(PreconditionError::MissingToken))
        );
        assert_eq!(gateway.calls("submit_claim"), 0);
    }

    #[tokio::test]
    async fn test_invalid_details_block_submit() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;
        flow.set_field(ClaimField::IncidentDate, "03/02/2025").unwrap();

        assert_eq!(
            flow.submit(&gateway).await,
            Err(FlowError::Validation { count: 1 })
        );
        assert_eq!(
            flow.view().errors.get("incidentDate").map(String::as_str),
            Some("Please enter a valid date (YYYY-MM-DD)")
        );
        assert_eq!(gateway.calls("submit_claim"), 0);
    }

    #[tokio::test]
    async fn test_huge_cost_is_reported_on_the_field() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;
        flow.set_field(ClaimField::EstimatedCost, "99999999999999999999")
            .unwrap();
        flow.blur(ClaimField::EstimatedCost);
        assert!(!flow.can_submit());

        assert_eq!(
            flow.submit(&gateway).await,
            Err(FlowError::Validation { count: 1 })
        );
        assert_eq!(
            flow.view().errors.get("estimatedCost").map(String::as_str),
            Some("Please enter a valid price (e.g., 999.99)")
        );
        assert_eq!(flow.current_step(), ClaimStep::ClaimDetails);
        assert_eq!(gateway.calls("submit_claim"), 0);
    }

    #[tokio::test]
    async fn test_every_submit_refusal_is_visible() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        let breakages: [fn(&mut ClaimFlow); 4] = [
            |flow: &mut ClaimFlow| flow.token = None,
            |flow: &mut ClaimFlow| flow.draft.policy = Some(policy(2, "Draft", "Amina Otieno")),
            |flow: &mut ClaimFlow| flow.set_field(ClaimField::Description, " ").unwrap(),
            |flow: &mut ClaimFlow| {
                flow.set_field(ClaimField::EstimatedCost, "99999999999999999999")
                    .unwrap()
            },
        ];

        for (i, breakage) in breakages.into_iter().enumerate() {
            let mut flow = ready_to_submit(&gateway).await;
            breakage(&mut flow);

            assert!(flow.begin_submit(today).is_err(), "case {i} was accepted");
            let view = flow.view();
            assert!(
                !view.errors.is_empty() || view.submit_error.is_some(),
                "case {i} left no message"
            );
            assert_eq!(view.step, ClaimStep::ClaimDetails);
        }
        assert_eq!(gateway.calls("submit_claim"), 0);
    }

    #[test]
    fn test_unbuildable_submission_lands_on_a_field_or_banner() {
        let mut flow = self_service();

        let err = flow.reject_payload(ValidationError::InvalidPrice {
            field: "estimatedCost".into(),
        });
        assert_eq!(err, FlowError::Validation { count: 1 });
        assert!(flow.form().error(ClaimField::EstimatedCost).is_some());
        assert_eq!(flow.submit_error(), None);

        let mut flow = self_service();
        flow.reject_payload(ValidationError::Required {
            field: "policy".into(),
        });
        assert!(!flow.form().has_errors());
        assert_eq!(flow.submit_error(), Some("This field is required."));
    }

    #[tokio::test]
    async fn test_back_keeps_details() {
        let gateway = ScriptedGateway::new().with_policies(own_policies());
        let mut flow = ready_to_submit(&gateway).await;

        assert_eq!(flow.go_back().unwrap(), ClaimStep::SelectPolicy);
        assert_eq!(flow.draft().description, "Fell into a sink");
        flow.cancel().unwrap();
        assert_eq!(flow.draft(), &ClaimDraft::default());
        assert_eq!(flow.policies().len(), 2);
    }
}
