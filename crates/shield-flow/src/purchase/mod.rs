//! # Purchase Flow
//!
//! Six steps from "which device?" to a created policy.
//!
//! ## Lifecycle
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  set_field / blur / select_*      edit the draft, never move the step     │
//! │                                                                           │
//! │  begin_advance ──► step fields valid? ──no──► errors stored, stay         │
//! │                          │ yes                                            │
//! │                          ├── step 3 ──► Ticket(FetchPlans) ──► caller     │
//! │                          │              complete_plan_fetch(ticket, res)  │
//! │                          └── else ───► next step                          │
//! │                                                                           │
//! │  begin_submit ──► essentials, token, all fields ──► Ticket(SubmitPolicy)  │
//! │                   complete_submit(ticket, res)                            │
//! │                     ├── Ok  ──► Done, draft cleared, PolicyCreated        │
//! │                     └── Err ──► back on Review, draft untouched           │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers that own the flow can use [`PurchaseFlow::next`] and
//! [`PurchaseFlow::submit`], which run begin, gateway call and complete in
//! one go. A UI that keeps handling input while a request is out uses the
//! `begin_*` / `complete_*` pair instead.

pub mod draft;
pub mod step;

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use shield_core::format::format;
use shield_core::pricing::{quote, Quote};
use shield_core::types::{DeviceCategory, PricingPlan};
use shield_core::ValidationError;
use shield_gateway::{AuthToken, Gateway, GatewayResult, PolicyApplication, PolicyReceipt};

use crate::error::{FlowError, FlowResult, PreconditionError};
use crate::events::PolicyCreated;
use crate::form::{FormField, FormState};
use crate::ticket::{Operation, Ticket, TicketSlot};

pub use draft::{PurchaseDraft, PurchaseField};
pub use step::{transition, PurchaseEvent, PurchaseState, PurchaseStep};

/// Prefix of locally generated policy numbers.
pub const PLACEHOLDER_PREFIX: &str = "DS-";

const PLACEHOLDER_LEN: usize = 9;
const PLACEHOLDER_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Outcome of a successful "Continue".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to this step.
    Moved(PurchaseStep),
    /// Device details passed; fetch plans and hand the result to
    /// [`PurchaseFlow::complete_plan_fetch`].
    FetchPlans(Ticket),
}

/// Everything the purchase screens render from.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PurchaseView {
    pub step: PurchaseStep,
    pub step_number: u8,
    pub state: PurchaseState,
    pub draft: PurchaseDraft,
    pub errors: BTreeMap<String, String>,
    pub touched: Vec<String>,
    pub plans: Vec<PricingPlan>,
    pub loading_plans: bool,
    pub submitting: bool,
    pub plan_error: Option<String>,
    pub submit_error: Option<String>,
    pub quote: Quote,
}

/// The purchase state machine. Owns its draft.
#[derive(Debug)]
pub struct PurchaseFlow {
    state: PurchaseState,
    draft: PurchaseDraft,
    form: FormState<PurchaseField>,
    plans: Vec<PricingPlan>,
    plan_error: Option<String>,
    submit_error: Option<String>,
    in_flight: TicketSlot,
    token: Option<AuthToken>,
}

impl PurchaseFlow {
    /// Starts an empty purchase on step 1.
    pub fn new(token: Option<AuthToken>) -> Self {
        Self {
            state: PurchaseState::Editing(PurchaseStep::SelectDevice),
            draft: PurchaseDraft::default(),
            form: FormState::default(),
            plans: Vec::new(),
            plan_error: None,
            submit_error: None,
            in_flight: TicketSlot::default(),
            token,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn state(&self) -> PurchaseState {
        self.state
    }

    /// Step the screens should show.
    pub fn current_step(&self) -> PurchaseStep {
        match self.state {
            PurchaseState::Editing(step) => step,
            PurchaseState::FetchingPlans => PurchaseStep::DeviceDetails,
            PurchaseState::Submitting => PurchaseStep::Review,
            PurchaseState::Done => PurchaseStep::SelectDevice,
        }
    }

    pub fn draft(&self) -> &PurchaseDraft {
        &self.draft
    }

    pub fn form(&self) -> &FormState<PurchaseField> {
        &self.form
    }

    /// Plans from the last successful fetch.
    pub fn plans(&self) -> &[PricingPlan] {
        &self.plans
    }

    pub fn plan_error(&self) -> Option<&str> {
        self.plan_error.as_deref()
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn is_loading_plans(&self) -> bool {
        self.state == PurchaseState::FetchingPlans
    }

    pub fn is_submitting(&self) -> bool {
        self.state == PurchaseState::Submitting
    }

    /// Live premium for the current price and plan.
    pub fn quote(&self) -> Quote {
        quote(&self.draft.device_price, self.draft.plan.as_ref())
    }

    pub fn view(&self) -> PurchaseView {
        let step = self.current_step();
        PurchaseView {
            step,
            step_number: step.number(),
            state: self.state,
            draft: self.draft.clone(),
            errors: self.form.messages(),
            touched: self.form.touched_names(),
            plans: self.plans.clone(),
            loading_plans: self.is_loading_plans(),
            submitting: self.is_submitting(),
            plan_error: self.plan_error.clone(),
            submit_error: self.submit_error.clone(),
            quote: self.quote(),
        }
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Stores a typed value, formatted for its field, and clears its error.
    pub fn set_field(&mut self, field: PurchaseField, value: &str) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        let slot = self
            .draft
            .text_mut(field)
            .ok_or(FlowError::NotTextField(field.name()))?;
        *slot = format(field.name(), value);
        self.form.clear(field);
        Ok(())
    }

    /// Marks a field touched and re-checks just that field.
    pub fn blur(&mut self, field: PurchaseField) {
        self.form.touch(field);
        self.form.record(field, self.draft.check(field));
    }

    pub fn select_device(&mut self, device: DeviceCategory) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        self.draft.device = Some(device);
        self.form.clear(PurchaseField::Device);
        Ok(())
    }

    /// Picks one of the fetched plans.
    pub fn select_plan(&mut self, plan_id: i64) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        let plan = self
            .plans
            .iter()
            .find(|p| p.id == plan_id)
            .cloned()
            .ok_or(FlowError::UnknownPlan(plan_id))?;
        self.draft.plan = Some(plan);
        self.form.clear(PurchaseField::PricingPlan);
        Ok(())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// One step back, without validation.
    ///
    /// Leaving while plans are loading abandons that fetch.
    pub fn go_back(&mut self) -> FlowResult<PurchaseStep> {
        self.ensure_not_submitting()?;
        if self.in_flight.abandon().is_some() {
            debug!("Abandoned pricing plan fetch");
        }
        self.apply(PurchaseEvent::Retreat)?;
        Ok(self.current_step())
    }

    /// Validates the current step and moves on, or asks for a plan fetch.
    pub fn begin_advance(&mut self) -> FlowResult<Advance> {
        let step = match self.state {
            PurchaseState::Editing(step) => step,
            PurchaseState::FetchingPlans | PurchaseState::Submitting => {
                return Err(FlowError::Busy)
            }
            PurchaseState::Done => {
                return Err(FlowError::illegal(self.state, PurchaseEvent::Advance))
            }
        };

        let errors = self.draft.check_all(step.required_fields());
        if !errors.is_empty() {
            let count = self.form.replace(errors);
            debug!(step = step.number(), count, "Step validation failed");
            return Err(FlowError::Validation { count });
        }
        self.form.replace([]);

        let next = transition(self.state, PurchaseEvent::Advance)
            .ok_or_else(|| FlowError::illegal(self.state, PurchaseEvent::Advance))?;

        if next == PurchaseState::FetchingPlans {
            let ticket = self
                .in_flight
                .issue(Operation::FetchPlans)
                .ok_or(FlowError::Busy)?;
            self.plan_error = None;
            self.enter(next);
            return Ok(Advance::FetchPlans(ticket));
        }

        self.enter(next);
        Ok(Advance::Moved(self.current_step()))
    }

    /// Applies a plan fetch result.
    ///
    /// On success moves to plan selection. On failure stays on device
    /// details with [`plan_error`](Self::plan_error) set and no plans stored.
    pub fn complete_plan_fetch(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<Vec<PricingPlan>>,
    ) -> FlowResult<PurchaseStep> {
        if !self.in_flight.settle(ticket) {
            return Err(FlowError::Stale);
        }

        match result {
            Ok(plans) => {
                info!(count = plans.len(), "Pricing plans loaded");
                // A previously picked plan is refreshed, or dropped if withdrawn.
                self.draft.plan = self
                    .draft
                    .plan
                    .as_ref()
                    .and_then(|picked| plans.iter().find(|p| p.id == picked.id).cloned());
                self.plans = plans;
                self.apply(PurchaseEvent::PlansLoaded)?;
                Ok(self.current_step())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load pricing plans");
                self.plans.clear();
                let failure = FlowError::PlansUnavailable(e);
                self.plan_error = Some(failure.to_string());
                self.apply(PurchaseEvent::PlansFailed)?;
                Err(failure)
            }
        }
    }

    /// Re-issues the plan fetch from device details after a failure.
    pub fn retry_plans(&mut self) -> FlowResult<Ticket> {
        if self.state != PurchaseState::Editing(PurchaseStep::DeviceDetails) {
            return Err(FlowError::illegal(self.state, PurchaseEvent::Advance));
        }
        match self.begin_advance()? {
            Advance::FetchPlans(ticket) => Ok(ticket),
            Advance::Moved(_) => Err(FlowError::illegal(self.state, PurchaseEvent::Advance)),
        }
    }

    /// Drops the draft and returns to step 1. Also starts over after success.
    pub fn cancel(&mut self) -> FlowResult<()> {
        self.ensure_not_submitting()?;
        self.in_flight.abandon();
        self.apply(PurchaseEvent::Reset)?;
        self.clear_draft();
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Checks everything and builds the application to send.
    pub fn begin_submit(
        &mut self,
        start_date: NaiveDate,
    ) -> FlowResult<(Ticket, PolicyApplication)> {
        match self.state {
            PurchaseState::Editing(PurchaseStep::Review) => {}
            PurchaseState::Submitting => return Err(FlowError::Busy),
            other => return Err(FlowError::illegal(other, PurchaseEvent::Submit)),
        }

        if !self.draft.has_submission_essentials() {
            return Err(self.refuse(PreconditionError::IncompleteSubmission));
        }
        if self.token.is_none() {
            return Err(self.refuse(PreconditionError::MissingToken));
        }

        let errors = self.draft.check_all(&PurchaseField::ALL);
        if !errors.is_empty() {
            let count = self.form.replace(errors);
            return Err(FlowError::Validation { count });
        }
        let application = match self.draft.to_application(start_date) {
            Ok(application) => application,
            Err(e) => return Err(self.reject_payload(e)),
        };

        let ticket = self
            .in_flight
            .issue(Operation::SubmitPolicy)
            .ok_or(FlowError::Busy)?;
        self.submit_error = None;
        self.apply(PurchaseEvent::Submit)?;
        info!(
            plan = application.pricing,
            premium = application.premium,
            "Submitting policy application"
        );
        Ok((ticket, application))
    }

    /// Applies the purchase call's result.
    pub fn complete_submit(
        &mut self,
        ticket: Ticket,
        result: GatewayResult<PolicyReceipt>,
    ) -> FlowResult<PolicyCreated> {
        if !self.in_flight.settle(ticket) {
            return Err(FlowError::Stale);
        }

        match result {
            Ok(receipt) => {
                let premium = self.draft.premium();
                let (policy_number, placeholder_number) = match receipt.policy_number {
                    Some(number) => (number, false),
                    None => {
                        warn!("Backend returned no policy number, using a placeholder");
                        (placeholder_policy_number(&mut rand::thread_rng()), true)
                    }
                };
                self.apply(PurchaseEvent::Submitted)?;
                self.clear_draft();
                info!(%policy_number, "Policy created");
                Ok(PolicyCreated {
                    policy_number,
                    policy_id: receipt.id,
                    premium,
                    placeholder_number,
                })
            }
            Err(e) => {
                error!(error = %e, status = ?e.status(), "Policy submission failed");
                self.submit_error = Some(e.to_string());
                self.apply(PurchaseEvent::SubmitFailed)?;
                Err(FlowError::Gateway(e))
            }
        }
    }

    // =========================================================================
    // One-shot helpers
    // =========================================================================

    /// "Continue": validates, fetches plans when leaving device details.
    pub async fn next(&mut self, gateway: &dyn Gateway) -> FlowResult<PurchaseStep> {
        match self.begin_advance()? {
            Advance::Moved(step) => Ok(step),
            Advance::FetchPlans(ticket) => {
                let result = gateway.fetch_pricing_plans().await;
                self.complete_plan_fetch(ticket, result)
            }
        }
    }

    /// Submits with today's local date as the policy start.
    pub async fn submit(&mut self, gateway: &dyn Gateway) -> FlowResult<PolicyCreated> {
        let (ticket, application) = self.begin_submit(Local::now().date_naive())?;
        let result = gateway.submit_policy(self.token.as_ref(), &application).await;
        self.complete_submit(ticket, result)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply(&mut self, event: PurchaseEvent) -> FlowResult<PurchaseState> {
        let next =
            transition(self.state, event).ok_or_else(|| FlowError::illegal(self.state, event))?;
        self.enter(next);
        Ok(next)
    }

    fn enter(&mut self, next: PurchaseState) {
        if next != self.state {
            info!(from = ?self.state, to = ?next, "Purchase state changed");
            self.state = next;
        }
    }

    fn ensure_not_submitting(&self) -> FlowResult<()> {
        if self.is_submitting() {
            debug!("Ignoring action while the application is being submitted");
            return Err(FlowError::Busy);
        }
        Ok(())
    }

    fn refuse(&mut self, reason: PreconditionError) -> FlowError {
        self.submit_error = Some(reason.to_string());
        FlowError::Precondition(reason)
    }

    /// Surfaces an error from building the application, which the field
    /// checks should already have caught.
    fn reject_payload(&mut self, error: ValidationError) -> FlowError {
        warn!(field = error.field(), error = %error, "Application could not be built");
        if let Err(unfiled) = self.form.file(&PurchaseField::ALL, error) {
            self.submit_error = Some(unfiled.to_string());
        }
        FlowError::Validation {
            count: self.form.error_count().max(1),
        }
    }

    fn clear_draft(&mut self) {
        self.draft = PurchaseDraft::default();
        self.form.reset();
        self.plans.clear();
        self.plan_error = None;
        self.submit_error = None;
    }
}

/// `DS-` followed by nine random uppercase letters or digits.
pub fn placeholder_policy_number(rng: &mut impl Rng) -> String {
    let suffix: String = (0..PLACEHOLDER_LEN)
        .map(|_| PLACEHOLDER_CHARSET[rng.gen_range(0..PLACEHOLDER_CHARSET.len())] as char)
        .collect();
    format!("{PLACEHOLDER_PREFIX}{suffix}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purchase::draft::tests::complete_draft;
    use crate::testing::{token, ScriptedGateway};
    use shield_gateway::GatewayError;

    fn fill(flow: &mut PurchaseFlow, fields: &[PurchaseField]) {
        let sample = complete_draft();
        for field in fields {
            match field {
                PurchaseField::Device => flow.select_device(DeviceCategory::Phone).unwrap(),
                PurchaseField::PricingPlan => {}
                text => flow.set_field(*text, sample.text(*text).unwrap()).unwrap(),
            }
        }
    }

    async fn flow_at(gateway: &ScriptedGateway, target: PurchaseStep) -> PurchaseFlow {
        let mut flow = PurchaseFlow::new(Some(token()));
        fill(&mut flow, &PurchaseField::ALL);
        while flow.current_step() < target {
            if flow.current_step() == PurchaseStep::PlanSelection {
                flow.select_plan(3).unwrap();
            }
            flow.next(gateway).await.unwrap();
        }
        flow
    }

    #[tokio::test]
    async fn test_back_needs_no_validation() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::PersonalInfo).await;
        flow.set_field(PurchaseField::Email, "").unwrap();

        assert_eq!(flow.go_back().unwrap(), PurchaseStep::SelectDevice);
        assert!(!flow.form().has_errors());
        assert!(matches!(
            flow.go_back(),
            Err(FlowError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_first_step_requires_a_device() {
        let gateway = ScriptedGateway::new();
        let mut flow = PurchaseFlow::new(Some(token()));

        let err = flow.next(&gateway).await.unwrap_err();
        assert_eq!(err, FlowError::Validation { count: 1 });
        assert_eq!(
            flow.view().errors.get("selectedDevice").map(String::as_str),
            Some("Please select a device")
        );

        flow.select_device(DeviceCategory::Laptop).unwrap();
        assert!(!flow.form().has_errors());
        assert_eq!(flow.next(&gateway).await.unwrap(), PurchaseStep::PersonalInfo);
    }

    #[tokio::test]
    async fn test_invalid_device_details_stay_without_fetch() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;
        flow.set_field(PurchaseField::DevicePrice, "").unwrap();
        flow.set_field(PurchaseField::PurchaseDate, "yesterday").unwrap();

        let err = flow.next(&gateway).await.unwrap_err();
        assert_eq!(err, FlowError::Validation { count: 2 });
        assert_eq!(flow.current_step(), PurchaseStep::DeviceDetails);
        assert_eq!(
            flow.form().error(PurchaseField::DevicePrice).map(ToString::to_string),
            Some("This field is required.".to_string())
        );
        assert_eq!(gateway.calls("fetch_pricing_plans"), 0);
    }

    #[tokio::test]
    async fn test_valid_device_details_fetch_plans_once() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;

        assert_eq!(flow.next(&gateway).await.unwrap(), PurchaseStep::PlanSelection);
        assert_eq!(gateway.calls("fetch_pricing_plans"), 1);
        assert_eq!(flow.plans().len(), 2);
    }

    #[tokio::test]
    async fn test_plan_fetch_failure_holds_device_details() {
        let gateway = ScriptedGateway::new()
            .push_plans(Err(GatewayError::Transport("connection reset".into())));
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;
        let before = flow.draft().clone();

        let err = flow.next(&gateway).await.unwrap_err();
        assert!(matches!(err, FlowError::PlansUnavailable(_)));
        assert_eq!(flow.current_step(), PurchaseStep::DeviceDetails);
        assert!(flow.plans().is_empty());
        assert_eq!(
            flow.plan_error(),
            Some("Failed to load pricing plans. Please try again.")
        );
        assert_eq!(flow.draft(), &before);

        // Retry without touching the form.
        let ticket = flow.retry_plans().unwrap();
        assert!(flow.is_loading_plans());
        let result = gateway.fetch_pricing_plans().await;
        assert_eq!(
            flow.complete_plan_fetch(ticket, result).unwrap(),
            PurchaseStep::PlanSelection
        );
        assert_eq!(flow.plan_error(), None);
        assert_eq!(gateway.calls("fetch_pricing_plans"), 2);
    }

    #[tokio::test]
    async fn test_plan_step_requires_a_plan() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::PlanSelection).await;

        assert!(flow.next(&gateway).await.is_err());
        assert_eq!(
            flow.view().errors.get("selectedPricingPlan").map(String::as_str),
            Some("Please select a pricing plan")
        );
        assert_eq!(flow.select_plan(99), Err(FlowError::UnknownPlan(99)));

        flow.select_plan(1).unwrap();
        assert_eq!(flow.next(&gateway).await.unwrap(), PurchaseStep::Payment);
        assert_eq!(flow.quote().premium.units(), 4_500);
    }

    #[tokio::test]
    async fn test_duplicate_continue_is_refused() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;

        let Advance::FetchPlans(ticket) = flow.begin_advance().unwrap() else {
            panic!("expected a plan fetch");
        };
        assert_eq!(flow.begin_advance(), Err(FlowError::Busy));
        assert_eq!(flow.current_step(), PurchaseStep::DeviceDetails);

        flow.complete_plan_fetch(ticket, Ok(crate::testing::plans()))
            .unwrap();
        assert_eq!(flow.current_step(), PurchaseStep::PlanSelection);
    }

    #[tokio::test]
    async fn test_late_plans_after_going_back_are_dropped() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;

        let Advance::FetchPlans(ticket) = flow.begin_advance().unwrap() else {
            panic!("expected a plan fetch");
        };
        assert_eq!(flow.go_back().unwrap(), PurchaseStep::PersonalInfo);

        let late = flow.complete_plan_fetch(ticket, Ok(crate::testing::plans()));
        assert_eq!(late, Err(FlowError::Stale));
        assert_eq!(flow.current_step(), PurchaseStep::PersonalInfo);
        assert!(flow.plans().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_clears_draft() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        assert_eq!(flow.quote().premium.units(), 9_000);

        let created = flow.submit(&gateway).await.unwrap();
        assert_eq!(created.policy_number, "POL-0501");
        assert_eq!(created.policy_id.as_deref(), Some("501"));
        assert_eq!(created.premium.units(), 9_000);
        assert!(!created.placeholder_number);

        assert_eq!(flow.state(), PurchaseState::Done);
        assert_eq!(flow.draft(), &PurchaseDraft::default());

        let sent = gateway.applications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].policy_owner.phone_number, "0712345678");
        assert_eq!(sent[0].payment_details.phone_number, "0723456789");
        assert_eq!(sent[0].premium, 9_000);

        flow.cancel().unwrap();
        assert_eq!(flow.current_step(), PurchaseStep::SelectDevice);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_everything() {
        let gateway = ScriptedGateway::new().push_policy_receipt(Err(GatewayError::Http {
            status: 500,
            message: "Internal Server Error".into(),
        }));
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        let before = flow.draft().clone();

        let err = flow.submit(&gateway).await.unwrap_err();
        assert!(matches!(err, FlowError::Gateway(GatewayError::Http { status: 500, .. })));
        assert_eq!(flow.current_step(), PurchaseStep::Review);
        assert_eq!(flow.state(), PurchaseState::Editing(PurchaseStep::Review));
        assert_eq!(flow.draft(), &before);
        assert_eq!(
            flow.submit_error(),
            Some("HTTP error! status: 500, message: Internal Server Error")
        );

        // Second attempt goes through with the same data.
        assert!(flow.submit(&gateway).await.is_ok());
        assert_eq!(gateway.calls("submit_policy"), 2);
    }

    #[tokio::test]
    async fn test_missing_policy_number_gets_placeholder() {
        let gateway = ScriptedGateway::new().push_policy_receipt(Ok(PolicyReceipt::default()));
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;

        let created = flow.submit(&gateway).await.unwrap();
        assert!(created.placeholder_number);
        assert!(created.policy_number.starts_with("DS-"));
        assert_eq!(created.policy_number.len(), 12);
        assert!(created.policy_number[3..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_submit_without_token_never_calls() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        flow.token = None;

        let err = flow.submit(&gateway).await.unwrap_err();
        assert_eq!(err, FlowError::Precondition(PreconditionError::MissingToken));
        assert_eq!(flow.submit_error(), Some("Authentication required. Please log in."));
        assert_eq!(gateway.calls("submit_policy"), 0);
    }

    #[tokio::test]
    async fn test_submit_requires_essentials() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        flow.set_field(PurchaseField::DeviceModel, " ").unwrap();

        let err = flow.submit(&gateway).await.unwrap_err();
        assert_eq!(
            err,
            FlowError::Precondition(PreconditionError::IncompleteSubmission)
        );
        assert_eq!(flow.submit_error(), Some("Please complete all required fields."));
        assert_eq!(gateway.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_huge_price_is_caught_on_device_details() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;
        flow.set_field(PurchaseField::DevicePrice, "99999999999999999999")
            .unwrap();

        assert_eq!(
            flow.next(&gateway).await.unwrap_err(),
            FlowError::Validation { count: 1 }
        );
        assert_eq!(flow.current_step(), PurchaseStep::DeviceDetails);
        assert_eq!(
            flow.view().errors.get("devicePrice").map(String::as_str),
            Some("Please enter a valid price (e.g., 999.99)")
        );
        assert_eq!(gateway.calls("fetch_pricing_plans"), 0);
    }

    #[tokio::test]
    async fn test_huge_price_entered_on_review_blocks_submit_with_a_message() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        flow.set_field(PurchaseField::DevicePrice, "99999999999999999999")
            .unwrap();
        assert!(!flow.quote().is_known());

        let err = flow.submit(&gateway).await.unwrap_err();
        assert_eq!(err, FlowError::Validation { count: 1 });
        assert!(flow.form().error(PurchaseField::DevicePrice).is_some());
        assert_eq!(flow.current_step(), PurchaseStep::Review);
        assert!(gateway.applications().is_empty());
    }

    #[tokio::test]
    async fn test_every_submit_refusal_is_visible() {
        let gateway = ScriptedGateway::new();
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let breakages: [fn(&mut PurchaseFlow); 4] = [
            |flow: &mut PurchaseFlow| flow.token = None,
            |flow: &mut PurchaseFlow| flow.set_field(PurchaseField::Email, "").unwrap(),
            |flow: &mut PurchaseFlow| flow.set_field(PurchaseField::IdNumber, " ").unwrap(),
            |flow: &mut PurchaseFlow| {
                flow.set_field(PurchaseField::DevicePrice, "99999999999999999999")
                    .unwrap()
            },
        ];

        for (i, breakage) in breakages.into_iter().enumerate() {
            let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
            breakage(&mut flow);

            assert!(flow.begin_submit(today).is_err(), "case {i} was accepted");
            let view = flow.view();
            assert!(
                !view.errors.is_empty() || view.submit_error.is_some(),
                "case {i} left no message"
            );
            assert_eq!(view.step, PurchaseStep::Review);
        }
        assert!(gateway.applications().is_empty());
    }

    #[test]
    fn test_unbuildable_application_lands_on_a_field_or_banner() {
        let mut flow = PurchaseFlow::new(Some(token()));
        let err = flow.reject_payload(ValidationError::InvalidPrice {
            field: "devicePrice".into(),
        });
        assert_eq!(err, FlowError::Validation { count: 1 });
        assert!(flow.form().error(PurchaseField::DevicePrice).is_some());
        assert_eq!(flow.submit_error(), None);

        let mut flow = PurchaseFlow::new(Some(token()));
        flow.reject_payload(ValidationError::Required {
            field: "startDate".into(),
        });
        assert!(!flow.form().has_errors());
        assert_eq!(flow.submit_error(), Some("This field is required."));
    }

    #[tokio::test]
    async fn test_edit_on_review_is_rechecked() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        flow.set_field(PurchaseField::Phone, "0712").unwrap();

        let err = flow.submit(&gateway).await.unwrap_err();
        assert_eq!(err, FlowError::Validation { count: 1 });
        assert!(flow.form().error(PurchaseField::Phone).is_some());
        assert_eq!(gateway.calls("submit_policy"), 0);
    }

    #[tokio::test]
    async fn test_double_submit_is_refused() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::Review).await;
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();

        let (ticket, _) = flow.begin_submit(today).unwrap();
        assert!(flow.is_submitting());
        assert_eq!(flow.begin_submit(today).unwrap_err(), FlowError::Busy);
        assert_eq!(flow.go_back(), Err(FlowError::Busy));
        assert_eq!(flow.cancel(), Err(FlowError::Busy));
        assert_eq!(
            flow.set_field(PurchaseField::Email, "x@y.co"),
            Err(FlowError::Busy)
        );

        let receipt = PolicyReceipt {
            id: None,
            policy_number: Some("POL-9".into()),
        };
        assert_eq!(
            flow.complete_submit(ticket, Ok(receipt)).unwrap().policy_number,
            "POL-9"
        );
    }

    #[tokio::test]
    async fn test_cancel_while_fetching_drops_result() {
        let gateway = ScriptedGateway::new();
        let mut flow = flow_at(&gateway, PurchaseStep::DeviceDetails).await;
        let Advance::FetchPlans(ticket) = flow.begin_advance().unwrap() else {
            panic!("expected a plan fetch");
        };

        flow.cancel().unwrap();
        assert_eq!(flow.draft(), &PurchaseDraft::default());
        assert_eq!(
            flow.complete_plan_fetch(ticket, Ok(crate::testing::plans())),
            Err(FlowError::Stale)
        );
        assert_eq!(flow.current_step(), PurchaseStep::SelectDevice);
    }

    #[test]
    fn test_set_field_formats_and_clears_only_that_error() {
        let mut flow = PurchaseFlow::new(None);
        flow.select_device(DeviceCategory::Tablet).unwrap();
        flow.begin_advance().unwrap();
        assert!(flow.begin_advance().is_err());
        let errors_before = flow.form().error_count();

        flow.set_field(PurchaseField::Phone, "0712345678").unwrap();
        assert_eq!(flow.draft().phone, "(071) 234-5678");
        assert!(flow.form().error(PurchaseField::Phone).is_none());
        assert_eq!(flow.form().error_count(), errors_before - 1);

        assert_eq!(
            flow.set_field(PurchaseField::Device, "phone"),
            Err(FlowError::NotTextField("selectedDevice"))
        );
    }

    #[test]
    fn test_blur_checks_one_field() {
        let mut flow = PurchaseFlow::new(None);
        flow.set_field(PurchaseField::Email, "a@b").unwrap();
        flow.blur(PurchaseField::Email);

        assert!(flow.form().is_touched(PurchaseField::Email));
        assert_eq!(flow.form().error_count(), 1);

        flow.set_field(PurchaseField::Email, "a@b.co").unwrap();
        flow.blur(PurchaseField::Email);
        assert!(!flow.form().has_errors());
    }

    #[test]
    fn test_view_for_rendering() {
        let flow = PurchaseFlow::new(None);
        let view = serde_json::to_value(flow.view()).unwrap();
        assert_eq!(view["step"], "SelectDevice");
        assert_eq!(view["stepNumber"], 1);
        assert_eq!(view["loadingPlans"], false);
        assert_eq!(view["draft"]["firstName"], "");
    }

    #[test]
    fn test_placeholder_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let number = placeholder_policy_number(&mut rng);
            assert_eq!(number.len(), PLACEHOLDER_PREFIX.len() + PLACEHOLDER_LEN);
            assert!(number.starts_with(PLACEHOLDER_PREFIX));
        }
    }
}
