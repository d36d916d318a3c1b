//! # Gateway Trait
//!
//! The seam between the workflow engine and the network. The engine only
//! ever holds a `&dyn Gateway`; production code passes an
//! [`HttpGateway`](crate::http::HttpGateway), tests pass a scripted fake.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────┬──────┬──────────────────────────────────┐
//! │ Operation                   │ Auth │ Notes                            │
//! ├─────────────────────────────┼──────┼──────────────────────────────────┤
//! │ fetch_pricing_plans         │  no  │ refetched on every 3 → 4 step    │
//! │ submit_policy               │ yes  │                                  │
//! │ submit_claim                │ yes  │                                  │
//! │ fetch_device_outlets        │ yes  │                                  │
//! │ fetch_policies              │ yes  │                                  │
//! │ search_policies             │ yes  │ "not found" → Ok(empty)          │
//! │ fetch_policy_details        │ yes  │                                  │
//! │ fetch_claims                │ yes  │                                  │
//! │ fetch_claim_details         │ yes  │ includes documents               │
//! │ upload_claim_document       │ yes  │ multipart                        │
//! └─────────────────────────────┴──────┴──────────────────────────────────┘
//! ```
//!
//! Every authenticated operation returns [`GatewayError::Unauthenticated`]
//! when `token` is `None`, without sending anything.
//!
//! [`GatewayError::Unauthenticated`]: crate::error::GatewayError::Unauthenticated

use async_trait::async_trait;

use shield_core::types::{DeviceOutlet, PolicySummary, PricingPlan};

use crate::auth::AuthToken;
use crate::error::GatewayResult;
use crate::payload::{
    ClaimDetail, ClaimDocument, ClaimReceipt, ClaimSubmission, ClaimSummary, DocumentUpload,
    PolicyApplication, PolicyDetail, PolicyReceipt,
};

/// Typed access to the insurance backend.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Lists the pricing plans currently on offer. No token needed.
    async fn fetch_pricing_plans(&self) -> GatewayResult<Vec<PricingPlan>>;

    /// Buys a policy.
    async fn submit_policy(
        &self,
        token: Option<&AuthToken>,
        application: &PolicyApplication,
    ) -> GatewayResult<PolicyReceipt>;

    /// Files a claim against an existing policy.
    async fn submit_claim(
        &self,
        token: Option<&AuthToken>,
        claim: &ClaimSubmission,
    ) -> GatewayResult<ClaimReceipt>;

    async fn fetch_device_outlets(&self, token: Option<&AuthToken>)
        -> GatewayResult<Vec<DeviceOutlet>>;

    async fn fetch_policies(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<PolicySummary>>;

    /// Free-text policy search.
    ///
    /// An empty or whitespace query is rejected before sending. A backend
    /// "not found" answer comes back as `Ok(vec![])`.
    async fn search_policies(
        &self,
        token: Option<&AuthToken>,
        query: &str,
    ) -> GatewayResult<Vec<PolicySummary>>;

    async fn fetch_policy_details(
        &self,
        token: Option<&AuthToken>,
        policy_id: i64,
    ) -> GatewayResult<PolicyDetail>;

    async fn fetch_claims(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<ClaimSummary>>;

    async fn fetch_claim_details(
        &self,
        token: Option<&AuthToken>,
        claim_id: i64,
    ) -> GatewayResult<ClaimDetail>;

    /// Attaches one document to a claim.
    async fn upload_claim_document(
        &self,
        token: Option<&AuthToken>,
        upload: &DocumentUpload,
    ) -> GatewayResult<ClaimDocument>;
}
