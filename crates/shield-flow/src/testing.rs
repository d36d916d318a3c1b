//! In-memory gateway for engine tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use shield_core::types::{DeviceOutlet, PolicySummary, PricingPlan};
use shield_gateway::{
    AuthToken, ClaimDetail, ClaimDocument, ClaimReceipt, ClaimSubmission, ClaimSummary,
    DocumentUpload, Gateway, GatewayError, GatewayResult, PolicyApplication, PolicyDetail,
    PolicyReceipt,
};

pub fn token() -> AuthToken {
    AuthToken::parse("test-token").unwrap()
}

pub fn plans() -> Vec<PricingPlan> {
    vec![
        PricingPlan {
            id: 1,
            cover_type: "Partial Cover".into(),
            cover_percentage: 10.0,
            components: vec![],
        },
        PricingPlan {
            id: 3,
            cover_type: "Full Cover".into(),
            cover_percentage: 20.0,
            components: vec![],
        },
    ]
}

pub fn policy(id: i64, status: &str, owner: &str) -> PolicySummary {
    PolicySummary {
        id,
        policy_number: format!("POL-{id:04}"),
        status: status.into(),
        policy_owner_name: Some(owner.into()),
        cover_amount: Some("45000.00".into()),
        premium: Some("9000.00".into()),
        start_date: Some("2025-01-01".into()),
    }
}

pub fn outlets() -> Vec<DeviceOutlet> {
    vec![
        DeviceOutlet {
            id: 10,
            name: "Fixit".into(),
            location: "CBD".into(),
            city: Some("Nairobi".into()),
            agent_type: Some("Repair".into()),
        },
        DeviceOutlet {
            id: 11,
            name: "PhoneDoc".into(),
            location: "Westlands".into(),
            city: Some("Nairobi".into()),
            agent_type: Some("Repair".into()),
        },
    ]
}

/// Answers from queues; falls back to canned successes when a queue is empty.
#[derive(Default)]
pub struct ScriptedGateway {
    plans: Mutex<VecDeque<GatewayResult<Vec<PricingPlan>>>>,
    policy_receipts: Mutex<VecDeque<GatewayResult<PolicyReceipt>>>,
    claim_receipts: Mutex<VecDeque<GatewayResult<ClaimReceipt>>>,
    searches: Mutex<VecDeque<GatewayResult<Vec<PolicySummary>>>>,
    outlet_lists: Mutex<VecDeque<GatewayResult<Vec<DeviceOutlet>>>>,
    policies: Mutex<Vec<PolicySummary>>,
    failing_documents: Mutex<HashSet<String>>,
    documents: Mutex<Vec<ClaimDocument>>,
    applications: Mutex<Vec<PolicyApplication>>,
    claims: Mutex<Vec<ClaimSubmission>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_plans(self, result: GatewayResult<Vec<PricingPlan>>) -> Self {
        self.plans.lock().unwrap().push_back(result);
        self
    }

    pub fn push_policy_receipt(self, result: GatewayResult<PolicyReceipt>) -> Self {
        self.policy_receipts.lock().unwrap().push_back(result);
        self
    }

    pub fn push_claim_receipt(self, result: GatewayResult<ClaimReceipt>) -> Self {
        self.claim_receipts.lock().unwrap().push_back(result);
        self
    }

    pub fn push_search(self, result: GatewayResult<Vec<PolicySummary>>) -> Self {
        self.searches.lock().unwrap().push_back(result);
        self
    }

    pub fn push_outlets(self, result: GatewayResult<Vec<DeviceOutlet>>) -> Self {
        self.outlet_lists.lock().unwrap().push_back(result);
        self
    }

    pub fn with_policies(self, policies: Vec<PolicySummary>) -> Self {
        *self.policies.lock().unwrap() = policies;
        self
    }

    pub fn fail_document(self, name: &str) -> Self {
        self.failing_documents.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn applications(&self) -> Vec<PolicyApplication> {
        self.applications.lock().unwrap().clone()
    }

    pub fn claims(&self) -> Vec<ClaimSubmission> {
        self.claims.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

fn authorised(token: Option<&AuthToken>) -> GatewayResult<()> {
    token.map(|_| ()).ok_or(GatewayError::Unauthenticated)
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn fetch_pricing_plans(&self) -> GatewayResult<Vec<PricingPlan>> {
        self.record("fetch_pricing_plans");
        self.plans.lock().unwrap().pop_front().unwrap_or_else(|| Ok(plans()))
    }

    async fn submit_policy(
        &self,
        token: Option<&AuthToken>,
        application: &PolicyApplication,
    ) -> GatewayResult<PolicyReceipt> {
        self.record("submit_policy");
        authorised(token)?;
        self.applications.lock().unwrap().push(application.clone());
        self.policy_receipts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(PolicyReceipt {
                    id: Some("501".into()),
                    policy_number: Some("POL-0501".into()),
                })
            })
    }

    async fn submit_claim(
        &self,
        token: Option<&AuthToken>,
        claim: &ClaimSubmission,
    ) -> GatewayResult<ClaimReceipt> {
        self.record("submit_claim");
        authorised(token)?;
        self.claims.lock().unwrap().push(claim.clone());
        self.claim_receipts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ClaimReceipt {
                    id: Some(77),
                    claim_number: None,
                })
            })
    }

    async fn fetch_device_outlets(
        &self,
        token: Option<&AuthToken>,
    ) -> GatewayResult<Vec<DeviceOutlet>> {
        self.record("fetch_device_outlets");
        authorised(token)?;
        self.outlet_lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(outlets()))
    }

    async fn fetch_policies(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<PolicySummary>> {
        self.record("fetch_policies");
        authorised(token)?;
        Ok(self.policies.lock().unwrap().clone())
    }

    async fn search_policies(
        &self,
        token: Option<&AuthToken>,
        _query: &str,
    ) -> GatewayResult<Vec<PolicySummary>> {
        self.record("search_policies");
        authorised(token)?;
        self.searches.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    async fn fetch_policy_details(
        &self,
        token: Option<&AuthToken>,
        policy_id: i64,
    ) -> GatewayResult<PolicyDetail> {
        self.record("fetch_policy_details");
        authorised(token)?;
        let policy = self
            .policies
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == policy_id)
            .cloned()
            .ok_or_else(|| GatewayError::Http {
                status: 404,
                message: "Not found.".into(),
            })?;
        Ok(PolicyDetail {
            policy,
            policy_gadgets: vec![],
            gadget_pricing: None,
            policy_claims: vec![],
        })
    }

    async fn fetch_claims(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<ClaimSummary>> {
        self.record("fetch_claims");
        authorised(token)?;
        Ok(vec![])
    }

    async fn fetch_claim_details(
        &self,
        token: Option<&AuthToken>,
        claim_id: i64,
    ) -> GatewayResult<ClaimDetail> {
        self.record("fetch_claim_details");
        authorised(token)?;
        let documents = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.claim == claim_id)
            .cloned()
            .collect();
        Ok(ClaimDetail {
            claim: ClaimSummary {
                id: claim_id,
                claim_number: "CLM_03/007/2025".into(),
                status: "Pending Verification".into(),
                policy_number: None,
                claim_type: None,
                incident_date: None,
                estimated_cost: None,
            },
            claim_documents: documents,
            device_outlet_name: None,
            claim_owner: None,
        })
    }

    async fn upload_claim_document(
        &self,
        token: Option<&AuthToken>,
        upload: &DocumentUpload,
    ) -> GatewayResult<ClaimDocument> {
        self.record("upload_claim_document");
        authorised(token)?;
        tokio::task::yield_now().await;
        if self.failing_documents.lock().unwrap().contains(&upload.name) {
            return Err(GatewayError::Http {
                status: 413,
                message: "File too large".into(),
            });
        }
        let mut documents = self.documents.lock().unwrap();
        let document = ClaimDocument {
            id: documents.len() as i64 + 1,
            claim: upload.claim_id,
            document_name: upload.name.clone(),
            document_file: Some(format!("/media/claims/{}", upload.file_name)),
        };
        documents.push(document.clone());
        Ok(document)
    }
}
