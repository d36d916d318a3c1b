//! # HTTP Gateway
//!
//! [`Gateway`] over HTTPS with `reqwest`.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  call(token?) ──► token required? ──none──► Err(Unauthenticated)       │
//! │                        │                       (nothing sent)           │
//! │                        ▼                                                │
//! │               build request                                             │
//! │               Accept: application/json                                  │
//! │               X-Request-Id: <uuid v4>                                   │
//! │               Authorization: Bearer <token>                             │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   send ──transport error──► Err(Transport)             │
//! │                        │                                                │
//! │              2xx ◄─────┴─────► non-2xx ──► Err(Http{status, message})  │
//! │               │                                                         │
//! │               ▼                                                         │
//! │          parse JSON ──bad shape──► Err(Decode)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shield_core::types::{DeviceOutlet, PolicySummary, PricingPlan};

use crate::auth::{require_token, AuthToken};
use crate::client::Gateway;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::payload::{
    parse_page, ClaimDetail, ClaimDocument, ClaimReceipt, ClaimSubmission, ClaimSummary,
    DocumentUpload, PolicyApplication, PolicyDetail, PolicyReceipt,
};

// =============================================================================
// Endpoints
// =============================================================================

const PRICING_PLANS: &str = "/pricing/gadget-pricing/";
const POLICY_PURCHASE: &str = "/sales/gadget-policy-purchase/";
const DEVICE_OUTLETS: &str = "/gadgets/device-outlets";
const POLICIES: &str = "/policies/";
const POLICY_SEARCH: &str = "/policies/policies-search/";
const CLAIMS: &str = "/claims";
const CLAIM_CREATE: &str = "/claims/";
const CLAIM_DOCUMENTS: &str = "/claims/claim-documents/";

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const DEFAULT_MIME: &str = "application/octet-stream";

// =============================================================================
// Client
// =============================================================================

/// Gateway backed by the real REST service.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds the HTTP client from a validated config.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GatewayError::InvalidConfig(e.to_string()))?;

        info!(base_url = %config.base_url(), "HTTP gateway ready");

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Sends a request and returns the response whatever its status.
    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> GatewayResult<Response> {
        let request = builder.build()?;
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        debug!(
            operation,
            method = %request.method(),
            path = request.url().path(),
            request_id = %request_id,
            "Sending request"
        );

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(operation, request_id = %request_id, error = %e, "Request failed before a response");
            GatewayError::from(e)
        })?;

        debug!(
            operation,
            request_id = %request_id,
            status = response.status().as_u16(),
            "Response received"
        );
        Ok(response)
    }

    /// Sends a request and reads a JSON body from a 2xx response.
    async fn send_json(&self, operation: &'static str, builder: RequestBuilder) -> GatewayResult<Value> {
        let response = self.send(operation, builder).await?;
        if !response.status().is_success() {
            return Err(failure(operation, response).await);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| {
            warn!(operation, error = %e, "Response body is not JSON");
            GatewayError::from(e)
        })
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        token: Option<&AuthToken>,
    ) -> GatewayResult<T> {
        let body = self.send_json(operation, self.request(Method::GET, path, token)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        token: Option<&AuthToken>,
    ) -> GatewayResult<Vec<T>> {
        let body = self.send_json(operation, self.request(Method::GET, path, token)).await?;
        parse_page(body)
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Turns a non-2xx response into [`GatewayError::Http`].
async fn failure(operation: &'static str, response: Response) -> GatewayError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = error_message(status, &text);

    warn!(operation, status = status.as_u16(), message = %message, "Backend rejected request");

    GatewayError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Prefers a JSON `detail` / `message` / `error` field, then the raw body,
/// then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(msg) = json.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.canonical_reason().unwrap_or("Unknown error").to_string()
}

/// The search endpoint answers 404 "Policies not found." for zero hits.
fn is_empty_search(err: &GatewayError) -> bool {
    match err {
        GatewayError::Http { status: 404, message } => message.to_lowercase().contains("not found"),
        _ => false,
    }
}

// =============================================================================
// Gateway Implementation
// =============================================================================

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_pricing_plans(&self) -> GatewayResult<Vec<PricingPlan>> {
        let plans: Vec<PricingPlan> = self.get_list("fetch_pricing_plans", PRICING_PLANS, None).await?;
        info!(count = plans.len(), "Fetched pricing plans");
        Ok(plans)
    }

    async fn submit_policy(
        &self,
        token: Option<&AuthToken>,
        application: &PolicyApplication,
    ) -> GatewayResult<PolicyReceipt> {
        let token = require_token(token)?;
        let builder = self
            .request(Method::POST, POLICY_PURCHASE, Some(token))
            .json(application);

        let body = self.send_json("submit_policy", builder).await?;
        let receipt = PolicyReceipt::from_json(&body);
        info!(
            policy_id = ?receipt.id,
            policy_number = ?receipt.policy_number,
            "Policy purchase accepted"
        );
        Ok(receipt)
    }

    async fn submit_claim(
        &self,
        token: Option<&AuthToken>,
        claim: &ClaimSubmission,
    ) -> GatewayResult<ClaimReceipt> {
        let token = require_token(token)?;
        let builder = self.request(Method::POST, CLAIM_CREATE, Some(token)).json(claim);

        let body = self.send_json("submit_claim", builder).await?;
        let receipt = ClaimReceipt::from_json(&body);
        info!(claim_id = ?receipt.id, claim_number = ?receipt.claim_number, "Claim accepted");
        Ok(receipt)
    }

    async fn fetch_device_outlets(
        &self,
        token: Option<&AuthToken>,
    ) -> GatewayResult<Vec<DeviceOutlet>> {
        let token = require_token(token)?;
        self.get_list("fetch_device_outlets", DEVICE_OUTLETS, Some(token)).await
    }

    async fn fetch_policies(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<PolicySummary>> {
        let token = require_token(token)?;
        self.get_list("fetch_policies", POLICIES, Some(token)).await
    }

    async fn search_policies(
        &self,
        token: Option<&AuthToken>,
        query: &str,
    ) -> GatewayResult<Vec<PolicySummary>> {
        let token = require_token(token)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(GatewayError::InvalidRequest("Search query is required".into()));
        }

        let builder = self
            .request(Method::GET, POLICY_SEARCH, Some(token))
            .query(&[("search", query)]);

        match self.send_json("search_policies", builder).await {
            Ok(body) => parse_page(body),
            Err(err) if is_empty_search(&err) => {
                debug!("Search returned not found, treating as no matches");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_policy_details(
        &self,
        token: Option<&AuthToken>,
        policy_id: i64,
    ) -> GatewayResult<PolicyDetail> {
        let token = require_token(token)?;
        let path = format!("/policies/{policy_id}/details");
        self.get_typed("fetch_policy_details", &path, Some(token)).await
    }

    async fn fetch_claims(&self, token: Option<&AuthToken>) -> GatewayResult<Vec<ClaimSummary>> {
        let token = require_token(token)?;
        self.get_list("fetch_claims", CLAIMS, Some(token)).await
    }

    async fn fetch_claim_details(
        &self,
        token: Option<&AuthToken>,
        claim_id: i64,
    ) -> GatewayResult<ClaimDetail> {
        let token = require_token(token)?;
        let path = format!("/claims/{claim_id}/details/");
        self.get_typed("fetch_claim_details", &path, Some(token)).await
    }

    async fn upload_claim_document(
        &self,
        token: Option<&AuthToken>,
        upload: &DocumentUpload,
    ) -> GatewayResult<ClaimDocument> {
        let token = require_token(token)?;
        if upload.name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("Document name is required".into()));
        }

        let mime = upload.mime_type.as_deref().unwrap_or(DEFAULT_MIME);
        let file = Part::bytes(upload.content.clone())
            .file_name(upload.file_name.clone())
            .mime_str(mime)
            .map_err(|e| GatewayError::InvalidRequest(format!("Invalid MIME type {mime:?}: {e}")))?;

        let form = Form::new()
            .text("document_name", upload.name.trim().to_string())
            .text("claim", upload.claim_id.to_string())
            .part("document_file", file);

        let builder = self
            .request(Method::POST, CLAIM_DOCUMENTS, Some(token))
            .multipart(form);

        let body = self.send_json("upload_claim_document", builder).await?;
        let document: ClaimDocument = serde_json::from_value(body)?;
        info!(
            claim_id = upload.claim_id,
            document_id = document.id,
            bytes = upload.content.len(),
            "Claim document uploaded"
        );
        Ok(document)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
