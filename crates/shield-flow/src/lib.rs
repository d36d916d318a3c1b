//! # shield-flow: Workflow Engine for DeviceShield
//!
//! The purchase and claim state machines. Each flow owns its draft; the
//! rendering layer reads snapshots and calls actions, nothing else writes.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           shield-flow                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │    purchase      │  │      claim       │  │    documents     │      │
//! │  │  6 steps, plans  │  │ 2 steps, caller  │  │ concurrent batch │      │
//! │  │  fetch, submit   │  │ modes, outlets   │  │ partial failure  │      │
//! │  └────────┬─────────┘  └────────┬─────────┘  └──────────────────┘      │
//! │           │                     │                                       │
//! │  ┌────────▼─────────────────────▼─────────┐  ┌──────────────────┐      │
//! │  │  form (errors, touched)                │  │     events       │      │
//! │  │  ticket (one in-flight request / slot) │  │ PolicyCreated    │      │
//! │  │  error (FlowError, PreconditionError)  │  │ ClaimFiled       │      │
//! │  └────────────────────────────────────────┘  └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use shield_flow::{PurchaseFlow, PurchaseField};
//! use shield_core::DeviceCategory;
//! use shield_gateway::{AuthToken, GatewayConfig, HttpGateway};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new(&GatewayConfig::load_or_default(None))?;
//! let mut flow = PurchaseFlow::new(AuthToken::from_env("SHIELD_TOKEN"));
//!
//! flow.select_device(DeviceCategory::Phone)?;
//! flow.next(&gateway).await?;
//! flow.set_field(PurchaseField::Phone, "0712345678")?;
//! assert_eq!(flow.draft().phone, "(071) 234-5678");
//! # Ok(())
//! # }
//! ```

pub mod claim;
pub mod documents;
pub mod error;
pub mod events;
pub mod form;
pub mod purchase;
pub mod ticket;

#[cfg(test)]
mod testing;

pub use claim::{CallerMode, ClaimField, ClaimFlow, ClaimStep, PolicyListNotice};
pub use documents::{upload_documents, UploadFailure, UploadReport};
pub use error::{FlowError, FlowResult, PreconditionError};
pub use events::{ClaimFiled, PolicyCreated};
pub use purchase::{Advance, PurchaseField, PurchaseFlow, PurchaseStep};
pub use ticket::Ticket;
