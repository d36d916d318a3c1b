//! # Workflow Errors
//!
//! What a flow action can fail with.
//!
//! ## Error Hierarchy
//! ```text
//! FlowError
//! ├── Validation           (field errors stored in the form, step unchanged)
//! ├── Precondition         (blocked before any network call)
//! │     ├── MissingToken
//! │     ├── MissingPlan
//! │     ├── IncompleteSubmission
//! │     ├── EmptyQuery
//! │     ├── PolicyNotClaimable
//! │     ├── NoDocuments / UnnamedDocument / EmptyDocument
//! ├── PlansUnavailable     (plan fetch failed, still on device details)
//! ├── Gateway              (remote failure, draft kept)
//! ├── Busy                 (a request is already in flight)
//! ├── Stale                (completion for a request the flow abandoned)
//! ├── IllegalTransition
//! └── UnknownPlan / UnknownPolicy / UnknownOutlet / SearchNotAllowed / NotTextField
//! ```
//!
//! None of these clear form data. Every one is recoverable by editing,
//! retrying or stepping back.

use thiserror::Error;

use shield_gateway::GatewayError;

/// Result type for flow actions.
pub type FlowResult<T> = Result<T, FlowError>;

/// An action blocked before it could reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Authentication required. Please log in.")]
    MissingToken,

    #[error("Please select a pricing plan")]
    MissingPlan,

    /// Email, device model or plan missing at submission.
    #[error("Please complete all required fields.")]
    IncompleteSubmission,

    #[error("Please enter a policy number or name to search")]
    EmptyQuery,

    #[error("Policy {policy_number} is not active. Only active policies can be claimed.")]
    PolicyNotClaimable { policy_number: String },

    #[error("Please attach at least one document")]
    NoDocuments,

    #[error("Please provide a name for all documents")]
    UnnamedDocument,

    #[error("Document '{name}' has no content")]
    EmptyDocument { name: String },
}

/// Errors returned by [`PurchaseFlow`](crate::PurchaseFlow) and
/// [`ClaimFlow`](crate::ClaimFlow) actions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// One or more fields failed; see the flow's error map.
    #[error("Please fix the highlighted fields ({count} to correct)")]
    Validation { count: usize },

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// The plan fetch behind "Continue" on device details failed.
    #[error("Failed to load pricing plans. Please try again.")]
    PlansUnavailable(#[source] GatewayError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The same kind of request is already in flight.
    #[error("Please wait for the current request to finish")]
    Busy,

    /// The response belongs to a request the flow has since abandoned.
    #[error("Response arrived after the flow moved on")]
    Stale,

    #[error("Cannot {event} from {state}")]
    IllegalTransition { state: String, event: String },

    #[error("Pricing plan {0} is not on offer")]
    UnknownPlan(i64),

    #[error("Policy {0} is not in the list")]
    UnknownPolicy(i64),

    #[error("Device outlet {0} is not in the list")]
    UnknownOutlet(i64),

    #[error("Policy search is not available for self-service claims")]
    SearchNotAllowed,

    /// Selections go through their own `select_*` action.
    #[error("{0} is chosen from a list, not typed")]
    NotTextField(&'static str),
}

impl FlowError {
    /// Returns true if nothing was sent to the backend.
    pub fn is_local(&self) -> bool {
        !matches!(self, FlowError::PlansUnavailable(_) | FlowError::Gateway(_))
    }

    /// The remote failure behind this error, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            FlowError::PlansUnavailable(e) | FlowError::Gateway(e) => Some(e),
            _ => None,
        }
    }

    pub(crate) fn illegal(state: impl std::fmt::Debug, event: impl std::fmt::Debug) -> Self {
        FlowError::IllegalTransition {
            state: format!("{state:?}"),
            event: format!("{event:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            FlowError::from(PreconditionError::IncompleteSubmission).to_string(),
            "Please complete all required fields."
        );
        assert_eq!(
            FlowError::PlansUnavailable(GatewayError::Transport("timed out".into())).to_string(),
            "Failed to load pricing plans. Please try again."
        );
        assert_eq!(
            FlowError::from(PreconditionError::MissingToken).to_string(),
            "Authentication required. Please log in."
        );
    }

    #[test]
    fn test_is_local() {
        assert!(FlowError::Busy.is_local());
        assert!(FlowError::Validation { count: 2 }.is_local());
        let remote = FlowError::Gateway(GatewayError::Http {
            status: 500,
            message: "boom".into(),
        });
        assert!(!remote.is_local());
        assert_eq!(remote.gateway_error().and_then(GatewayError::status), Some(500));
    }
}
