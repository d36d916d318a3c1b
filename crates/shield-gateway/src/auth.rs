//! # Bearer Token
//!
//! The token is issued elsewhere (login screen, operator environment) and
//! treated here as an opaque credential. It is shared read-only by every
//! call in a session, so it is a cheap `Arc<str>` clone.

use std::fmt;
use std::sync::Arc;

use crate::error::{GatewayError, GatewayResult};

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Arc<str>);

impl AuthToken {
    /// Wraps a raw token. Returns `None` for a blank string, which is the
    /// same as having no token at all.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(AuthToken(Arc::from(trimmed)))
        }
    }

    /// Reads a token from an environment variable.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().as_deref().and_then(Self::parse)
    }

    /// The raw token, for the Authorization header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Never print the credential itself.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(***{} chars)", self.0.len())
    }
}

/// Precondition shared by every authenticated operation.
///
/// Fails with [`GatewayError::Unauthenticated`] before anything touches the
/// network.
pub fn require_token(token: Option<&AuthToken>) -> GatewayResult<&AuthToken> {
    token.ok_or(GatewayError::Unauthenticated)
}
