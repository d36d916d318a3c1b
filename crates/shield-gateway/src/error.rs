//! # Gateway Error Types
//!
//! Every way a call to the insurance backend can fail.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Precondition   │  │    Remote       │  │     Configuration       │ │
//! │  │  (no network)   │  │                 │  │                         │ │
//! │  │ Unauthenticated │  │  Http{status}   │  │  InvalidConfig          │ │
//! │  │ InvalidRequest  │  │  Transport      │  │  InvalidUrl             │ │
//! │  │                 │  │  Decode         │  │  ConfigLoad/SaveFailed  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Callers never see a raw reqwest::Error: transport failures are        │
//! │  folded into Transport / Decode before they leave this crate.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway error type.
///
/// Cloneable so the workflow engine can keep a failure next to the action
/// that triggered it and still hand a copy to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    // =========================================================================
    // Precondition Errors (raised before any request is sent)
    // =========================================================================
    /// An authenticated operation was called without a bearer token.
    #[error("Authentication required. Please log in.")]
    Unauthenticated,

    /// The call's own arguments are unusable (empty search query, bad MIME type).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the backend's `detail`/`message` field when the body is
    /// JSON, otherwise the body text.
    #[error("HTTP error! status: {status}, message: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[error("Network error: {0}")]
    Transport(String),

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A configuration value is out of range.
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// The backend base URL does not parse or is not http(s).
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            GatewayError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for GatewayError {
    fn from(err: toml::ser::Error) -> Self {
        GatewayError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl GatewayError {
    /// HTTP status of a remote failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the failure was the missing-token precondition.
    ///
    /// The backend's own 401 counts too: the token was rejected.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            GatewayError::Unauthenticated | GatewayError::Http { status: 401, .. }
        )
    }

    /// Returns true if the request was never sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            GatewayError::Unauthenticated | GatewayError::InvalidRequest(_)
        )
    }

    /// Returns true if retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(_) => true,
            GatewayError::Http { status, .. } => *status >= 500 || matches!(status, 408 | 429),
            _ => false,
        }
    }

    /// Returns true if the error comes from configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfig(_)
                | GatewayError::InvalidUrl(_)
                | GatewayError::ConfigLoadFailed(_)
                | GatewayError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
