//! # Gateway Configuration
//!
//! Where the backend lives and how patient we are with it.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHIELD_API_BASE_URL=https://staging.example.com                    │
//! │     SHIELD_REQUEST_TIMEOUT_SECS=60                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/deviceshield/gateway.toml (Linux)                        │
//! │     ~/Library/Application Support/ke.deviceshield.deviceshield/...     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     https://insure.collegeerp.co.ke, 30s timeout                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # gateway.toml
//! base_url = "https://insure.collegeerp.co.ke"
//! user_agent = "DeviceShield App"
//! request_timeout_secs = 30
//! connect_timeout_secs = 10
//! max_concurrent_uploads = 4
//! ```
//!
//! The bearer token is never part of this file; it is handed to each call
//! by whoever owns the session.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Backend used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://insure.collegeerp.co.ke";

/// User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "DeviceShield App";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_concurrent_uploads() -> usize {
    4
}

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the insurance REST service, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound on claim documents uploaded at the same time.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
        }
    }
}

impl GatewayConfig {
    /// Creates a config pointing at `base_url` with every other value defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (gateway.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> GatewayResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading gateway config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load gateway config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> GatewayResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| GatewayError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GatewayError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| GatewayError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Gateway config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> GatewayResult<()> {
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidUrl(format!(
                "Base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "timeouts must be greater than 0".into(),
            ));
        }

        if self.max_concurrent_uploads == 0 {
            return Err(GatewayError::InvalidConfig(
                "max_concurrent_uploads must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SHIELD_API_BASE_URL") {
            debug!(url = %url, "Overriding base URL from environment");
            self.base_url = url;
        }

        if let Ok(agent) = std::env::var("SHIELD_USER_AGENT") {
            self.user_agent = agent;
        }

        if let Ok(raw) = std::env::var("SHIELD_REQUEST_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric SHIELD_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Ok(raw) = std::env::var("SHIELD_CONNECT_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.connect_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric SHIELD_CONNECT_TIMEOUT_SECS"),
            }
        }

        if let Ok(raw) = std::env::var("SHIELD_MAX_CONCURRENT_UPLOADS") {
            match raw.parse::<usize>() {
                Ok(n) => self.max_concurrent_uploads = n,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric SHIELD_MAX_CONCURRENT_UPLOADS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("ke", "deviceshield", "deviceshield")
            .map(|dirs| dirs.config_dir().join("gateway.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
