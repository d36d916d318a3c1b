//! # shield-gateway: Backend Gateway for DeviceShield
//!
//! A thin async layer over the insurance REST service. It turns typed calls
//! into HTTP requests and HTTP outcomes into typed results.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        shield-gateway                                   │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐    │
//! │  │   client    │  │    http     │  │   payload   │  │    auth     │    │
//! │  │  Gateway    │◄─┤ HttpGateway │  │  wire types │  │  AuthToken  │    │
//! │  │  (trait)    │  │  (reqwest)  │  │  receipts   │  │  required?  │    │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └─────────────┘    │
//! │                                                                         │
//! │  ┌─────────────┐  ┌─────────────┐                                      │
//! │  │   config    │  │    error    │                                      │
//! │  │ toml + env  │  │GatewayError │                                      │
//! │  └─────────────┘  └─────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use shield_gateway::{Gateway, GatewayConfig, HttpGateway};
//!
//! # async fn run() -> shield_gateway::GatewayResult<()> {
//! let gateway = HttpGateway::new(&GatewayConfig::load_or_default(None))?;
//! let plans = gateway.fetch_pricing_plans().await?;
//! println!("{} plans on offer", plans.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod payload;

pub use auth::AuthToken;
pub use client::Gateway;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use http::HttpGateway;
pub use payload::*;
