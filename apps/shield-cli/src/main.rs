//! # DeviceShield CLI
//!
//! Operator tool for the insurance backend: browse plans with a quoted
//! premium, look policies and claims up, attach claim documents.
//!
//! ## Usage
//! ```bash
//! # Plans with the premium for a KSh 45,000 phone
//! shield plans --device-value 45000
//!
//! # Claimable policies of one holder, or an agent search
//! SHIELD_TOKEN=... shield policies --owner "Amina Otieno" --owner aotieno
//! SHIELD_TOKEN=... shield search POL-0042
//!
//! # Attach files to claim 77
//! SHIELD_TOKEN=... shield attach 77 receipt.pdf photo.jpg
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to change the level.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use shield_gateway::{AuthToken, GatewayConfig, HttpGateway};

/// Environment variable holding the bearer token.
const TOKEN_ENV: &str = "SHIELD_TOKEN";

const DEFAULT_LOG_FILTER: &str = "info,shield=debug";

#[derive(Parser)]
#[command(name = "shield")]
#[command(version)]
#[command(about = "DeviceShield operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List pricing plans
    Plans {
        /// Device value to quote a premium for, e.g. 45000 or 999.99
        #[arg(long)]
        device_value: Option<String>,
    },

    /// List policies; with --owner, only that holder's claimable ones
    Policies {
        /// Holder name; repeat for each name they go by (display name, username)
        #[arg(long)]
        owner: Vec<String>,
    },

    /// Search claimable policies by number or holder name
    Search { query: String },

    /// Show one policy with its devices and claims
    Policy { id: i64 },

    /// List claims
    Claims,

    /// Show one claim with its documents
    Claim { id: i64 },

    /// Upload documents to a claim
    Attach {
        claim_id: i64,

        /// Files to upload; each is labelled with its file stem
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the effective gateway configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = GatewayConfig::load_or_default(cli.config.clone());
    debug!(base_url = %config.base_url, "Configuration loaded");

    if let Commands::Config { save } = cli.command {
        return commands::config(&config, cli.config, save);
    }

    let gateway = HttpGateway::new(&config)?;
    let token = AuthToken::from_env(TOKEN_ENV);
    let out = commands::Output { json: cli.json };

    match cli.command {
        Commands::Plans { device_value } => {
            commands::plans(&gateway, device_value.as_deref(), out).await
        }
        Commands::Policies { owner } => commands::policies(&gateway, token, owner, out).await,
        Commands::Search { query } => commands::search(&gateway, token, &query, out).await,
        Commands::Policy { id } => commands::policy(&gateway, token.as_ref(), id, out).await,
        Commands::Claims => commands::claims(&gateway, token.as_ref(), out).await,
        Commands::Claim { id } => commands::claim(&gateway, token.as_ref(), id, out).await,
        Commands::Attach { claim_id, files } => {
            commands::attach(&gateway, token.as_ref(), claim_id, &files, &config, out).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
