//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;

use shield_core::format::format_currency;
use shield_core::pricing::premium_for;
use shield_core::validation::validate_price;
use shield_core::{Money, PolicySummary};
use shield_flow::{upload_documents, CallerMode, ClaimFlow, UploadFailure};
use shield_gateway::{AuthToken, DocumentUpload, Gateway, GatewayConfig};

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Prints `value` as JSON, or hands it to `text` for the human form.
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text(value);
        }
        Ok(())
    }
}

// =============================================================================
// Plans
// =============================================================================

#[derive(Serialize)]
struct QuotedPlan {
    #[serde(flatten)]
    plan: shield_core::PricingPlan,
    premium: Option<Money>,
}

pub async fn plans(
    gateway: &dyn Gateway,
    device_value: Option<&str>,
    out: Output,
) -> anyhow::Result<()> {
    let value = device_value
        .map(|raw| -> anyhow::Result<Money> {
            validate_price("devicePrice", raw)?;
            Ok(Money::parse_decimal(raw)?)
        })
        .transpose()
        .context("Invalid --device-value")?;

    let quoted: Vec<QuotedPlan> = gateway
        .fetch_pricing_plans()
        .await?
        .into_iter()
        .map(|plan| QuotedPlan {
            premium: value.map(|v| premium_for(v, Some(&plan))),
            plan,
        })
        .collect();

    out.emit(&quoted, |quoted| {
        for q in quoted {
            let premium = q
                .premium
                .map(|p| format!("  premium {}", format_currency(p)))
                .unwrap_or_default();
            println!(
                "#{:<4} {:<16} {:>6.2}%{}",
                q.plan.id, q.plan.cover_type, q.plan.cover_percentage, premium
            );
            for component in q.plan.included_components() {
                println!("        - {}", component.name);
            }
        }
    })
}

// =============================================================================
// Policies
// =============================================================================

fn print_policies(policies: &[PolicySummary]) {
    for p in policies {
        println!(
            "{:<6} {:<14} {:<12} {:<24} {}",
            p.id,
            p.policy_number,
            p.status,
            p.policy_owner_name.as_deref().unwrap_or("-"),
            p.cover_amount()
                .map(format_currency)
                .unwrap_or_else(|| "-".into()),
        );
    }
}

pub async fn policies(
    gateway: &dyn Gateway,
    token: Option<AuthToken>,
    names: Vec<String>,
    out: Output,
) -> anyhow::Result<()> {
    if names.is_empty() {
        let all = gateway.fetch_policies(token.as_ref()).await?;
        return out.emit(&all, |all| print_policies(all));
    }

    let mut flow = ClaimFlow::new(CallerMode::SelfService { names }, token);
    flow.enter(gateway).await?;
    if let Some(notice) = flow.notice().filter(|_| !out.json) {
        println!("{notice}");
    }
    out.emit(&flow.policies(), |policies| print_policies(policies))
}

pub async fn search(
    gateway: &dyn Gateway,
    token: Option<AuthToken>,
    query: &str,
    out: Output,
) -> anyhow::Result<()> {
    let mut flow = ClaimFlow::new(CallerMode::Search, token);
    let found = flow.search(gateway, query).await?;
    info!(found, "Search complete");
    if let Some(notice) = flow.notice().filter(|_| !out.json) {
        println!("{notice}");
    }
    out.emit(&flow.policies(), |policies| print_policies(policies))
}

pub async fn policy(
    gateway: &dyn Gateway,
    token: Option<&AuthToken>,
    id: i64,
    out: Output,
) -> anyhow::Result<()> {
    let detail = gateway.fetch_policy_details(token, id).await?;
    out.emit(&detail, |d| {
        print_policies(std::slice::from_ref(&d.policy));
        if let Some(plan) = &d.gadget_pricing {
            println!("plan: {} ({}%)", plan.cover_type, plan.cover_percentage);
        }
        for device in &d.policy_gadgets {
            println!(
                "device: {} {} {}",
                device.device_type,
                device.device_brand.as_deref().unwrap_or(""),
                device.device_model
            );
        }
        for claim in &d.policy_claims {
            println!("claim: {} {}", claim.claim_number, claim.status);
        }
    })
}

// =============================================================================
// Claims
// =============================================================================

pub async fn claims(
    gateway: &dyn Gateway,
    token: Option<&AuthToken>,
    out: Output,
) -> anyhow::Result<()> {
    let claims = gateway.fetch_claims(token).await?;
    out.emit(&claims, |claims| {
        for c in claims {
            println!(
                "{:<6} {:<18} {:<22} {}",
                c.id,
                c.claim_number,
                c.status,
                c.claim_type.as_deref().unwrap_or("-")
            );
        }
    })
}

pub async fn claim(
    gateway: &dyn Gateway,
    token: Option<&AuthToken>,
    id: i64,
    out: Output,
) -> anyhow::Result<()> {
    let detail = gateway.fetch_claim_details(token, id).await?;
    out.emit(&detail, |d| {
        println!("{} {} ({})", d.claim.id, d.claim.claim_number, d.claim.status);
        if let Some(outlet) = &d.device_outlet_name {
            println!("outlet: {outlet}");
        }
        for doc in &d.claim_documents {
            println!(
                "document: {} {}",
                doc.document_name,
                doc.document_file.as_deref().unwrap_or("")
            );
        }
    })
}

pub async fn attach(
    gateway: &dyn Gateway,
    token: Option<&AuthToken>,
    claim_id: i64,
    files: &[PathBuf],
    config: &GatewayConfig,
    out: Output,
) -> anyhow::Result<()> {
    let uploads = files
        .iter()
        .map(|path| read_upload(claim_id, path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    match upload_documents(gateway, token, &uploads, config.max_concurrent_uploads).await {
        Ok(stored) => out.emit(&stored, |stored| {
            println!("Uploaded {} document(s) to claim {claim_id}", stored.len());
        }),
        Err(UploadFailure::Precondition(reason)) => bail!(reason),
        Err(failure) => {
            if let Some(report) = failure.report() {
                for doc in &report.uploaded {
                    eprintln!("uploaded: {}", doc.document_name);
                }
                for failed in &report.failed {
                    eprintln!("failed:   {} ({})", failed.name, failed.error);
                }
            }
            bail!(failure)
        }
    }
}

fn read_upload(claim_id: i64, path: &Path) -> anyhow::Result<DocumentUpload> {
    let content =
        std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());
    Ok(DocumentUpload {
        claim_id,
        name,
        mime_type: mime_type(path).map(str::to_string),
        file_name,
        content,
    })
}

fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => return None,
    })
}

// =============================================================================
// Config
// =============================================================================

pub fn config(config: &GatewayConfig, path: Option<PathBuf>, save: bool) -> anyhow::Result<()> {
    let shown = path.clone().or_else(GatewayConfig::default_config_path);
    if save {
        config.save(path)?;
    }
    if let Some(p) = shown {
        println!("# {}", p.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
