//! Scripted GigGuard session
//!
//! Usage: `gigguard-session [config.toml] [receipt.txt]`. Without a config
//! file the `GIGGUARD_*` environment variables apply.

use anyhow::Context;
use gig_audit::{AuditConfig, GigGuardApp};
use serde_json::json;
use trust_ledger::Address;

const SAMPLE_RECEIPT: &str = "Weekly payout 12/03/2024\nTrip earnings ₹ 1,020.00\nIncentive ₹180\nAdjustment ₹40\nNet ₹1,160.00";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => AuditConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => AuditConfig::from_env().context("loading config from environment")?,
    };

    let receipt = match args.next() {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading receipt {}", path))?,
        None => SAMPLE_RECEIPT.to_string(),
    };

    let app = GigGuardApp::open(config)?;
    let worker = Address::new("worker-1");
    let miner = Address::new("gigguard-node");

    // Trust points
    app.accept_gig(&worker, json!({ "gig": "delivery-101", "platform": "demo" }))
        .await?;
    app.complete_gig(&worker, json!({ "gig": "delivery-101", "platform": "demo" }))
        .await?;

    if let Some(block) = app.mine_trust_points(&miner).await? {
        tracing::info!(hash = %block.hash, nonce = block.nonce, "Block mined");
    }
    if app.mine_trust_points(&miner).await?.is_none() {
        tracing::info!("Mempool empty, second mine skipped");
    }

    tracing::info!(
        worker = %worker,
        trust_points = app.trust_points(&worker).await?,
        ledger_valid = app.verify_ledger().await?,
        "Trust ledger state"
    );

    // Audits
    let analysis = app.analyze_receipt(&receipt)?;
    tracing::info!(
        date = %analysis.detected_date,
        total = %analysis.total_earnings,
        penalty = analysis.penalty_flag,
        "Receipt analyzed"
    );

    let report = app.audit_shadow_ban(&receipt, None)?;
    tracing::info!(
        region = %report.region,
        percentile = report.percentile_rank,
        status = %report.audit_status,
        "{}",
        report.explanation
    );

    app.record_evidence_pack(&receipt)?;

    for entry in app.recent_activity(None)? {
        tracing::info!(
            id = entry.id,
            at = %entry.timestamp.format("%H:%M:%S"),
            event = %entry.event,
            status = %entry.status,
            earnings = %entry.earnings,
            "Audit log"
        );
    }

    println!("{}", app.chain().await?.to_json()?);

    app.shutdown().await?;
    Ok(())
}
