//! Application state
//!
//! [`GigGuardApp`] is the one place user actions enter the system. It owns
//! the ledger (through its actor handle), the audit log and the benchmark,
//! and is passed around explicitly instead of living in a global.

use crate::{
    audit_log::{AuditEntry, AuditEventKind, AuditLog},
    benchmark::{ShadowBanBenchmark, ShadowBanReport},
    config::{AuditConfig, PointsConfig},
    receipt::{parse_gig_receipt, ReceiptAnalysis},
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use trust_ledger::{
    spawn_ledger_actor, Address, Block, Chain, Ledger, LedgerHandle, Metrics, Transaction,
    TransactionType,
};

const STATUS_UNFAIR_PENALTY: &str = "UNFAIR PENALTY";
const STATUS_SAFE: &str = "SAFE";
const STATUS_HIGH_RISK: &str = "HIGH RISK DETECTED";
const STATUS_NORMAL_VISIBILITY: &str = "NORMAL VISIBILITY";
const STATUS_EVIDENCE_COMPILED: &str = "PDF + AUDIO COMPILED";

/// GigGuard application state
#[derive(Debug)]
pub struct GigGuardApp {
    ledger: LedgerHandle,
    audit_log: Arc<AuditLog>,
    benchmark: ShadowBanBenchmark,
    points: PointsConfig,
    default_region: String,
    recent_limit: usize,
    metrics: Option<Metrics>,
    // Serializes the empty-mempool check with the mine that follows it
    mining: Mutex<()>,
}

impl GigGuardApp {
    /// Assemble from already constructed parts, with default awards
    pub fn new(
        ledger: LedgerHandle,
        audit_log: Arc<AuditLog>,
        benchmark: ShadowBanBenchmark,
    ) -> Self {
        let defaults = AuditConfig::default();
        Self {
            ledger,
            audit_log,
            benchmark,
            points: defaults.points,
            default_region: defaults.default_region,
            recent_limit: defaults.recent_limit,
            metrics: None,
            mining: Mutex::new(()),
        }
    }

    /// Build everything from configuration
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: AuditConfig) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;
        let ledger = Ledger::new(config.ledger.clone())?.with_metrics(metrics.clone());
        let audit_log = AuditLog::open(&config.data_dir)?;

        tracing::info!(
            service = %config.service_name,
            data_dir = ?config.data_dir,
            default_region = %config.default_region,
            "GigGuard app started"
        );

        Ok(Self {
            ledger: spawn_ledger_actor(ledger),
            audit_log: Arc::new(audit_log),
            benchmark: ShadowBanBenchmark::new(config.benchmark),
            points: config.points,
            default_region: config.default_region,
            recent_limit: config.recent_limit,
            metrics: Some(metrics),
            mining: Mutex::new(()),
        })
    }

    // Trust points

    /// Award points for accepting a gig (not mined yet)
    pub async fn accept_gig(
        &self,
        worker: &Address,
        gig_data: serde_json::Value,
    ) -> Result<Transaction> {
        self.award(TransactionType::GigAccept, worker, self.points.gig_accept, gig_data)
            .await
    }

    /// Award points for completing a gig (not mined yet)
    pub async fn complete_gig(
        &self,
        worker: &Address,
        gig_data: serde_json::Value,
    ) -> Result<Transaction> {
        self.award(TransactionType::GigComplete, worker, self.points.gig_complete, gig_data)
            .await
    }

    async fn award(
        &self,
        tx_type: TransactionType,
        worker: &Address,
        points: i64,
        gig_data: serde_json::Value,
    ) -> Result<Transaction> {
        let transaction = Transaction::new(
            tx_type,
            Address::network(),
            worker.clone(),
            points,
            gig_data,
        );
        self.ledger.add_transaction(transaction.clone()).await?;

        tracing::info!(
            tx_id = %transaction.id,
            tx_type = %tx_type,
            worker = %worker,
            points,
            "Trust points queued"
        );

        Ok(transaction)
    }

    /// Mine pending awards; `None` when there is nothing to mine
    pub async fn mine_trust_points(&self, miner: &Address) -> Result<Option<Block>> {
        let _guard = self.mining.lock().await;

        if self.ledger.pending_transactions().await?.is_empty() {
            tracing::debug!(miner = %miner, "Nothing to mine");
            return Ok(None);
        }

        let block = self.ledger.mine_pending_transactions(miner.clone()).await?;
        Ok(Some(block))
    }

    /// Mined balance of an address
    pub async fn trust_points(&self, address: &Address) -> Result<i64> {
        Ok(self.ledger.balance_of(address.clone()).await?)
    }

    /// Mined transactions touching an address
    pub async fn trust_history(&self, address: &Address) -> Result<Vec<Transaction>> {
        Ok(self.ledger.history(address.clone()).await?)
    }

    /// Awards waiting to be mined
    pub async fn pending_awards(&self) -> Result<Vec<Transaction>> {
        Ok(self.ledger.pending_transactions().await?)
    }

    /// Verify ledger integrity
    pub async fn verify_ledger(&self) -> Result<bool> {
        let valid = self.ledger.is_chain_valid().await?;
        if !valid {
            tracing::error!("Trust ledger failed verification");
        }
        Ok(valid)
    }

    /// Snapshot of the chain (exportable as JSON)
    pub async fn chain(&self) -> Result<Chain> {
        Ok(self.ledger.chain().await?)
    }

    // Audits

    /// Parse a receipt and log the scan
    pub fn analyze_receipt(&self, raw_text: &str) -> Result<ReceiptAnalysis> {
        let analysis = parse_gig_receipt(raw_text);
        let status = if analysis.penalty_flag {
            STATUS_UNFAIR_PENALTY
        } else {
            STATUS_SAFE
        };

        self.audit_log
            .log_event(AuditEventKind::OcrScanComplete, status, analysis.total_earnings)?;

        Ok(analysis)
    }

    /// Benchmark the receipt's earnings against a region (default region when `None`)
    pub fn audit_shadow_ban(
        &self,
        raw_text: &str,
        region: Option<&str>,
    ) -> Result<ShadowBanReport> {
        let analysis = parse_gig_receipt(raw_text);
        let region = region.unwrap_or(self.default_region.as_str());
        let report = self.benchmark.check(analysis.total_earnings, region);

        let status = if report.is_shadow_banned {
            STATUS_HIGH_RISK
        } else {
            STATUS_NORMAL_VISIBILITY
        };

        self.audit_log
            .log_event(AuditEventKind::ShadowBanAudit, status, report.your_earnings)?;

        Ok(report)
    }

    /// Log an evidence pack for a receipt
    ///
    /// Rendering the pack is left to the caller; this records that it was
    /// compiled and returns the parsed receipt it is built from.
    pub fn record_evidence_pack(&self, raw_text: &str) -> Result<ReceiptAnalysis> {
        let analysis = parse_gig_receipt(raw_text);

        self.audit_log.log_event(
            AuditEventKind::EvidencePackGenerated,
            STATUS_EVIDENCE_COMPILED,
            analysis.total_earnings,
        )?;

        Ok(analysis)
    }

    /// Newest audit entries first (configured default when `None`)
    pub fn recent_activity(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
        self.audit_log.recent(limit.unwrap_or(self.recent_limit))
    }

    /// Ledger metrics, when built through [`GigGuardApp::open`]
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Stop the ledger actor
    pub async fn shutdown(&self) -> Result<()> {
        self.ledger.shutdown().await?;
        Ok(())
    }
}
