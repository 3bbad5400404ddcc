//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `trust_ledger_transactions_total` - Transactions accepted into the mempool
//! - `trust_ledger_transactions_rejected_total` - Transactions failing validation
//! - `trust_ledger_blocks_total` - Blocks mined
//! - `trust_ledger_pending_transactions` - Current mempool size
//! - `trust_ledger_pow_attempts` - Histogram of nonce increments per block

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Transactions accepted into the mempool
    pub transactions_total: IntCounter,

    /// Transactions rejected by validation
    pub transactions_rejected: IntCounter,

    /// Blocks mined
    pub blocks_total: IntCounter,

    /// Current mempool size
    pub pending_transactions: IntGauge,

    /// Proof-of-work attempts histogram
    pub pow_attempts: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::new(
            "trust_ledger_transactions_total",
            "Transactions accepted into the mempool",
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let transactions_rejected = IntCounter::new(
            "trust_ledger_transactions_rejected_total",
            "Transactions failing validation",
        )?;
        registry.register(Box::new(transactions_rejected.clone()))?;

        let blocks_total = IntCounter::new("trust_ledger_blocks_total", "Blocks mined")?;
        registry.register(Box::new(blocks_total.clone()))?;

        let pending_transactions = IntGauge::new(
            "trust_ledger_pending_transactions",
            "Current mempool size",
        )?;
        registry.register(Box::new(pending_transactions.clone()))?;

        let pow_attempts = Histogram::with_opts(
            HistogramOpts::new(
                "trust_ledger_pow_attempts",
                "Nonce increments needed per mined block",
            )
            .buckets(vec![0.0, 1.0, 4.0, 16.0, 64.0, 256.0, 1024.0, 16384.0, 262144.0]),
        )?;
        registry.register(Box::new(pow_attempts.clone()))?;

        Ok(Self {
            transactions_total,
            transactions_rejected,
            blocks_total,
            pending_transactions,
            pow_attempts,
            registry,
        })
    }

    /// Record accepted transaction
    pub fn record_transaction(&self, pending: usize) {
        self.transactions_total.inc();
        self.pending_transactions.set(pending as i64);
    }

    /// Record rejected transaction
    pub fn record_rejection(&self) {
        self.transactions_rejected.inc();
    }

    /// Record mined block; the mempool is empty afterwards
    pub fn record_block_mined(&self, nonce: u64) {
        self.blocks_total.inc();
        self.pow_attempts.observe(nonce as f64);
        self.pending_transactions.set(0);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_total", &self.transactions_total.get())
            .field("blocks_total", &self.blocks_total.get())
            .field("pending_transactions", &self.pending_transactions.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transactions_total.get(), 0);
        assert_eq!(metrics.blocks_total.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        // Private registries must not collide
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_rejection();
        assert_eq!(a.transactions_rejected.get(), 1);
        assert_eq!(b.transactions_rejected.get(), 0);
    }

    #[test]
    fn test_pending_gauge_follows_mempool() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transaction(1);
        metrics.record_transaction(2);
        assert_eq!(metrics.pending_transactions.get(), 2);

        metrics.record_block_mined(3);
        assert_eq!(metrics.pending_transactions.get(), 0);
        assert_eq!(metrics.blocks_total.get(), 1);
        assert_eq!(metrics.pow_attempts.get_sample_count(), 1);
    }

    #[test]
    fn test_registry_gathers_all() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.registry().gather().len(), 5);
    }
}
