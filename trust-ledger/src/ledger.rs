//! Main ledger orchestration layer
//!
//! This module ties the immutable [`Chain`] to a mutable mempool and
//! exposes the operations the application drives: submit, mine, verify,
//! and balance lookup.
//!
//! # Example
//!
//! ```
//! use trust_ledger::{Address, Ledger, LedgerConfig, Transaction, TransactionType};
//!
//! # fn main() -> trust_ledger::Result<()> {
//! let mut ledger = Ledger::new(LedgerConfig::default())?;
//! let worker = Address::new("worker-1");
//!
//! ledger.add_transaction(Transaction::new(
//!     TransactionType::GigAccept,
//!     Address::network(),
//!     worker.clone(),
//!     5,
//!     serde_json::json!({ "gig": "ride-7" }),
//! ))?;
//! ledger.mine_pending_transactions(&worker)?;
//!
//! assert_eq!(ledger.balance_of(&worker), 5);
//! # Ok(())
//! # }
//! ```

use crate::{
    chain::{append_block, Chain},
    types::{Address, Block, Transaction},
    LedgerConfig, Metrics, Result,
};
use chrono::Utc;

/// Trust-point ledger: chain plus mempool
#[derive(Debug)]
pub struct Ledger {
    /// Mined blocks
    chain: Chain,

    /// Pending transactions in submission order
    pending: Vec<Transaction>,

    /// Configuration
    config: LedgerConfig,

    /// Optional metrics sink
    metrics: Option<Metrics>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block
    pub fn new(config: LedgerConfig) -> Result<Self> {
        config.validate()?;

        let chain = Chain::genesis(config.genesis_timestamp_ms, config.hash_algorithm);

        tracing::info!(
            difficulty = config.difficulty,
            hash_algorithm = %config.hash_algorithm,
            genesis_hash = %chain.latest_block().hash,
            "Trust ledger created"
        );

        Ok(Self {
            chain,
            pending: Vec::new(),
            config,
            metrics: None,
        })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submit a transaction to the mempool
    ///
    /// Rejects transactions without `from` or `to`. Nothing else is
    /// checked: no balance sufficiency, no duplicate ids, no signatures.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<()> {
        if let Err(e) = transaction.validate() {
            tracing::warn!(tx_id = %transaction.id, error = %e, "Transaction rejected");
            if let Some(ref metrics) = self.metrics {
                metrics.record_rejection();
            }
            return Err(e);
        }

        tracing::debug!(
            tx_id = %transaction.id,
            tx_type = %transaction.tx_type,
            to = %transaction.to,
            points = transaction.points,
            "Transaction queued"
        );

        self.pending.push(transaction);

        if let Some(ref metrics) = self.metrics {
            metrics.record_transaction(self.pending.len());
        }

        Ok(())
    }

    /// Mine every pending transaction into one new block
    ///
    /// The mempool is flushed even when empty, producing an empty block;
    /// callers that want to skip empty blocks check
    /// [`Ledger::pending_transactions`] first. `reward_address` is
    /// recorded in the log only; no reward transaction is created. An
    /// unreachable difficulty fails before the mempool is touched.
    pub fn mine_pending_transactions(&mut self, reward_address: &Address) -> Result<Block> {
        self.chain
            .algorithm()
            .check_difficulty(self.config.difficulty)?;

        let transactions = std::mem::take(&mut self.pending);
        let tx_count = transactions.len();

        self.chain = append_block(
            &self.chain,
            transactions,
            Utc::now().timestamp_millis(),
            self.config.difficulty,
        )?;

        let block = self.chain.latest_block().clone();

        tracing::info!(
            block_height = self.chain.len() - 1,
            tx_count,
            nonce = block.nonce,
            hash = %block.hash,
            miner = %reward_address,
            "Block appended"
        );

        if let Some(ref metrics) = self.metrics {
            metrics.record_block_mined(block.nonce);
        }

        Ok(block)
    }

    /// Verify hash integrity and linkage of the whole chain
    pub fn is_chain_valid(&self) -> bool {
        self.chain.is_valid()
    }

    /// Trust-point balance over mined blocks (pending excluded)
    pub fn balance_of(&self, address: &Address) -> i64 {
        self.chain.balance_of(address)
    }

    /// Mined transactions touching `address`
    pub fn history(&self, address: &Address) -> Vec<Transaction> {
        self.chain.history(address).into_iter().cloned().collect()
    }

    /// Pending transactions in submission order
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending
    }

    /// Current chain value
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Tip of the chain
    pub fn latest_block(&self) -> &Block {
        self.chain.latest_block()
    }

    /// Configuration in use
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}
