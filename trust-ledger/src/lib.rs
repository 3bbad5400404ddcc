//! GigGuard Trust Ledger
//!
//! In-memory, append-only chain of trust-point transactions with a
//! simulated proof-of-work.
//!
//! # Architecture
//!
//! - **Immutable chain**: blocks are values; appending yields a new chain
//! - **Single owner**: one actor task owns the ledger, callers hold handles
//! - **Derived balances**: every balance is recomputed from mined blocks
//!
//! # Invariants
//!
//! - Hash integrity: `block.hash == f(previous_hash, timestamp, transactions, nonce)`
//! - Linkage: `chain[i].previous_hash == chain[i - 1].hash` for all `i > 0`
//! - Append-only: blocks are never modified, removed or reordered
//! - One block per mine: the mempool is flushed into exactly one block
//!
//! The default hash is a 32-bit rolling hash. It is a placeholder and
//! provides no integrity guarantee against a motivated editor; select
//! [`HashAlgorithm::Sha256`] when that matters.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod hashing;
pub mod chain;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{Address, Block, Transaction, TransactionType};
pub use hashing::HashAlgorithm;
pub use chain::{append_block, Chain};
pub use ledger::Ledger;
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use config::LedgerConfig;
pub use metrics::Metrics;
