//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (serde_json feeds the block hash)
//! - Immutability once accepted (no setters, blocks are values)
//! - Integer arithmetic (trust points are whole numbers)

use crate::hashing::{block_preimage, meets_difficulty, preimage_prefix, HashAlgorithm};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Participant address (worker id, system account, etc.)
///
/// An empty address counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Network account that funds every point award
    pub const NETWORK: &'static str = "NETWORK";

    /// System account used by the genesis transaction
    pub const SYSTEM: &'static str = "SYSTEM";

    /// Create new address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The `NETWORK` address
    pub fn network() -> Self {
        Self::new(Self::NETWORK)
    }

    /// The `SYSTEM` address
    pub fn system() -> Self {
        Self::new(Self::SYSTEM)
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no address was supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Kind of point-awarding transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Synthetic transaction of the genesis block
    Genesis,
    /// Worker accepted a gig
    GigAccept,
    /// Worker completed a gig
    GigComplete,
}

impl TransactionType {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Genesis => "GENESIS",
            TransactionType::GigAccept => "GIG_ACCEPT",
            TransactionType::GigComplete => "GIG_COMPLETE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Point-awarding transaction
///
/// `points` is credited to `to` and debited from `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Type of transaction
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Debited address
    #[serde(default)]
    pub from: Address,

    /// Credited address
    #[serde(default)]
    pub to: Address,

    /// Signed point delta
    pub points: i64,

    /// Opaque payload (gig details, etc.)
    #[serde(default)]
    pub data: serde_json::Value,

    /// Creation time (milliseconds since Unix epoch)
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,
}

impl Transaction {
    /// Create a transaction stamped with the current time
    pub fn new(
        tx_type: TransactionType,
        from: Address,
        to: Address,
        points: i64,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            tx_type,
            from,
            to,
            points,
            data,
            timestamp_millis: Utc::now().timestamp_millis(),
        }
    }

    /// The synthetic genesis transaction (zero points, fixed id)
    pub fn genesis(timestamp_millis: i64) -> Self {
        Self {
            id: Uuid::nil(),
            tx_type: TransactionType::Genesis,
            from: Address::system(),
            to: Address::system(),
            points: 0,
            data: serde_json::json!({ "message": "GigGuard trust ledger genesis" }),
            timestamp_millis,
        }
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(Error::InvalidTransaction(
                "Transaction must include from address".to_string(),
            ));
        }
        if self.to.is_empty() {
            return Err(Error::InvalidTransaction(
                "Transaction must include to address".to_string(),
            ));
        }
        Ok(())
    }

    /// Creation time
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis)
    }

    /// Signed effect of this transaction on `address`
    pub fn delta_for(&self, address: &Address) -> i64 {
        let mut delta = 0;
        if &self.from == address {
            delta -= self.points;
        }
        if &self.to == address {
            delta += self.points;
        }
        delta
    }
}

/// Block of transactions linked to its predecessor by hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block timestamp (milliseconds since Unix epoch)
    #[serde(rename = "timestamp")]
    pub timestamp_millis: i64,

    /// Transactions in mempool order
    pub transactions: Vec<Transaction>,

    /// Hash of previous block (`"0"` for genesis)
    pub previous_hash: String,

    /// Proof-of-work counter
    pub nonce: u64,

    /// Hash of this block's contents
    pub hash: String,
}

impl Block {
    /// Create an unmined block with its hash computed at nonce 0
    pub fn new(
        timestamp_millis: i64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
        algorithm: HashAlgorithm,
    ) -> Self {
        let mut block = Self {
            timestamp_millis,
            transactions,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash(algorithm);
        block
    }

    /// Compute block hash from its fields
    pub fn compute_hash(&self, algorithm: HashAlgorithm) -> String {
        algorithm.digest(&block_preimage(
            &self.previous_hash,
            self.timestamp_millis,
            &self.transactions,
            self.nonce,
        ))
    }

    /// Search nonces until the hash has `difficulty` leading zeros
    ///
    /// The starting nonce is tried first; the returned block's `nonce`
    /// equals the number of increments performed. Difficulties above
    /// [`HashAlgorithm::max_difficulty`] are rejected before any work.
    pub fn mine(mut self, difficulty: usize, algorithm: HashAlgorithm) -> Result<Self> {
        algorithm.check_difficulty(difficulty)?;

        if meets_difficulty(&self.hash, difficulty) {
            return Ok(self);
        }

        let mut prefix = algorithm.start();
        prefix.update(&preimage_prefix(
            &self.previous_hash,
            self.timestamp_millis,
            &self.transactions,
        ));

        while !meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            let mut attempt = prefix.clone();
            attempt.update(&self.nonce.to_string());
            self.hash = attempt.finish();
        }

        tracing::debug!(
            nonce = self.nonce,
            hash = %self.hash,
            difficulty,
            "Block mined"
        );

        Ok(self)
    }

    /// Check stored hash against the recomputed one
    pub fn has_valid_hash(&self, algorithm: HashAlgorithm) -> bool {
        self.hash == self.compute_hash(algorithm)
    }

    /// Block time
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn award(to: &str, points: i64) -> Transaction {
        Transaction::new(
            TransactionType::GigAccept,
            Address::network(),
            Address::new(to),
            points,
            json!({ "gig": "delivery-42" }),
        )
    }

    #[test]
    fn test_validate_requires_addresses() {
        let mut tx = award("worker-1", 5);
        assert!(tx.validate().is_ok());

        tx.from = Address::default();
        let err = tx.validate().unwrap_err();
        assert!(err.to_string().contains("from"));

        let tx = award("", 5);
        let err = tx.validate().unwrap_err();
        assert!(err.to_string().contains("to"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": Uuid::now_v7(),
            "type": "GIG_COMPLETE",
            "to": "worker-1",
            "points": 20,
            "timestamp": 1_700_000_000_000i64,
        }))
        .unwrap();

        assert_eq!(tx.tx_type, TransactionType::GigComplete);
        assert!(tx.from.is_empty());
        assert!(tx.validate().is_err());
    }

    #[test]
    fn test_transaction_type_wire_names() {
        let json = serde_json::to_string(&TransactionType::GigAccept).unwrap();
        assert_eq!(json, "\"GIG_ACCEPT\"");
        assert_eq!(TransactionType::Genesis.to_string(), "GENESIS");
    }

    #[test]
    fn test_delta_for() {
        let tx = award("worker-1", 5);
        assert_eq!(tx.delta_for(&Address::new("worker-1")), 5);
        assert_eq!(tx.delta_for(&Address::network()), -5);
        assert_eq!(tx.delta_for(&Address::new("someone-else")), 0);
    }

    #[test]
    fn test_block_hash_depends_on_every_field() {
        let block = Block::new(1_000, vec![award("w", 5)], "0", HashAlgorithm::Rolling);
        assert!(block.has_valid_hash(HashAlgorithm::Rolling));

        let mut tampered = block.clone();
        tampered.transactions[0].points = 500;
        assert!(!tampered.has_valid_hash(HashAlgorithm::Rolling));

        let mut relinked = block.clone();
        relinked.previous_hash = "ffff".to_string();
        assert!(!relinked.has_valid_hash(HashAlgorithm::Rolling));

        let mut renonced = block;
        renonced.nonce += 1;
        assert!(!renonced.has_valid_hash(HashAlgorithm::Rolling));
    }

    #[test]
    fn test_mine_meets_difficulty() {
        for algorithm in [HashAlgorithm::Rolling, HashAlgorithm::Sha256] {
            let block = Block::new(1_000, vec![award("w", 20)], "0", algorithm)
                .mine(1, algorithm)
                .unwrap();
            assert!(block.hash.starts_with('0'));
            assert!(block.has_valid_hash(algorithm));
        }
    }

    #[test]
    fn test_mine_difficulty_zero_is_noop() {
        let block = Block::new(1_000, vec![], "0", HashAlgorithm::Rolling);
        let mined = block.clone().mine(0, HashAlgorithm::Rolling).unwrap();
        assert_eq!(mined, block);
    }

    #[test]
    fn test_mine_rejects_unreachable_difficulty() {
        let block = Block::new(1_000, vec![], "0", HashAlgorithm::Rolling);
        let err = block.mine(9, HashAlgorithm::Rolling).unwrap_err();
        assert!(matches!(err, Error::InvalidDifficulty(_)));
    }

    #[test]
    fn test_default_difficulty_mines_quickly() {
        // One leading hex zero: 1 in 16 per attempt
        let mut total = 0u64;
        let mut worst = 0u64;
        for ts in 0..200i64 {
            let block = Block::new(
                1_704_067_200_000 + ts,
                vec![award("w", 5)],
                "0",
                HashAlgorithm::Rolling,
            )
            .mine(1, HashAlgorithm::Rolling)
            .unwrap();
            total += block.nonce;
            worst = worst.max(block.nonce);
        }
        assert!(total / 200 < 64, "mean nonce {}", total / 200);
        assert!(worst < 1_000, "worst nonce {}", worst);
    }

    #[test]
    fn test_wire_field_is_timestamp() {
        let value = serde_json::to_value(award("w", 5)).unwrap();
        assert!(value.get("timestamp").is_some());
        assert!(value.get("timestamp_millis").is_none());

        let block = Block::new(1_000, vec![], "0", HashAlgorithm::Rolling);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["timestamp"], 1_000);
    }
}
