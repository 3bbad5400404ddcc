//! Immutable chain of blocks
//!
//! A [`Chain`] is a value. Appending never touches the source chain; it
//! returns a new one with the mined block at the tip, so the append-only
//! invariant holds structurally.

use crate::{
    hashing::HashAlgorithm,
    types::{Address, Block, Transaction},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Ordered sequence of blocks starting at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// Blocks in height order (never empty)
    blocks: Vec<Block>,

    /// Hash function every block was built with
    algorithm: HashAlgorithm,
}

impl Chain {
    /// Chain holding only the genesis block
    ///
    /// The genesis block carries one zero-point `GENESIS` transaction,
    /// links to `"0"` and is hashed but not mined.
    pub fn genesis(timestamp_millis: i64, algorithm: HashAlgorithm) -> Self {
        let genesis = Block::new(
            timestamp_millis,
            vec![Transaction::genesis(timestamp_millis)],
            "0",
            algorithm,
        );

        Self {
            blocks: vec![genesis],
            algorithm,
        }
    }

    /// Build a chain from externally supplied blocks
    ///
    /// Only structural emptiness is rejected; hashes and links are not
    /// checked here. Call [`Chain::is_valid`] before trusting the result.
    pub fn from_blocks(blocks: Vec<Block>, algorithm: HashAlgorithm) -> Result<Self> {
        if blocks.is_empty() {
            return Err(Error::InvalidChain(
                "Chain must contain a genesis block".to_string(),
            ));
        }
        Ok(Self { blocks, algorithm })
    }

    /// Parse a JSON snapshot (unvalidated, see [`Chain::from_blocks`])
    pub fn from_json(json: &str) -> Result<Self> {
        let chain: Chain = serde_json::from_str(json)?;
        Self::from_blocks(chain.blocks, chain.algorithm)
    }

    /// Export as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Mine a block over `transactions` and return the extended chain
    pub fn append(
        &self,
        transactions: Vec<Transaction>,
        timestamp_millis: i64,
        difficulty: usize,
    ) -> Result<Self> {
        append_block(self, transactions, timestamp_millis, difficulty)
    }

    /// All blocks, genesis first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Hash function in use
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of blocks including genesis
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a chain holds at least its genesis block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Tip of the chain
    pub fn latest_block(&self) -> &Block {
        // from_blocks and genesis both guarantee one block
        &self.blocks[self.blocks.len() - 1]
    }

    /// Verify hash integrity and linkage from height 1
    ///
    /// Genesis is trusted as-is. Proof-of-work difficulty, timestamp
    /// ordering and transaction id reuse are not checked.
    pub fn is_valid(&self) -> bool {
        for (height, pair) in self.blocks.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);

            if !current.has_valid_hash(self.algorithm) {
                tracing::warn!(height = height + 1, "Block hash does not match contents");
                return false;
            }

            if current.previous_hash != previous.hash {
                tracing::warn!(height = height + 1, "Block is not linked to its predecessor");
                return false;
            }
        }

        true
    }

    /// Trust-point balance of `address`
    ///
    /// `Σ points (to == address) − Σ points (from == address)` over every
    /// mined transaction, recomputed on each call.
    pub fn balance_of(&self, address: &Address) -> i64 {
        self.transactions().map(|tx| tx.delta_for(address)).sum()
    }

    /// Mined transactions touching `address`, in chain order
    pub fn history(&self, address: &Address) -> Vec<&Transaction> {
        self.transactions()
            .filter(|tx| &tx.from == address || &tx.to == address)
            .collect()
    }

    /// Every mined transaction, genesis first
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.blocks.iter().flat_map(|block| block.transactions.iter())
    }
}

/// Pure append: mine a block on top of `chain` and return the new chain
///
/// The block links to the current tip, is mined at `difficulty` with the
/// chain's hash function, and is pushed onto a copy of the block list.
/// Fails with [`Error::InvalidDifficulty`] when no digest can satisfy
/// `difficulty`.
pub fn append_block(
    chain: &Chain,
    transactions: Vec<Transaction>,
    timestamp_millis: i64,
    difficulty: usize,
) -> Result<Chain> {
    let previous_hash = chain.latest_block().hash.clone();
    let block = Block::new(timestamp_millis, transactions, previous_hash, chain.algorithm)
        .mine(difficulty, chain.algorithm)?;

    let mut blocks = Vec::with_capacity(chain.blocks.len() + 1);
    blocks.extend_from_slice(&chain.blocks);
    blocks.push(block);

    Ok(Chain {
        blocks,
        algorithm: chain.algorithm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use serde_json::json;

    const GENESIS_TS: i64 = 1_704_067_200_000;

    fn award(tx_type: TransactionType, to: &str, points: i64) -> Transaction {
        Transaction::new(
            tx_type,
            Address::network(),
            Address::new(to),
            points,
            json!({ "gig": "ride-7" }),
        )
    }

    #[test]
    fn test_genesis_shape() {
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling);
        assert_eq!(chain.len(), 1);

        let genesis = chain.latest_block();
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.transactions.len(), 1);
        assert_eq!(genesis.transactions[0].tx_type, TransactionType::Genesis);
        assert_eq!(genesis.transactions[0].points, 0);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_genesis_is_fixed() {
        let a = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling);
        let b = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling);
        assert_eq!(a.latest_block().hash, b.latest_block().hash);
    }

    #[test]
    fn test_append_leaves_source_untouched() {
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling);
        let next = append_block(
            &chain,
            vec![award(TransactionType::GigAccept, "worker-1", 5)],
            GENESIS_TS + 1_000,
            1,
        )
        .unwrap();

        assert_eq!(chain.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(next.latest_block().previous_hash, chain.latest_block().hash);
        assert!(next.latest_block().hash.starts_with('0'));
        assert!(next.is_valid());
    }

    #[test]
    fn test_balance_and_history() {
        let worker = Address::new("worker-1");
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling)
            .append(
                vec![
                    award(TransactionType::GigAccept, "worker-1", 5),
                    award(TransactionType::GigAccept, "worker-2", 5),
                ],
                GENESIS_TS + 1,
                1,
            )
            .unwrap()
            .append(
                vec![award(TransactionType::GigComplete, "worker-1", 20)],
                GENESIS_TS + 2,
                1,
            )
            .unwrap();

        assert_eq!(chain.balance_of(&worker), 25);
        assert_eq!(chain.balance_of(&Address::new("worker-2")), 5);
        assert_eq!(chain.balance_of(&Address::network()), -30);
        assert_eq!(chain.balance_of(&Address::system()), 0);
        assert_eq!(chain.history(&worker).len(), 2);
    }

    #[test]
    fn test_tampered_points_invalidate_chain() {
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling)
            .append(
                vec![award(TransactionType::GigComplete, "worker-1", 20)],
                GENESIS_TS + 1,
                1,
            )
            .unwrap();

        let mut blocks = chain.blocks().to_vec();
        blocks[1].transactions[0].points = 2_000;
        let tampered = Chain::from_blocks(blocks, chain.algorithm()).unwrap();

        assert!(!tampered.is_valid());
    }

    #[test]
    fn test_rehashed_tamper_breaks_linkage() {
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Sha256)
            .append(vec![award(TransactionType::GigAccept, "w", 5)], GENESIS_TS + 1, 1)
            .unwrap()
            .append(vec![award(TransactionType::GigComplete, "w", 20)], GENESIS_TS + 2, 1)
            .unwrap();

        let mut blocks = chain.blocks().to_vec();
        blocks[1].transactions[0].points = 500;
        blocks[1].hash = blocks[1].compute_hash(HashAlgorithm::Sha256);
        let tampered = Chain::from_blocks(blocks, HashAlgorithm::Sha256).unwrap();

        assert!(!tampered.is_valid());
    }

    #[test]
    fn test_from_blocks_rejects_empty() {
        assert!(Chain::from_blocks(vec![], HashAlgorithm::Rolling).is_err());
    }

    #[test]
    fn test_json_snapshot() {
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Rolling)
            .append(
                vec![award(TransactionType::GigAccept, "worker-1", 5)],
                GENESIS_TS + 1,
                1,
            )
            .unwrap();

        let restored = Chain::from_json(&chain.to_json().unwrap()).unwrap();
        assert_eq!(restored, chain);
        assert!(restored.is_valid());
    }

    #[test]
    fn test_json_round_trip_with_float_data() {
        let ride = Transaction::new(
            TransactionType::GigComplete,
            Address::network(),
            Address::new("worker-1"),
            20,
            json!({ "km": 53.857440000000004, "fare": 9.050220000000001 }),
        );
        let chain = Chain::genesis(GENESIS_TS, HashAlgorithm::Sha256)
            .append(vec![ride], GENESIS_TS + 1, 1)
            .unwrap();

        let json = chain.to_json().unwrap();
        assert!(json.contains("53.857440000000004"));

        let restored = Chain::from_json(&json).unwrap();
        assert!(restored.is_valid());
        assert_eq!(restored, chain);
    }

    #[test]
    fn test_unreachable_difficulty_rejected() {
        let chain = Chain::genesis(0, HashAlgorithm::Rolling);
        let err = append_block(&chain, vec![], 1, 9).unwrap_err();
        assert!(matches!(err, Error::InvalidDifficulty(_)));

        let chain = Chain::genesis(0, HashAlgorithm::Sha256);
        assert!(chain.append(vec![], 1, 65).is_err());
        assert!(chain.append(vec![], 1, HashAlgorithm::Sha256.max_difficulty() + 1).is_err());
    }
}
