//! Block hashing and proof-of-work predicates
//!
//! This module provides:
//! - The 32-bit rolling hash used by default (non-cryptographic)
//! - SHA-256 as a drop-in real digest
//! - The canonical preimage every block hash is computed over
//! - Difficulty bounds that keep the nonce search finite
//!
//! The rolling hash exists to give the chain visible, cheap hashes. It is
//! trivially forgeable and must not be treated as an integrity guarantee.
//! Its accumulator is linear in the input, so consecutive nonces would only
//! nudge it; a 32-bit avalanche finalizer spreads every nonce over the whole
//! output range before rendering.

use crate::types::Transaction;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash function applied to block preimages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 32-bit rolling hash, 8 hex digits
    #[default]
    Rolling,
    /// SHA-256, 64 hex digits
    Sha256,
}

impl HashAlgorithm {
    /// Length of the rendered digest in hex characters
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Rolling => 8,
            HashAlgorithm::Sha256 => 64,
        }
    }

    /// Highest difficulty accepted for this hash
    ///
    /// Each extra leading zero multiplies the expected nonce search by 16.
    /// Rolling: 16^4 (about 65k attempts). SHA-256: 16^5 (about 1M attempts).
    pub fn max_difficulty(&self) -> usize {
        match self {
            HashAlgorithm::Rolling => 4,
            HashAlgorithm::Sha256 => 5,
        }
    }

    /// Reject difficulties the nonce search cannot reach
    pub fn check_difficulty(&self, difficulty: usize) -> Result<()> {
        if difficulty > self.max_difficulty() {
            return Err(Error::InvalidDifficulty(format!(
                "Difficulty {} exceeds {} maximum {}",
                difficulty,
                self.name(),
                self.max_difficulty()
            )));
        }
        Ok(())
    }

    /// Fresh hashing state
    pub fn start(&self) -> HashState {
        match self {
            HashAlgorithm::Rolling => HashState::Rolling(0),
            HashAlgorithm::Sha256 => HashState::Sha256(Sha256::new()),
        }
    }

    /// Hash a string and render it as lowercase hex
    pub fn digest(&self, data: &str) -> String {
        let mut state = self.start();
        state.update(data);
        state.finish()
    }

    /// Config name
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Rolling => "rolling",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Parse from config name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rolling" => Some(HashAlgorithm::Rolling),
            "sha256" => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Incremental hashing state
///
/// Lets the miner hash a block's fixed prefix once and only feed the
/// nonce on each attempt.
#[derive(Clone)]
pub enum HashState {
    /// Rolling hash accumulator
    Rolling(i32),
    /// SHA-256 running digest
    Sha256(Sha256),
}

impl HashState {
    /// Feed more input
    pub fn update(&mut self, data: &str) {
        match self {
            HashState::Rolling(hash) => {
                for unit in data.encode_utf16() {
                    *hash = hash
                        .wrapping_shl(5)
                        .wrapping_sub(*hash)
                        .wrapping_add(i32::from(unit));
                }
            }
            HashState::Sha256(hasher) => hasher.update(data.as_bytes()),
        }
    }

    /// Render the digest as lowercase hex
    pub fn finish(self) -> String {
        match self {
            HashState::Rolling(hash) => format!("{:08x}", avalanche(hash as u32)),
            HashState::Sha256(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

impl fmt::Debug for HashState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashState::Rolling(hash) => f.debug_tuple("Rolling").field(hash).finish(),
            HashState::Sha256(_) => f.write_str("Sha256(..)"),
        }
    }
}

/// 32-bit avalanche finalizer (MurmurHash3 `fmix32`)
///
/// A bijection on `u32`; a one-bit change in the input flips about half of
/// the output bits.
fn avalanche(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// 32-bit rolling hash over UTF-16 code units
///
/// `h = (h << 5) - h + c` with two's complement wrap-around, passed through
/// the avalanche finalizer and rendered in 8 zero-padded hex digits.
pub fn rolling_hash(data: &str) -> String {
    let mut state = HashAlgorithm::Rolling.start();
    state.update(data);
    state.finish()
}

/// SHA-256 of a string as lowercase hex
pub fn sha256_hex(data: &str) -> String {
    let mut state = HashAlgorithm::Sha256.start();
    state.update(data);
    state.finish()
}

/// Fixed part of a block preimage: `previous_hash ‖ timestamp_millis ‖ json(transactions)`
pub fn preimage_prefix(
    previous_hash: &str,
    timestamp_millis: i64,
    transactions: &[Transaction],
) -> String {
    // Plain structs with string keys always serialize
    let transactions_json =
        serde_json::to_string(transactions).expect("serialization cannot fail");
    format!("{previous_hash}{timestamp_millis}{transactions_json}")
}

/// Canonical preimage of a block hash
///
/// `previous_hash ‖ timestamp_millis ‖ json(transactions) ‖ nonce`
pub fn block_preimage(
    previous_hash: &str,
    timestamp_millis: i64,
    transactions: &[Transaction],
    nonce: u64,
) -> String {
    let mut preimage = preimage_prefix(previous_hash, timestamp_millis, transactions);
    preimage.push_str(&nonce.to_string());
    preimage
}

/// Check that a hash starts with `difficulty` zero characters
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}
