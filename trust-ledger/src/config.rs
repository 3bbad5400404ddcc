//! Configuration for the ledger

use crate::hashing::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero characters required of a mined block hash
    pub difficulty: usize,

    /// Hash function for block hashes
    pub hash_algorithm: HashAlgorithm,

    /// Genesis block timestamp (milliseconds since Unix epoch)
    pub genesis_timestamp_ms: i64,

    /// Actor mailbox capacity
    pub mailbox_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: 1,
            hash_algorithm: HashAlgorithm::Rolling,
            genesis_timestamp_ms: 1_704_067_200_000, // 2024-01-01T00:00:00Z
            mailbox_capacity: 1000,
        }
    }
}

impl LedgerConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(difficulty) = std::env::var("GIGGUARD_LEDGER_DIFFICULTY") {
            config.difficulty = difficulty.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid difficulty: {}", difficulty))
            })?;
        }

        if let Ok(name) = std::env::var("GIGGUARD_LEDGER_HASH") {
            config.hash_algorithm = HashAlgorithm::parse(&name).ok_or_else(|| {
                crate::Error::Config(format!("Unknown hash algorithm: {}", name))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the difficulty is within the algorithm's mining bound
    /// and the actor can receive
    pub fn validate(&self) -> crate::Result<()> {
        self.hash_algorithm
            .check_difficulty(self.difficulty)
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Mailbox capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Rolling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_difficulty_bounded_by_mining_limit() {
        for (hash_algorithm, difficulty) in [
            (HashAlgorithm::Rolling, 5),
            (HashAlgorithm::Rolling, 8),
            (HashAlgorithm::Sha256, 6),
            (HashAlgorithm::Sha256, 64),
        ] {
            let config = LedgerConfig {
                difficulty,
                hash_algorithm,
                ..LedgerConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("exceeds"), "{}", err);
        }

        for hash_algorithm in [HashAlgorithm::Rolling, HashAlgorithm::Sha256] {
            let config = LedgerConfig {
                difficulty: hash_algorithm.max_difficulty(),
                hash_algorithm,
                ..LedgerConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 2\nhash_algorithm = \"sha256\"").unwrap();

        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.mailbox_capacity, 1000);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = \"lots\"").unwrap();

        let err = LedgerConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
