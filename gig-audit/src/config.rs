//! Configuration for the audit service

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use trust_ledger::LedgerConfig;

/// Audit service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Data directory for the audit log (RocksDB)
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Region used when a request names none
    pub default_region: String,

    /// Entries returned by `recent_activity` without an explicit limit
    pub recent_limit: usize,

    /// Trust-point awards
    pub points: PointsConfig,

    /// Shadow-ban benchmark
    pub benchmark: BenchmarkConfig,

    /// Trust ledger
    pub ledger: LedgerConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/audit"),
            service_name: "gig-audit".to_string(),
            default_region: "Bangalore".to_string(),
            recent_limit: 10,
            points: PointsConfig::default(),
            benchmark: BenchmarkConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

/// Points awarded per gig action (paid by `NETWORK`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    /// Points for accepting a gig
    pub gig_accept: i64,

    /// Points for completing a gig
    pub gig_complete: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            gig_accept: 5,
            gig_complete: 20,
        }
    }
}

/// Daily earnings distribution of a city
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityModel {
    /// Mean daily earnings (INR)
    pub mean: f64,

    /// Standard deviation (INR)
    pub std_dev: f64,
}

/// Shadow-ban benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Regional models keyed by city name
    pub models: BTreeMap<String, CityModel>,

    /// Model used for unknown regions
    pub fallback_region: String,

    /// Percentile below which a worker is flagged as shadow banned
    pub critical_percentile: f64,

    /// Percentile below which visibility is reported as low
    pub warning_percentile: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        let models = [
            ("Bangalore", 1250.0, 300.0),
            ("Mumbai", 1400.0, 350.0),
            ("Delhi", 1300.0, 320.0),
        ]
        .into_iter()
        .map(|(city, mean, std_dev)| (city.to_string(), CityModel { mean, std_dev }))
        .collect();

        Self {
            models,
            fallback_region: "Bangalore".to_string(),
            critical_percentile: 5.0,
            warning_percentile: 15.0,
        }
    }
}

impl BenchmarkConfig {
    /// Check that the fallback exists and every model is usable
    pub fn validate(&self) -> crate::Result<()> {
        if !self.models.contains_key(&self.fallback_region) {
            return Err(crate::Error::Config(format!(
                "Fallback region {} has no model",
                self.fallback_region
            )));
        }

        for (region, model) in &self.models {
            if model.std_dev <= 0.0 || !model.std_dev.is_finite() || !model.mean.is_finite() {
                return Err(crate::Error::Config(format!(
                    "Model for {} needs a finite mean and positive std_dev",
                    region
                )));
            }
        }

        if self.critical_percentile > self.warning_percentile {
            return Err(crate::Error::Config(
                "Critical percentile must not exceed warning percentile".to_string(),
            ));
        }

        Ok(())
    }
}

impl AuditConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = AuditConfig {
            ledger: LedgerConfig::from_env()?,
            ..AuditConfig::default()
        };

        if let Ok(data_dir) = std::env::var("GIGGUARD_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(region) = std::env::var("GIGGUARD_REGION") {
            config.default_region = region;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate nested sections
    pub fn validate(&self) -> crate::Result<()> {
        self.benchmark.validate()?;
        self.ledger.validate()?;

        if self.recent_limit == 0 {
            return Err(crate::Error::Config(
                "recent_limit must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
