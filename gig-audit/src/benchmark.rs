//! Shadow-ban benchmark
//!
//! Places a worker's daily earnings on the normal distribution of their
//! city and flags results in the bottom tail. A full-time worker landing
//! below the critical percentile points at algorithmic throttling rather
//! than bad luck.

use crate::config::{BenchmarkConfig, CityModel};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Benchmark outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityStatus {
    /// Below the critical percentile
    #[serde(rename = "CRITICAL: Statistical Anomaly Detected")]
    Critical,

    /// Below the warning percentile
    #[serde(rename = "Warning: Low Visibility")]
    Warning,

    /// Healthy
    #[serde(rename = "Normal")]
    Normal,
}

impl VisibilityStatus {
    /// Human readable status line
    pub fn label(&self) -> &'static str {
        match self {
            VisibilityStatus::Critical => "CRITICAL: Statistical Anomaly Detected",
            VisibilityStatus::Warning => "Warning: Low Visibility",
            VisibilityStatus::Normal => "Normal",
        }
    }
}

impl fmt::Display for VisibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a shadow-ban check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowBanReport {
    /// Region as requested
    pub region: String,

    /// Mean of the model actually used
    pub model_mean: f64,

    /// Earnings under test
    pub your_earnings: Decimal,

    /// Percentile rank (0-100, two decimals)
    pub percentile_rank: f64,

    /// Earnings fall below the critical percentile
    pub is_shadow_banned: bool,

    /// Visibility status
    pub audit_status: VisibilityStatus,

    /// Explanation for the worker
    pub explanation: String,
}

/// Regional earnings benchmark
#[derive(Debug, Clone)]
pub struct ShadowBanBenchmark {
    config: BenchmarkConfig,
}

impl Default for ShadowBanBenchmark {
    fn default() -> Self {
        Self::new(BenchmarkConfig::default())
    }
}

impl ShadowBanBenchmark {
    /// Create benchmark from configuration
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Model for a region, falling back to the configured default
    pub fn model_for(&self, region: &str) -> CityModel {
        self.config
            .models
            .get(region)
            .or_else(|| self.config.models.get(&self.config.fallback_region))
            .copied()
            .unwrap_or(CityModel {
                mean: 1250.0,
                std_dev: 300.0,
            })
    }

    /// Known regions
    pub fn regions(&self) -> Vec<String> {
        self.config.models.keys().cloned().collect()
    }

    /// Run the check
    pub fn check(&self, earnings: Decimal, region: &str) -> ShadowBanReport {
        let model = self.model_for(region);
        let value = earnings.to_f64().unwrap_or(0.0);
        let percentile = percentile_rank(value, model.mean, model.std_dev);

        let (audit_status, explanation) = if percentile < self.config.critical_percentile {
            let sigma = (model.mean - value) / model.std_dev;
            (
                VisibilityStatus::Critical,
                format!(
                    "Your earnings (₹{}) are in the bottom {}% of {}. This is {:.1} Sigma deviations below the mean, indicating algorithmic throttling.",
                    earnings, percentile, region, sigma
                ),
            )
        } else if percentile < self.config.warning_percentile {
            (
                VisibilityStatus::Warning,
                format!(
                    "You are earning less than {}% of drivers in {}. Monitor closely.",
                    100.0 - self.config.warning_percentile,
                    region
                ),
            )
        } else {
            (
                VisibilityStatus::Normal,
                format!(
                    "Your account visibility is healthy (Better than {}% of drivers).",
                    percentile
                ),
            )
        };

        let is_shadow_banned = audit_status == VisibilityStatus::Critical;
        if is_shadow_banned {
            tracing::warn!(region, percentile, earnings = %earnings, "Shadow ban suspected");
        } else {
            tracing::debug!(region, percentile, status = %audit_status, "Benchmark checked");
        }

        ShadowBanReport {
            region: region.to_string(),
            model_mean: model.mean,
            your_earnings: earnings,
            percentile_rank: percentile,
            is_shadow_banned,
            audit_status,
            explanation,
        }
    }
}

/// Normal CDF percentile of `value`, rounded to two decimals
///
/// Ties round to even on the exact binary value, so a percentile sitting
/// on `x.xx5` keeps the digit its neighbours in the table would show.
pub fn percentile_rank(value: f64, mean: f64, std_dev: f64) -> f64 {
    let z = (value - mean) / std_dev;
    let cdf = 0.5 * (1.0 + libm::erf(z / std::f64::consts::SQRT_2));
    round_half_even(cdf * 100.0, 2)
}

fn round_half_even(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_string().parse().ok())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmark() -> ShadowBanBenchmark {
        ShadowBanBenchmark::default()
    }

    #[test]
    fn test_delhi_percentiles_pinned() {
        let delhi = |earnings: u32| benchmark().check(Decimal::from(earnings), "Delhi");

        assert_eq!(delhi(879).percentile_rank, 9.41);
        assert_eq!(delhi(55).percentile_rank, 0.0);
        assert_eq!(delhi(1721).percentile_rank, 90.59);
        assert_eq!(delhi(2545).percentile_rank, 100.0);
        assert_eq!(delhi(1300).percentile_rank, 50.0);
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(0.375, 2), 0.38);
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(12.166, 2), 12.17);
    }

    #[test]
    fn test_mean_is_fiftieth_percentile() {
        let report = benchmark().check(Decimal::from(1250), "Bangalore");
        assert_eq!(report.percentile_rank, 50.0);
        assert_eq!(report.audit_status, VisibilityStatus::Normal);
        assert!(!report.is_shadow_banned);
    }

    #[test]
    fn test_critical_tail() {
        let report = benchmark().check(Decimal::from(500), "Bangalore");
        assert_eq!(report.percentile_rank, 0.62);
        assert_eq!(report.audit_status, VisibilityStatus::Critical);
        assert!(report.is_shadow_banned);
        assert!(report.explanation.contains("2.5 Sigma"));
    }

    #[test]
    fn test_warning_band() {
        let report = benchmark().check(Decimal::from(900), "Bangalore");
        assert_eq!(report.percentile_rank, 12.17);
        assert_eq!(report.audit_status, VisibilityStatus::Warning);
        assert!(!report.is_shadow_banned);
        assert!(report.explanation.contains("85%"));
    }

    #[test]
    fn test_above_mean_is_normal() {
        let report = benchmark().check(Decimal::from(1600), "Bangalore");
        assert_eq!(report.percentile_rank, 87.83);
        assert_eq!(report.audit_status, VisibilityStatus::Normal);
    }

    #[test]
    fn test_regional_model() {
        let report = benchmark().check(Decimal::from(1400), "Mumbai");
        assert_eq!(report.model_mean, 1400.0);
        assert_eq!(report.percentile_rank, 50.0);
    }

    #[test]
    fn test_unknown_region_falls_back() {
        let report = benchmark().check(Decimal::from(1250), "Atlantis");
        assert_eq!(report.region, "Atlantis");
        assert_eq!(report.model_mean, 1250.0);
        assert_eq!(report.percentile_rank, 50.0);
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&VisibilityStatus::Warning).unwrap();
        assert_eq!(json, "\"Warning: Low Visibility\"");
    }
}
