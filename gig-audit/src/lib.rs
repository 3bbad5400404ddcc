//! GigGuard Audit Service
//!
//! Application layer of the fairness auditor. It owns the trust ledger
//! (through an actor handle) and adds the audit features around it:
//!
//! 1. **Receipt parsing**: earnings, penalty keywords and dates from OCR text
//! 2. **Shadow-ban benchmark**: z-score percentile against a regional model
//! 3. **Audit log**: append-only record of every audit, stored in RocksDB
//! 4. **Trust points**: gig accept/complete awards mined into the ledger
//!
//! OCR, speech-to-text and PDF rendering are external; this crate starts
//! from the text they produce.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod config;
pub mod receipt;
pub mod benchmark;
pub mod audit_log;
pub mod app;

// Re-exports
pub use error::{Error, Result};
pub use config::{AuditConfig, BenchmarkConfig, CityModel, PointsConfig};
pub use receipt::{parse_gig_receipt, ReceiptAnalysis};
pub use benchmark::{ShadowBanBenchmark, ShadowBanReport, VisibilityStatus};
pub use audit_log::{AuditEntry, AuditEventKind, AuditLog};
pub use app::GigGuardApp;
