//! Audit log using RocksDB
//!
//! # Column Families
//!
//! - `audit_logs` - Append-only audit entries (key: big-endian sequence id)
//!
//! Ids start at 1 and keep counting across reopen; the next id is recovered
//! from the last key on open. An id is only consumed once its row is
//! written, so a failed write leaves no gap.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Column family name
const CF_AUDIT_LOGS: &str = "audit_logs";

/// Kind of audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    /// Receipt scanned and parsed
    OcrScanComplete,

    /// Shadow-ban benchmark run
    ShadowBanAudit,

    /// Evidence pack assembled
    EvidencePackGenerated,
}

impl AuditEventKind {
    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventKind::OcrScanComplete => "OCR_SCAN_COMPLETE",
            AuditEventKind::ShadowBanAudit => "SHADOW_BAN_AUDIT",
            AuditEventKind::EvidencePackGenerated => "EVIDENCE_PACK_GENERATED",
        }
    }
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Sequence id (starts at 1)
    pub id: u64,

    /// When the entry was written
    pub timestamp: DateTime<Utc>,

    /// Event kind
    pub event: AuditEventKind,

    /// Outcome shown on the monitor
    pub status: String,

    /// Earnings the audit looked at
    pub earnings: Decimal,
}

/// Append-only audit log
pub struct AuditLog {
    db: Arc<DB>,
    path: PathBuf,
    /// Held across the write so ids stay dense and ordered
    next_id: Mutex<u64>,
}

impl fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditLog")
            .field("path", &self.path)
            .field("next_id", &*self.next_id.lock())
            .finish()
    }
}

impl AuditLog {
    /// Open or create the log under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_AUDIT_LOGS,
            Self::cf_options_audit_logs(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        let last_id = Self::last_id(&db)?;

        tracing::info!(
            path = ?path,
            entries = last_id,
            "Opened audit log"
        );

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
            next_id: Mutex::new(last_id + 1),
        })
    }

    fn cf_options_audit_logs() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_AUDIT_LOGS)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_AUDIT_LOGS)))
    }

    fn last_id(db: &DB) -> Result<u64> {
        let cf = db
            .cf_handle(CF_AUDIT_LOGS)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_AUDIT_LOGS)))?;

        match db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                decode_key(&key)
            }
            None => Ok(0),
        }
    }

    /// Append an entry and return it
    pub fn log_event(
        &self,
        event: AuditEventKind,
        status: impl Into<String>,
        earnings: Decimal,
    ) -> Result<AuditEntry> {
        let cf = self.cf_handle()?;
        let mut entry = AuditEntry {
            id: 0,
            timestamp: Utc::now(),
            event,
            status: status.into(),
            earnings,
        };

        self.write_next(|id| {
            entry.id = id;
            let value = bincode::serialize(&entry)?;
            self.db.put_cf(cf, id.to_be_bytes(), &value)?;
            Ok(())
        })?;

        tracing::info!(
            id = entry.id,
            event = %entry.event,
            status = %entry.status,
            earnings = %entry.earnings,
            "Audit event logged"
        );

        Ok(entry)
    }

    /// Run `write` with the next id, consuming the id only on success
    fn write_next<F>(&self, write: F) -> Result<u64>
    where
        F: FnOnce(u64) -> Result<()>,
    {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        write(id)?;
        *next_id = id + 1;
        Ok(id)
    }

    /// Latest `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        let cf = self.cf_handle()?;

        let mut entries = Vec::with_capacity(limit.min(64));
        for item in self.db.iterator_cf(cf, IteratorMode::End).take(limit) {
            let (_, value) = item?;
            entries.push(bincode::deserialize(&value)?);
        }

        Ok(entries)
    }

    /// Get entry by id
    pub fn get(&self, id: u64) -> Result<Option<AuditEntry>> {
        let cf = self.cf_handle()?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Number of entries written so far
    pub fn len(&self) -> u64 {
        *self.next_id.lock() - 1
    }

    /// No entries written yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Database path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decode_key(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| Error::Storage(format!("Malformed audit key of {} bytes", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}
