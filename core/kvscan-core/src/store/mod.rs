//! Store boundary: partitioned record sources the scan reads from.
//!
//! The scan depends only on [`RecordSourceProvider`] and [`RecordSource`];
//! [`memory::MemoryStore`] is the in-process implementation.

pub mod memory;

use crate::codec::StoredValue;
use crate::error::ScanResult;
use std::sync::Arc;

pub use memory::{MemoryStore, RecordLoader};

/// A key/value pair as stored.
///
/// Sources hand out owned copies, so the scan never borrows store memory past
/// the call that produced the record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub key: StoredValue,
    pub value: StoredValue,
    /// Expiration instant in epoch millis; `None` never expires.
    pub expires_at: Option<u64>,
}

impl RawRecord {
    pub fn new(key: impl Into<StoredValue>, value: impl Into<StoredValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the record is still live at `as_of`.
    pub fn is_live(&self, as_of: u64) -> bool {
        self.expires_at.is_none_or(|t| t > as_of)
    }
}

/// Iterator over one partition's records.
pub type RecordIter<'a> = Box<dyn Iterator<Item = ScanResult<RawRecord>> + Send + 'a>;

/// Per-partition enumerable of raw records.
///
/// # Contract
///
/// - `iterate` is load-aware: records not yet resident may be loaded
///   synchronously before or during iteration.
/// - Records expired at `as_of` are not yielded.
/// - Backup replica records are yielded only when `include_backup_only` is set.
/// - Failures surface as `StoreAccess` errors, either from `iterate` itself or
///   from individual items.
pub trait RecordSource: Send + Sync {
    fn iterate(&self, as_of: u64, include_backup_only: bool) -> ScanResult<RecordIter<'_>>;
}

/// Resolves a partition id to its record source.
pub trait RecordSourceProvider: Send + Sync {
    fn partition_count(&self) -> usize;

    fn source(&self, partition: usize) -> ScanResult<Arc<dyn RecordSource>>;
}
