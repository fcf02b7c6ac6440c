//! Field extraction: resolves attribute paths against decoded records.
//!
//! A [`FieldExtractor`] exists once per table and is shared (via `Arc`) by
//! every scan operator reading that table. Its accessor cache is the only
//! shared mutable state of the scan path:
//!
//! - reads after a path's first resolution are lock-free across shards;
//! - first resolution runs under the owning shard's entry lock, so each
//!   normalized path is parsed at most once.

pub mod normalize;
pub mod path;

use crate::error::ScanResult;
use crate::value::Value;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub use normalize::{AliasNormalizer, CaseInsensitiveNormalizer, IdentityNormalizer, PathNormalizer};
pub use path::{Accessor, Segment, Target};

/// Per-table path resolver with an accessor cache.
pub struct FieldExtractor {
    table: String,
    normalizer: Arc<dyn PathNormalizer>,
    accessors: DashMap<String, Arc<Accessor>>,
    resolutions: AtomicUsize,
}

impl FieldExtractor {
    pub fn new(table: impl Into<String>, normalizer: Arc<dyn PathNormalizer>) -> Self {
        Self {
            table: table.into(),
            normalizer,
            accessors: DashMap::new(),
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Resolve `path` to a cached accessor.
    pub fn resolve(&self, path: &str) -> ScanResult<Arc<Accessor>> {
        let normalized = self.normalizer.normalize(path);
        if let Some(hit) = self.accessors.get(&normalized) {
            return Ok(Arc::clone(hit.value()));
        }

        let entry = self
            .accessors
            .entry(normalized.clone())
            .or_try_insert_with(|| {
                self.resolutions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: "scan", table = %self.table, path = %normalized, "resolving accessor");
                Accessor::parse(&normalized)
                    .map(|a| Arc::new(a.ignoring_case(self.normalizer.ignores_case())))
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Apply a resolved accessor to a decoded record.
    pub fn extract(&self, accessor: &Accessor, key: &Value, value: &Value) -> Value {
        accessor.extract(key, value)
    }

    /// Number of distinct paths parsed so far.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn cached_paths(&self) -> usize {
        self.accessors.len()
    }
}

/// Registry of field extractors, one per table.
pub struct AttributeExtractors {
    default_normalizer: Arc<dyn PathNormalizer>,
    normalizers: DashMap<String, Arc<dyn PathNormalizer>>,
    extractors: DashMap<String, Arc<FieldExtractor>>,
}

impl AttributeExtractors {
    pub fn new() -> Self {
        Self::with_default_normalizer(Arc::new(IdentityNormalizer))
    }

    pub fn with_default_normalizer(normalizer: Arc<dyn PathNormalizer>) -> Self {
        Self {
            default_normalizer: normalizer,
            normalizers: DashMap::new(),
            extractors: DashMap::new(),
        }
    }

    /// Install a table-specific normalizer. Takes effect for extractors
    /// created after the call.
    pub fn register_normalizer(&self, table: impl Into<String>, normalizer: Arc<dyn PathNormalizer>) {
        self.normalizers.insert(table.into(), normalizer);
    }

    /// Extractor for `table`, created on first use.
    pub fn get(&self, table: &str) -> Arc<FieldExtractor> {
        if let Some(hit) = self.extractors.get(table) {
            return Arc::clone(hit.value());
        }
        let entry = self.extractors.entry(table.to_string()).or_insert_with(|| {
            let normalizer = self
                .normalizers
                .get(table)
                .map(|n| Arc::clone(n.value()))
                .unwrap_or_else(|| Arc::clone(&self.default_normalizer));
            Arc::new(FieldExtractor::new(table, normalizer))
        });
        Arc::clone(entry.value())
    }
}

impl Default for AttributeExtractors {
    fn default() -> Self {
        Self::new()
    }
}
