//! In-memory partitioned store.
//!
//! Each partition keeps its resident records in a `BTreeMap` keyed by the
//! encoded key, so iteration order is stable between scans. Partitions may be
//! backed by a [`RecordLoader`] that supplies records on first iteration.

use crate::codec::{BincodeCodec, StoredValue, ValueCodec};
use crate::error::{ScanError, ScanResult};
use crate::store::{RawRecord, RecordIter, RecordSource, RecordSourceProvider};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fixed seeds keep key → partition routing identical across processes.
const ROUTING_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Supplies the records of a partition that are not yet resident.
pub trait RecordLoader: Send + Sync {
    fn load(&self, partition: usize) -> ScanResult<Vec<RawRecord>>;
}

impl<F> RecordLoader for F
where
    F: Fn(usize) -> ScanResult<Vec<RawRecord>> + Send + Sync,
{
    fn load(&self, partition: usize) -> ScanResult<Vec<RawRecord>> {
        self(partition)
    }
}

#[derive(Default)]
struct PartitionState {
    loaded: bool,
    primary: BTreeMap<Vec<u8>, RawRecord>,
    backup: BTreeMap<Vec<u8>, RawRecord>,
}

/// One partition of a [`MemoryStore`].
pub struct MemoryPartition {
    id: usize,
    state: RwLock<PartitionState>,
    loader: Option<Arc<dyn RecordLoader>>,
    codec: Arc<dyn ValueCodec>,
}

impl MemoryPartition {
    fn new(id: usize, loader: Option<Arc<dyn RecordLoader>>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            id,
            state: RwLock::new(PartitionState {
                loaded: loader.is_none(),
                ..PartitionState::default()
            }),
            loader,
            codec,
        }
    }

    /// Make loader-supplied records resident. Records written before the
    /// load keep precedence over loaded ones.
    fn ensure_loaded(&self) -> ScanResult<()> {
        if self.state.read().loaded {
            return Ok(());
        }
        let Some(loader) = self.loader.as_ref() else {
            return Ok(());
        };

        let mut state = self.state.write();
        if state.loaded {
            return Ok(());
        }
        let records = loader
            .load(self.id)
            .map_err(|e| ScanError::store(self.id, format!("load failed: {e}")))?;
        let count = records.len();
        for record in records {
            let id = key_identity(self.id, self.codec.as_ref(), &record.key)?;
            state.primary.entry(id).or_insert(record);
        }
        state.loaded = true;
        tracing::debug!(target: "scan", partition = self.id, records = count, "partition loaded");
        Ok(())
    }

    /// Number of primary records currently resident.
    pub fn resident_len(&self) -> usize {
        self.state.read().primary.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }
}

impl RecordSource for MemoryPartition {
    fn iterate(&self, as_of: u64, include_backup_only: bool) -> ScanResult<RecordIter<'_>> {
        self.ensure_loaded()?;

        let state = self.state.read();
        let mut records: Vec<RawRecord> = state
            .primary
            .values()
            .filter(|r| r.is_live(as_of))
            .cloned()
            .collect();
        if include_backup_only {
            records.extend(state.backup.values().filter(|r| r.is_live(as_of)).cloned());
        }
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

/// Partitioned in-memory key/value store.
///
/// # Contract
///
/// - `put*`: upsert semantics within the target partition.
/// - `put` routes by key hash; `put_in_partition` places explicitly.
/// - Keys are identified by their decoded logical value, so a key stored
///   serialized and the same key stored logically are one record and route
///   to the same partition. Serialized keys must be readable by the store's
///   codec ([`BincodeCodec`] unless configured otherwise).
/// - Iteration yields owned copies, so writes after a scan never affect rows
///   already buffered by an operator.
pub struct MemoryStore {
    partitions: Vec<Arc<MemoryPartition>>,
    routing: ahash::RandomState,
    codec: Arc<dyn ValueCodec>,
}

impl MemoryStore {
    /// Create a store with `partition_count` fully resident partitions.
    pub fn new(partition_count: usize) -> Self {
        Self::with_options(partition_count, Arc::new(BincodeCodec), None)
    }

    /// Create a store whose partitions load their records lazily.
    pub fn with_loader(partition_count: usize, loader: Arc<dyn RecordLoader>) -> Self {
        Self::with_options(partition_count, Arc::new(BincodeCodec), Some(loader))
    }

    /// Create a store reading serialized keys with `codec`, optionally
    /// backed by a loader.
    pub fn with_options(
        partition_count: usize,
        codec: Arc<dyn ValueCodec>,
        loader: Option<Arc<dyn RecordLoader>>,
    ) -> Self {
        let [k0, k1, k2, k3] = ROUTING_SEEDS;
        Self {
            partitions: (0..partition_count)
                .map(|id| Arc::new(MemoryPartition::new(id, loader.clone(), Arc::clone(&codec))))
                .collect(),
            routing: ahash::RandomState::with_seeds(k0, k1, k2, k3),
            codec,
        }
    }

    fn partition(&self, partition: usize) -> ScanResult<&Arc<MemoryPartition>> {
        self.partitions.get(partition).ok_or_else(|| {
            ScanError::store(
                partition,
                format!("partition out of range ({})", self.partitions.len()),
            )
        })
    }

    /// Owning partition of `key`.
    pub fn partition_for(&self, key: &StoredValue) -> ScanResult<usize> {
        if self.partitions.is_empty() {
            return Err(ScanError::InvalidArguments(
                "store has no partitions".to_string(),
            ));
        }
        let id = key_identity(0, self.codec.as_ref(), key)?;
        Ok((self.routing.hash_one(&id) % self.partitions.len() as u64) as usize)
    }

    /// Insert into the partition owning `key`; returns that partition.
    pub fn put(&self, key: impl Into<StoredValue>, value: impl Into<StoredValue>) -> ScanResult<usize> {
        let record = RawRecord::new(key, value);
        let partition = self.partition_for(&record.key)?;
        self.insert_record(partition, record, false)?;
        Ok(partition)
    }

    /// Insert a record that expires at `expires_at` (epoch millis).
    pub fn put_with_expiry(
        &self,
        key: impl Into<StoredValue>,
        value: impl Into<StoredValue>,
        expires_at: u64,
    ) -> ScanResult<usize> {
        let record = RawRecord::new(key, value).with_expiry(expires_at);
        let partition = self.partition_for(&record.key)?;
        self.insert_record(partition, record, false)?;
        Ok(partition)
    }

    /// Insert into an explicit partition, bypassing routing.
    pub fn put_in_partition(
        &self,
        partition: usize,
        key: impl Into<StoredValue>,
        value: impl Into<StoredValue>,
    ) -> ScanResult<()> {
        self.insert_record(partition, RawRecord::new(key, value), false)
    }

    /// Insert a backup replica record into `partition`.
    pub fn put_backup(
        &self,
        partition: usize,
        key: impl Into<StoredValue>,
        value: impl Into<StoredValue>,
    ) -> ScanResult<()> {
        self.insert_record(partition, RawRecord::new(key, value), true)
    }

    fn insert_record(&self, partition: usize, record: RawRecord, backup: bool) -> ScanResult<()> {
        let target = self.partition(partition)?;
        let id = key_identity(partition, self.codec.as_ref(), &record.key)?;
        let mut state = target.state.write();
        if backup {
            state.backup.insert(id, record);
        } else {
            state.primary.insert(id, record);
        }
        Ok(())
    }

    /// Remove `key` from its owning partition. Returns `true` if it existed.
    pub fn remove(&self, key: &StoredValue) -> ScanResult<bool> {
        let partition = self.partition_for(key)?;
        self.remove_from(partition, key)
    }

    /// Remove `key` from an explicit partition.
    pub fn remove_from(&self, partition: usize, key: &StoredValue) -> ScanResult<bool> {
        let target = self.partition(partition)?;
        let id = key_identity(partition, self.codec.as_ref(), key)?;
        Ok(target.state.write().primary.remove(&id).is_some())
    }

    /// Drop every resident record in every partition.
    pub fn clear(&self) {
        for p in &self.partitions {
            let mut state = p.state.write();
            state.primary.clear();
            state.backup.clear();
        }
    }

    /// Resident primary record count of one partition.
    pub fn resident_len(&self, partition: usize) -> ScanResult<usize> {
        Ok(self.partition(partition)?.resident_len())
    }
}

impl RecordSourceProvider for MemoryStore {
    fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn source(&self, partition: usize) -> ScanResult<Arc<dyn RecordSource>> {
        let p = self.partition(partition)?;
        Ok(Arc::clone(p) as Arc<dyn RecordSource>)
    }
}

/// Map identity of a key inside a partition: the bincode encoding of its
/// logical value.
fn key_identity(partition: usize, codec: &dyn ValueCodec, key: &StoredValue) -> ScanResult<Vec<u8>> {
    let logical = codec.decode(key)?;
    bincode::serialize(&logical)
        .map_err(|e| ScanError::store(partition, format!("key encoding: {e}")))
}
