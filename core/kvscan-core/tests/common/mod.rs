//! Shared fixtures for scan integration tests.

#![allow(dead_code)]

use kvscan_core::prelude::*;
use kvscan_core::store::RecordIter;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps a store and counts `source` lookups and `iterate` calls per partition.
pub struct CountingStore {
    pub inner: Arc<MemoryStore>,
    lookups: Arc<Vec<AtomicUsize>>,
    iterations: Arc<Vec<AtomicUsize>>,
    /// Partition whose lookup fails, if any
    pub failing: Option<usize>,
}

impl CountingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        let n = inner.partition_count();
        Self {
            inner,
            lookups: Arc::new((0..n).map(|_| AtomicUsize::new(0)).collect()),
            iterations: Arc::new((0..n).map(|_| AtomicUsize::new(0)).collect()),
            failing: None,
        }
    }

    pub fn failing_on(mut self, partition: usize) -> Self {
        self.failing = Some(partition);
        self
    }

    pub fn lookups(&self, partition: usize) -> usize {
        self.lookups[partition].load(Ordering::SeqCst)
    }

    pub fn iterations(&self, partition: usize) -> usize {
        self.iterations[partition].load(Ordering::SeqCst)
    }
}

impl RecordSourceProvider for CountingStore {
    fn partition_count(&self) -> usize {
        self.inner.partition_count()
    }

    fn source(&self, partition: usize) -> ScanResult<Arc<dyn RecordSource>> {
        self.lookups[partition].fetch_add(1, Ordering::SeqCst);
        if self.failing == Some(partition) {
            return Err(ScanError::StoreAccess {
                partition,
                message: "partition migrated".to_string(),
            });
        }
        Ok(Arc::new(CountingSource {
            inner: self.inner.source(partition)?,
            iterations: Arc::clone(&self.iterations),
            partition,
        }))
    }
}

struct CountingSource {
    inner: Arc<dyn RecordSource>,
    iterations: Arc<Vec<AtomicUsize>>,
    partition: usize,
}

impl RecordSource for CountingSource {
    fn iterate(&self, as_of: u64, include_backup_only: bool) -> ScanResult<RecordIter<'_>> {
        self.iterations[self.partition].fetch_add(1, Ordering::SeqCst);
        self.inner.iterate(as_of, include_backup_only)
    }
}

/// `{ "id": id, "score": score }` with `score` omitted when `None`.
pub fn scored(id: i64, score: Option<i64>) -> Value {
    let mut fields = vec![("id", Value::from(id))];
    if let Some(s) = score {
        fields.push(("score", Value::from(s)));
    }
    Value::object(fields)
}

/// Store `(partition, key, value)` triples, values bincode-serialized.
pub fn populate(store: &MemoryStore, records: &[(usize, i64, Value)]) {
    for (partition, key, value) in records {
        let stored = BincodeCodec.encode(value).expect("encode");
        store
            .put_in_partition(*partition, Value::from(*key), stored)
            .expect("put");
    }
}

pub fn keys(rows: &[Row], column: usize) -> Vec<i64> {
    let mut keys: Vec<i64> = rows
        .iter()
        .map(|r| match &r[column] {
            Value::Int64(k) => *k,
            other => panic!("expected Int64 key, got {other:?}"),
        })
        .collect();
    keys.sort_unstable();
    keys
}
