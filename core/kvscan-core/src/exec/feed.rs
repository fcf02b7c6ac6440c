//! Record feeds: how a scan obtains its raw records.
//!
//! A feed is split into segments (one per partition for partitioned tables)
//! that are read independently. The scan operator decides when each segment
//! is read; the feed only knows how.

use crate::error::ScanResult;
use crate::partition::PartitionSet;
use crate::store::{RawRecord, RecordSource, RecordSourceProvider};
use std::sync::Arc;

/// Store iteration options fixed for one materialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub as_of: u64,
    pub include_backup_only: bool,
}

pub trait RecordFeed: Send {
    /// Segments to read, in reading order.
    fn segments(&self) -> Vec<usize>;

    /// Enumerate one segment, handing each record to `visit`. Stops at the
    /// first error from either the store or `visit`.
    fn read_segment(
        &self,
        segment: usize,
        options: ReadOptions,
        visit: &mut dyn FnMut(RawRecord) -> ScanResult<()>,
    ) -> ScanResult<()>;
}

/// Reads the partitions of an assignment from a partitioned store.
pub struct PartitionFeed {
    provider: Arc<dyn RecordSourceProvider>,
    parts: PartitionSet,
}

impl PartitionFeed {
    pub fn new(provider: Arc<dyn RecordSourceProvider>, parts: PartitionSet) -> Self {
        Self { provider, parts }
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.parts
    }
}

impl RecordFeed for PartitionFeed {
    fn segments(&self) -> Vec<usize> {
        // Partitions outside the assignment are never touched.
        (0..self.parts.partition_count())
            .filter(|&p| self.parts.contains(p))
            .collect()
    }

    fn read_segment(
        &self,
        segment: usize,
        options: ReadOptions,
        visit: &mut dyn FnMut(RawRecord) -> ScanResult<()>,
    ) -> ScanResult<()> {
        let source = self.provider.source(segment)?;
        read_source(source.as_ref(), options, visit)
    }
}

/// Reads a single non-partitioned source, e.g. a table replicated to every
/// node.
pub struct ReplicatedFeed {
    source: Arc<dyn RecordSource>,
}

impl ReplicatedFeed {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }
}

impl RecordFeed for ReplicatedFeed {
    fn segments(&self) -> Vec<usize> {
        vec![0]
    }

    fn read_segment(
        &self,
        _segment: usize,
        options: ReadOptions,
        visit: &mut dyn FnMut(RawRecord) -> ScanResult<()>,
    ) -> ScanResult<()> {
        read_source(self.source.as_ref(), options, visit)
    }
}

fn read_source(
    source: &dyn RecordSource,
    options: ReadOptions,
    visit: &mut dyn FnMut(RawRecord) -> ScanResult<()>,
) -> ScanResult<()> {
    for record in source.iterate(options.as_of, options.include_backup_only)? {
        visit(record?)?;
    }
    Ok(())
}
