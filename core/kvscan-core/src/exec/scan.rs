//! Table scan operator: materializes a feed's qualifying rows and serves
//! them one per `advance`.

use crate::builder::RowBuilder;
use crate::codec::{BincodeCodec, ValueCodec};
use crate::config::{MaterializationPolicy, ScanConfig};
use crate::error::{ScanError, ScanResult};
use crate::exec::feed::{PartitionFeed, ReadOptions, RecordFeed, ReplicatedFeed};
use crate::exec::{Exec, IterationResult};
use crate::extract::{AttributeExtractors, FieldExtractor};
use crate::partition::PartitionSet;
use crate::row::{Row, RowBatch};
use crate::store::{RecordSource, RecordSourceProvider};
use crate::table::ScanPlan;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Counters accumulated over the operator's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Number of `Uninitialized → Iterating` transitions.
    pub materializations: usize,
    pub partitions_scanned: usize,
    pub records_read: usize,
    pub rows_produced: usize,
    /// Records excluded by the filter.
    pub rows_filtered: usize,
}

/// Observable state of a [`ScanExec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStateKind {
    Uninitialized,
    Iterating,
    Exhausted,
    Failed,
}

struct Cursor {
    rows: std::vec::IntoIter<Row>,
    /// Segments not yet materialized (per-partition policy only)
    pending: VecDeque<usize>,
    options: ReadOptions,
}

enum ScanState {
    Uninitialized,
    Iterating(Cursor),
    Exhausted,
    Failed,
}

/// 테이블 스캔 연산자: 파티션 레코드를 행으로 변환하여 순차적으로 반환
///
/// The first `advance` after construction or `reset` reads the feed and
/// buffers every row that passes the filter (or, under
/// [`MaterializationPolicy::PerPartition`], the first partition's rows).
/// Later calls hand out buffered rows one at a time.
///
/// Any error leaves the operator `Failed`; it must be reset before reuse.
pub struct ScanExec<F: RecordFeed> {
    feed: F,
    plan: ScanPlan,
    extractor: Arc<FieldExtractor>,
    codec: Arc<dyn ValueCodec>,
    config: ScanConfig,
    /// Built on first materialization and kept across resets
    builder: Option<RowBuilder>,
    state: ScanState,
    current: RowBatch,
    stats: ScanStats,
}

impl ScanExec<PartitionFeed> {
    /// Scan `parts` of a partitioned store with the default codec and config.
    pub fn partitioned(
        provider: Arc<dyn RecordSourceProvider>,
        parts: PartitionSet,
        plan: ScanPlan,
        extractors: &AttributeExtractors,
    ) -> Self {
        Self::new(
            PartitionFeed::new(provider, parts),
            plan,
            extractors,
            Arc::new(BincodeCodec),
            ScanConfig::default(),
        )
    }
}

impl ScanExec<ReplicatedFeed> {
    /// Scan a single replicated source with the default codec and config.
    pub fn replicated(
        source: Arc<dyn RecordSource>,
        plan: ScanPlan,
        extractors: &AttributeExtractors,
    ) -> Self {
        Self::new(
            ReplicatedFeed::new(source),
            plan,
            extractors,
            Arc::new(BincodeCodec),
            ScanConfig::default(),
        )
    }
}

impl<F: RecordFeed> ScanExec<F> {
    pub fn new(
        feed: F,
        plan: ScanPlan,
        extractors: &AttributeExtractors,
        codec: Arc<dyn ValueCodec>,
        config: ScanConfig,
    ) -> Self {
        let extractor = extractors.get(plan.table().id());
        Self {
            feed,
            plan,
            extractor,
            codec,
            config,
            builder: None,
            state: ScanState::Uninitialized,
            current: RowBatch::Empty,
            stats: ScanStats::default(),
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn ValueCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn plan(&self) -> &ScanPlan {
        &self.plan
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn state(&self) -> ScanStateKind {
        match self.state {
            ScanState::Uninitialized => ScanStateKind::Uninitialized,
            ScanState::Iterating(_) => ScanStateKind::Iterating,
            ScanState::Exhausted => ScanStateKind::Exhausted,
            ScanState::Failed => ScanStateKind::Failed,
        }
    }

    fn try_advance(&mut self) -> ScanResult<IterationResult> {
        // Stays Failed unless a step below completes.
        let mut state = std::mem::replace(&mut self.state, ScanState::Failed);
        loop {
            state = match state {
                ScanState::Uninitialized => self.begin()?,
                ScanState::Iterating(mut cursor) => {
                    if let Some(row) = cursor.rows.next() {
                        self.current = RowBatch::Row(row);
                        self.state = ScanState::Iterating(cursor);
                        return Ok(IterationResult::Fetched);
                    }
                    match cursor.pending.pop_front() {
                        Some(segment) => {
                            cursor.rows = self.materialize(&[segment], cursor.options)?.into_iter();
                            ScanState::Iterating(cursor)
                        }
                        None => ScanState::Exhausted,
                    }
                }
                ScanState::Exhausted => {
                    self.current = RowBatch::Empty;
                    self.state = ScanState::Exhausted;
                    return Ok(IterationResult::FetchedDone);
                }
                ScanState::Failed => {
                    return Err(ScanError::InvalidOperation {
                        message: "scan advanced after a failure".to_string(),
                        context: format!("table '{}' must be reset first", self.plan.table().id()),
                    });
                }
            };
        }
    }

    /// `Uninitialized → Materializing`: fix read options and read what the
    /// policy asks for up front.
    fn begin(&mut self) -> ScanResult<ScanState> {
        if self.builder.is_none() {
            self.builder = Some(RowBuilder::new(&self.plan, &self.extractor)?);
        }

        let options = ReadOptions {
            as_of: self.config.as_of_millis.unwrap_or_else(now_millis),
            include_backup_only: self.config.include_backup_only,
        };
        let segments = self.feed.segments();
        self.stats.materializations += 1;
        tracing::debug!(
            target: "scan",
            table = %self.plan.table().id(),
            segments = segments.len(),
            policy = self.config.materialization.as_str(),
            as_of = options.as_of,
            "scan materialization start"
        );

        let (now, pending) = match self.config.materialization {
            MaterializationPolicy::Eager => (segments, VecDeque::new()),
            MaterializationPolicy::PerPartition => (Vec::new(), VecDeque::from(segments)),
        };
        let rows = self.materialize(&now, options)?;
        Ok(ScanState::Iterating(Cursor {
            rows: rows.into_iter(),
            pending,
            options,
        }))
    }

    /// Read `segments` in order, decoding and building every record.
    fn materialize(&mut self, segments: &[usize], options: ReadOptions) -> ScanResult<Vec<Row>> {
        let Self {
            feed,
            plan,
            codec,
            config,
            builder,
            stats,
            ..
        } = self;
        let builder = builder.as_ref().ok_or_else(|| ScanError::InvalidOperation {
            message: "row builder not initialized".to_string(),
            context: "materialize".to_string(),
        })?;

        let mut rows = Vec::with_capacity(config.initial_capacity);
        for &segment in segments {
            let started = Instant::now();
            let before = rows.len();
            let mut read = 0usize;
            feed.read_segment(segment, options, &mut |record| {
                read += 1;
                let key = codec.decode(&record.key)?;
                let value = codec.decode(&record.value)?;
                if let Some(row) = builder.build(&key, &value)? {
                    rows.push(row);
                }
                Ok(())
            })?;

            let produced = rows.len() - before;
            stats.partitions_scanned += 1;
            stats.records_read += read;
            stats.rows_produced += produced;
            stats.rows_filtered += read - produced;
            tracing::debug!(
                target: "scan",
                table = %plan.table().id(),
                partition = segment,
                records = read,
                rows = produced,
                elapsed_us = started.elapsed().as_micros() as u64,
                "partition materialized"
            );
        }
        Ok(rows)
    }
}

impl<F: RecordFeed> Exec for ScanExec<F> {
    fn advance(&mut self) -> ScanResult<IterationResult> {
        self.try_advance().inspect_err(|e| {
            self.current = RowBatch::Empty;
            tracing::warn!(
                target: "scan",
                table = %self.plan.table().id(),
                stage = %e.stage(),
                error = %e,
                "scan failed"
            );
        })
    }

    fn current_batch(&self) -> &RowBatch {
        &self.current
    }

    fn reset(&mut self) {
        self.state = ScanState::Uninitialized;
        self.current = RowBatch::Empty;
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
