//! Execution operators: pull-based iteration protocol.

mod feed;
mod scan;

pub use feed::{PartitionFeed, ReadOptions, RecordFeed, ReplicatedFeed};
pub use scan::{ScanExec, ScanStateKind, ScanStats};

use crate::error::ScanResult;
use crate::row::{Row, RowBatch};

/// Outcome of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationResult {
    /// A row is available through `current_batch`.
    Fetched,
    /// No more rows; `current_batch` is empty.
    FetchedDone,
}

/// 실행 연산자 트레이트: Pull 기반 실행 모델
///
/// `advance`, `current_batch` and `reset` form a strictly sequential protocol
/// driven by a single caller.
pub trait Exec: Send {
    /// 다음 행으로 이동
    fn advance(&mut self) -> ScanResult<IterationResult>;

    /// Row produced by the last successful `advance`, or an empty batch.
    fn current_batch(&self) -> &RowBatch;

    /// 연산자 상태 초기화 (재실행용)
    fn reset(&mut self);
}

/// Drive `exec` to exhaustion and collect every row.
pub fn drain(exec: &mut dyn Exec) -> ScanResult<Vec<Row>> {
    let mut rows = Vec::new();
    while exec.advance()? == IterationResult::Fetched {
        rows.extend(exec.current_batch().iter().cloned());
    }
    Ok(rows)
}
