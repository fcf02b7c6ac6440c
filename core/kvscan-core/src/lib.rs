//! # kvscan: Partitioned Key/Value Table Scan
//!
//! kvscan은 분산 SQL 실행 엔진의 파티션 테이블 스캔 연산자입니다.
//! 할당된 파티션의 key/value 레코드를 읽어 논리 행으로 변환하고,
//! 필터와 프로젝션을 적용한 뒤 Pull 기반 반복 프로토콜로 제공합니다.
//!
//! ## 빠른 시작
//!
//! ```rust
//! use kvscan_core::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> kvscan_core::ScanResult<()> {
//! let store = Arc::new(MemoryStore::new(4));
//! store.put_in_partition(0, Value::from(1), Value::object([("age", Value::from(30))]))?;
//! store.put_in_partition(3, Value::from(2), Value::object([("age", Value::from(3))]))?;
//!
//! let table = TableDescriptor::new("people", ["__key", "age"]);
//! let plan = ScanPlan::new(table, vec![0], Some(Expr::col(1).gt(Expr::lit(5))))?;
//! let parts = PartitionSet::from_ids(4, [0, 3])?;
//!
//! let mut scan = ScanExec::partitioned(store, parts, plan, &AttributeExtractors::new());
//! assert_eq!(scan.advance()?, IterationResult::Fetched);
//! assert_eq!(scan.current_batch().as_row().unwrap()[0], Value::from(1));
//! assert_eq!(scan.advance()?, IterationResult::FetchedDone);
//! # Ok(())
//! # }
//! ```
//!
//! ## 실행 파이프라인
//!
//! ```text
//! PartitionSet → RecordSource → ValueCodec → FieldExtractor → RowBuilder
//!              → ScanExec (materialize once, then one row per advance)
//! ```
//!
//! ## 모듈 구조
//!
//! - [`exec`]: 스캔 연산자 ([`ScanExec`]) 와 반복 프로토콜
//! - [`store`]: 파티션 레코드 소스, 인메모리 스토어
//! - [`codec`]: 직렬화된 값 ↔ 논리 값
//! - [`extract`]: 속성 경로 해석 및 캐시
//! - [`builder`]: 행 구성 (추출, 필터, 프로젝션)
//! - [`export`]: Arrow `RecordBatch` 변환

pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod exec;
pub mod export;
pub mod expr;
pub mod extract;
pub mod partition;
pub mod row;
pub mod store;
pub mod table;
pub mod value;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use error::{ScanError, ScanResult, ScanStage};
pub use exec::{Exec, IterationResult, ScanExec};

/// Everything needed to set up and drive a scan.
pub mod prelude {
    pub use crate::codec::{BincodeCodec, JsonCodec, StoredValue, ValueCodec};
    pub use crate::config::{MaterializationPolicy, ScanConfig};
    pub use crate::error::{ScanError, ScanResult, ScanStage};
    pub use crate::exec::{Exec, IterationResult, ScanExec, drain};
    pub use crate::expr::{BinaryOperator, Expr};
    pub use crate::extract::{AttributeExtractors, PathNormalizer};
    pub use crate::partition::PartitionSet;
    pub use crate::row::{Row, RowBatch};
    pub use crate::store::{MemoryStore, RawRecord, RecordSource, RecordSourceProvider};
    pub use crate::table::{ScanPlan, TableDescriptor};
    pub use crate::value::Value;
}
