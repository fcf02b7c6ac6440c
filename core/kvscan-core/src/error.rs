//! Error types for the kvscan operator.
//!
//! All public APIs return `ScanResult<T>`; no panics in library code.

use std::fmt;
use thiserror::Error;

/// Unified error type for all scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Partition record source could not be obtained or iterated
    #[error("store access error on partition {partition}: {message}")]
    StoreAccess { partition: usize, message: String },

    /// Stored payload could not be decoded into a logical value
    #[error("decode error: {0}")]
    Decode(String),

    /// Field path could not be resolved or a required field was absent
    #[error("extraction error for path '{path}': {message}")]
    Extraction { path: String, message: String },

    /// Filter expression failed against an intermediate row
    #[error("filter evaluation error: {0}")]
    FilterEvaluation(String),

    /// Type mismatch between expected and actual values
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Invalid arguments
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// Apache Arrow error (RecordBatch export)
    #[error("arrow error: {source}")]
    Arrow {
        #[from]
        source: arrow::error::ArrowError,
    },

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for all scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Stage of the scan pipeline an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    StoreAccess,
    Decode,
    Extraction,
    Filter,
    Other,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanStage::StoreAccess => "store access",
            ScanStage::Decode => "decode",
            ScanStage::Extraction => "extraction",
            ScanStage::Filter => "filter",
            ScanStage::Other => "other",
        };
        f.write_str(name)
    }
}

impl ScanError {
    /// Pipeline stage that produced this error.
    pub fn stage(&self) -> ScanStage {
        match self {
            ScanError::StoreAccess { .. } => ScanStage::StoreAccess,
            ScanError::Decode(_) => ScanStage::Decode,
            ScanError::Extraction { .. } => ScanStage::Extraction,
            ScanError::FilterEvaluation(_) | ScanError::TypeMismatch { .. } => ScanStage::Filter,
            _ => ScanStage::Other,
        }
    }

    pub(crate) fn store(partition: usize, message: impl Into<String>) -> Self {
        ScanError::StoreAccess {
            partition,
            message: message.into(),
        }
    }

    pub(crate) fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        ScanError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }
}

// From 구현들
impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Decode(err.to_string())
    }
}

impl From<bincode::Error> for ScanError {
    fn from(err: bincode::Error) -> Self {
        ScanError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_store_access() {
        let err = ScanError::store(3, "partition migrated");
        assert_eq!(
            err.to_string(),
            "store access error on partition 3: partition migrated"
        );
        assert_eq!(err.stage(), ScanStage::StoreAccess);
    }

    #[test]
    fn error_display_extraction() {
        let err = ScanError::extraction("address..city", "empty segment");
        assert!(err.to_string().contains("address..city"));
        assert_eq!(err.stage(), ScanStage::Extraction);
    }

    #[test]
    fn error_display_type_mismatch() {
        let err = ScanError::TypeMismatch {
            expected: "Int64".to_string(),
            actual: "Utf8".to_string(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected Int64, got Utf8");
        assert_eq!(err.stage(), ScanStage::Filter);
    }

    #[test]
    fn bincode_error_is_decode_stage() {
        let err: ScanError = bincode::deserialize::<String>(&[0xff])
            .unwrap_err()
            .into();
        assert_eq!(err.stage(), ScanStage::Decode);
    }

    #[test]
    fn stage_display() {
        assert_eq!(ScanStage::Filter.to_string(), "filter");
        assert_eq!(ScanStage::StoreAccess.to_string(), "store access");
    }

    #[test]
    fn scan_result_err() {
        let result: ScanResult<i32> = Err(ScanError::InvalidArguments("bad".into()));
        assert!(result.is_err());
    }
}
