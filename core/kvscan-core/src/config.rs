//! Scan configuration.
//!
//! Loaded from JSON (`serde_json`) or built in code; a couple of knobs can be
//! overridden from the environment.

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Environment variable overriding [`ScanConfig::materialization`].
pub const MATERIALIZATION_ENV: &str = "KVSCAN_MATERIALIZATION";

/// How much of the result a scan buffers before serving the first row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationPolicy {
    /// Buffer every assigned partition on the first `advance`.
    ///
    /// The filtered result of the whole assignment must fit in memory.
    #[default]
    Eager,
    /// Buffer one partition at a time; the next partition is read once the
    /// previous one's rows are consumed.
    PerPartition,
}

impl MaterializationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterializationPolicy::Eager => "eager",
            MaterializationPolicy::PerPartition => "per_partition",
        }
    }

    pub fn parse_policy(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "eager" => Some(MaterializationPolicy::Eager),
            "per_partition" | "per-partition" => Some(MaterializationPolicy::PerPartition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub materialization: MaterializationPolicy,
    /// Also read backup replica records held by the partition.
    pub include_backup_only: bool,
    /// Fixed expiry reference (epoch millis); `None` uses the wall clock at
    /// materialization time.
    pub as_of_millis: Option<u64>,
    /// Initial row buffer capacity.
    pub initial_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            materialization: MaterializationPolicy::Eager,
            include_backup_only: false,
            as_of_millis: None,
            initial_capacity: 64,
        }
    }
}

impl ScanConfig {
    pub fn from_json(json: &str) -> ScanResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScanError::InvalidArguments(format!("scan config: {e}")))
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ScanResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `KVSCAN_MATERIALIZATION` if set and valid.
    pub fn apply_env(&mut self) {
        if let Ok(value) = env::var(MATERIALIZATION_ENV) {
            match MaterializationPolicy::parse_policy(&value) {
                Some(policy) => self.materialization = policy,
                None => {
                    tracing::warn!(target: "scan", value = %value, "ignoring unknown materialization policy")
                }
            }
        }
    }

    pub fn with_materialization(mut self, policy: MaterializationPolicy) -> Self {
        self.materialization = policy;
        self
    }

    pub fn with_as_of(mut self, as_of_millis: u64) -> Self {
        self.as_of_millis = Some(as_of_millis);
        self
    }

    pub fn with_backups(mut self, include: bool) -> Self {
        self.include_backup_only = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.materialization, MaterializationPolicy::Eager);
        assert!(!config.include_backup_only);
        assert_eq!(config.as_of_millis, None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ScanConfig::from_json(r#"{"materialization":"per_partition"}"#).unwrap();
        assert_eq!(config.materialization, MaterializationPolicy::PerPartition);
        assert_eq!(config.initial_capacity, 64);
    }

    #[test]
    fn bad_json_is_invalid_arguments() {
        assert!(matches!(
            ScanConfig::from_json(r#"{"materialization":"lazy"}"#),
            Err(ScanError::InvalidArguments(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"include_backup_only":true,"as_of_millis":42}}"#).unwrap();
        let config = ScanConfig::load(file.path()).unwrap();
        assert!(config.include_backup_only);
        assert_eq!(config.as_of_millis, Some(42));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            MaterializationPolicy::parse_policy("Per-Partition"),
            Some(MaterializationPolicy::PerPartition)
        );
        assert_eq!(MaterializationPolicy::parse_policy("stream"), None);
        assert_eq!(MaterializationPolicy::Eager.as_str(), "eager");
    }

    #[test]
    fn env_override_applies_known_policy_only() {
        // 환경 변수 설정 (unsafe)
        unsafe {
            env::set_var(MATERIALIZATION_ENV, "per_partition");
        }
        assert_eq!(
            ScanConfig::from_env().materialization,
            MaterializationPolicy::PerPartition
        );

        // 알 수 없는 값은 경고 후 무시
        unsafe {
            env::set_var(MATERIALIZATION_ENV, "streaming");
        }
        assert_eq!(ScanConfig::from_env().materialization, MaterializationPolicy::Eager);
        let mut config = ScanConfig::default().with_materialization(MaterializationPolicy::PerPartition);
        config.apply_env();
        assert_eq!(config.materialization, MaterializationPolicy::PerPartition);

        // 정리 (unsafe)
        unsafe {
            env::remove_var(MATERIALIZATION_ENV);
        }
        let mut config = ScanConfig::default();
        config.apply_env();
        assert_eq!(config, ScanConfig::default());
    }
}
