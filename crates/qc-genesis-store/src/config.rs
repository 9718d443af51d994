//! Export configuration
//!
//! Defaults suit a local devnet; `from_env` applies overrides from
//! `QC_GENESIS_SPILL_DIR` and `QC_GENESIS_SPILL_THRESHOLD`.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::CancelToken;

/// Section payload bytes kept in memory before spilling to disk (64 MiB).
pub const DEFAULT_SPILL_THRESHOLD: usize = 64 * 1024 * 1024;

/// Parent directory for spill files.
pub const ENV_SPILL_DIR: &str = "QC_GENESIS_SPILL_DIR";

/// Spill threshold in bytes.
pub const ENV_SPILL_THRESHOLD: &str = "QC_GENESIS_SPILL_THRESHOLD";

/// How the three sections are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// One writer, sections appended straight into the container.
    #[default]
    Sequential,
    /// Sections staged concurrently in isolated files, then appended in order.
    Parallel,
}

/// What happens to the per-run spill directory after the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpillDirPolicy {
    /// Remove the directory on every exit path.
    #[default]
    Remove,
    /// Leave the (empty) directory in place and report its path.
    Retain,
}

/// Configuration for [`export_genesis`](crate::export_genesis).
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Parent for the per-run spill directory. System temp dir when `None`.
    pub spill_dir: Option<PathBuf>,
    /// Bytes buffered in memory per section before spilling.
    pub spill_threshold: usize,
    pub spill_policy: SpillDirPolicy,
    pub mode: ExportMode,
    pub cancel: CancelToken,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            spill_dir: None,
            spill_threshold: DEFAULT_SPILL_THRESHOLD,
            spill_policy: SpillDirPolicy::Remove,
            mode: ExportMode::Sequential,
            cancel: CancelToken::new(),
        }
    }
}

impl ExportConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from `lookup`; malformed values are logged and ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_SPILL_DIR) {
            if dir.is_empty() {
                warn!("[qc-genesis-store] {} is empty, ignoring", ENV_SPILL_DIR);
            } else {
                info!("[qc-genesis-store] Spill directory from environment: {}", dir);
                self.spill_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(raw) = lookup(ENV_SPILL_THRESHOLD) {
            match raw.trim().parse::<usize>() {
                Ok(threshold) => self.spill_threshold = threshold,
                Err(_) => warn!(
                    "[qc-genesis-store] {} must be a byte count, got {:?}",
                    ENV_SPILL_THRESHOLD, raw
                ),
            }
        }
    }

    pub fn with_spill_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spill_dir = Some(dir.into());
        self
    }

    pub fn with_spill_threshold(mut self, threshold: usize) -> Self {
        self.spill_threshold = threshold;
        self
    }

    pub fn with_spill_policy(mut self, policy: SpillDirPolicy) -> Self {
        self.spill_policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.spill_threshold, DEFAULT_SPILL_THRESHOLD);
        assert_eq!(config.mode, ExportMode::Sequential);
        assert_eq!(config.spill_policy, SpillDirPolicy::Remove);
        assert!(config.spill_dir.is_none());
        assert!(!config.cancel.is_cancelled());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SPILL_DIR, "/var/tmp/genesis"),
            (ENV_SPILL_THRESHOLD, "4096"),
        ]
        .into_iter()
        .collect();

        let mut config = ExportConfig::default();
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.spill_dir, Some(PathBuf::from("/var/tmp/genesis")));
        assert_eq!(config.spill_threshold, 4096);
    }

    #[test]
    fn test_malformed_threshold_ignored() {
        let mut config = ExportConfig::default();
        config.apply_env_with(|key| (key == ENV_SPILL_THRESHOLD).then(|| "lots".to_string()));
        assert_eq!(config.spill_threshold, DEFAULT_SPILL_THRESHOLD);
    }
}
