//! Configuration for colkv
//!
//! Centralized configuration with sensible defaults, shared by every
//! bundled backend.

use std::path::PathBuf;

use crate::error::{ColKvError, Result};

/// Main configuration for a colkv backend instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for on-disk backends
    /// Internal structure (log backend):
    ///   {data_dir}/{instance}/
    ///     └── {database}/
    ///           ├── {table}.meta   (creation-time table settings)
    ///           └── {table}.log    (write-ahead table log)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Iteration Configuration
    // -------------------------------------------------------------------------
    /// Number of row keys fetched per page by a `KeyIterator`
    pub key_page_size: usize,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync a table log
    pub wal_sync_strategy: WalSyncStrategy,

    /// Log entries appended to a table before its log is rewritten
    /// from the live rows
    pub compaction_threshold: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./colkv_data"),
            key_page_size: 500,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            compaction_threshold: 16 * 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings no backend can work with
    pub fn validate(&self) -> Result<()> {
        if self.key_page_size == 0 {
            return Err(ColKvError::Config(
                "key_page_size must be greater than zero".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(ColKvError::Config(
                "EveryNEntries sync count must be greater than zero".to_string(),
            ));
        }
        if self.compaction_threshold == 0 {
            return Err(ColKvError::Config(
                "compaction_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all on-disk storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the key iterator page size
    pub fn key_page_size(mut self, size: usize) -> Self {
        self.config.key_page_size = size;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set how many log entries trigger a table log rewrite
    pub fn compaction_threshold(mut self, entries: usize) -> Self {
        self.config.compaction_threshold = entries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
