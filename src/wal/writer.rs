//! WAL Writer
//!
//! Handles appending entries to a table log file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::Result;

use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to a table log file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN of the last appended entry (0 before the first)
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a log file, continuing after its last valid LSN
    ///
    /// The file is scanned but not repaired; run [`WalRecovery::recover`]
    /// first if it may end in a torn write.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };
        Self::open_at(path, sync_strategy, last_lsn)
    }

    /// Open or create a log file whose last valid LSN is already known
    pub fn open_at(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_file(path, file, sync_strategy, last_lsn))
    }

    /// Create an empty log file, replacing any existing one
    pub fn create(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(path, file, sync_strategy, 0))
    }

    /// Append an entry, returning its LSN
    pub fn append(&mut self, stamp: i64, operation: Operation) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let frame = WalEntry::new(lsn, stamp, operation).serialize()?;

        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        self.current_lsn = lsn;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn from_file(path: &Path, file: File, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: last_lsn,
            sync_strategy,
            unsynced: 0,
        }
    }
}
