//! Log Table Engine
//!
//! One durable table: a write-ahead log on disk replayed into a MemTable.
//!
//! ## Responsibilities
//! - Replay the log on open, truncating a torn tail
//! - Log every mutation before applying it in memory
//! - Rewrite the log from the live rows once it grows past the threshold
//! - Sync the log on close

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::config::{Config, WalSyncStrategy};
use crate::error::{ColKvError, Result};
use crate::memtable::MemTable;
use crate::model::{ColumnId, Columns, RowKey};
use crate::table::{Selection, TableEngine};
use crate::wal::{Operation, WalEntry, WalRecovery, WalWriter};

/// Durable table engine
///
/// ## Write Path
/// 1. Pick the next row stamp
/// 2. Append the mutation to the log (durability guarantee)
/// 3. Apply it to the MemTable
/// 4. Compact the log if it has outgrown the live rows (best effort)
pub(crate) struct LogTableEngine {
    /// Table log file
    path: PathBuf,

    /// Sync strategy and compaction threshold
    config: Config,

    /// Live rows, rebuilt from the log on open
    rows: MemTable,

    /// Between open and close
    opened: bool,

    /// Present while opened, unless a reopen after compaction failed
    wal: Option<WalWriter>,

    /// Entries currently in the log file
    logged: usize,
}

impl LogTableEngine {
    pub(crate) fn new(path: PathBuf, config: Config) -> Self {
        Self {
            path,
            config,
            rows: MemTable::new(),
            opened: false,
            wal: None,
            logged: 0,
        }
    }

    /// Append a mutation and count it towards compaction
    fn log(&mut self, stamp: i64, operation: Operation) -> Result<()> {
        if !self.opened {
            return Err(ColKvError::Storage {
                message: format!("log {} is not open", self.path.display()),
                source: None,
            });
        }
        let wal = match self.wal.take() {
            Some(wal) => wal,
            // A compaction swapped the file but could not reopen it
            None => WalWriter::open(&self.path, self.config.wal_sync_strategy)?,
        };
        let wal = self.wal.insert(wal);
        wal.append(stamp, operation)?;
        self.logged += 1;
        Ok(())
    }

    /// Runs after a mutation is already logged and applied, so a failed
    /// compaction only leaves the longer log in place
    fn maybe_compact(&mut self) {
        if self.logged < self.config.compaction_threshold
            || self.logged <= 2 * self.rows.row_count()
        {
            return;
        }
        if let Err(error) = self.compact() {
            tracing::warn!(
                path = %self.path.display(),
                logged = self.logged,
                error = %error,
                "log compaction failed, keeping the current log"
            );
        }
    }

    /// Rewrite the log so it holds one entry per live row
    ///
    /// The new log is built beside the old one and renamed over it, so a
    /// crash mid-way leaves the old log intact. The current writer stays in
    /// place until the rename has succeeded.
    fn compact(&mut self) -> Result<()> {
        let tmp = self.path.with_extension("log.compact");
        let before = self.logged;

        let last_lsn = match self.write_compacted(&tmp) {
            Ok(last_lsn) => last_lsn,
            Err(error) => {
                let _ = fs::remove_file(&tmp);
                return Err(error);
            }
        };
        if let Err(error) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(error.into());
        }

        // The old writer now appends to the replaced file
        self.wal = None;
        self.logged = last_lsn as usize;
        self.wal = Some(WalWriter::open_at(
            &self.path,
            self.config.wal_sync_strategy,
            last_lsn,
        )?);

        tracing::info!(
            path = %self.path.display(),
            before,
            after = self.logged,
            "compacted table log"
        );
        Ok(())
    }

    /// Write every live row to `tmp` and flush the current log, returning
    /// the last LSN of the new file
    fn write_compacted(&mut self, tmp: &Path) -> Result<u64> {
        let mut writer =
            WalWriter::create(tmp, WalSyncStrategy::EveryNEntries { count: usize::MAX })?;
        for (key, row) in self.rows.snapshot() {
            let upsert = row
                .columns
                .into_iter()
                .map(|(id, value)| (id, value.to_vec()))
                .collect();
            writer.append(
                row.timestamp,
                Operation::Set {
                    key,
                    remove: Selection::none(),
                    upsert,
                },
            )?;
        }
        writer.sync()?;

        if let Some(current) = self.wal.as_mut() {
            current.sync()?;
        }
        Ok(writer.current_lsn())
    }

    fn replay(&self, entry: WalEntry) {
        let stamp = entry.stamp;
        self.rows.observe_timestamp(stamp);
        match entry.operation {
            Operation::Set {
                key,
                remove,
                upsert,
            } => {
                let upsert = upsert
                    .into_iter()
                    .map(|(id, value)| (id, Bytes::from(value)));
                self.rows.set(key, upsert, &remove, stamp);
            }
            Operation::Remove { key, selection } => {
                self.rows.remove(key, &selection, stamp);
            }
        }
    }
}

impl TableEngine for LogTableEngine {
    fn open(&mut self) -> Result<()> {
        let mut last_lsn = 0;
        if self.path.exists() {
            let (entries, result) = WalRecovery::recover(&self.path)?;
            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    path = %self.path.display(),
                    recovered = result.entries_recovered,
                    corrupted = result.entries_corrupted,
                    last_lsn = result.last_lsn,
                    "replayed table log"
                );
            }
            self.logged = entries.len();
            for entry in entries {
                self.replay(entry);
            }
            last_lsn = result.last_lsn;
        }

        self.wal = Some(WalWriter::open_at(
            &self.path,
            self.config.wal_sync_strategy,
            last_lsn,
        )?);
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.opened = false;
        if let Some(mut wal) = self.wal.take() {
            wal.sync()?;
        }
        self.rows.clear();
        Ok(())
    }

    fn columns_count(&mut self, key: RowKey) -> Result<u64> {
        Ok(self.rows.columns_count(key))
    }

    fn column_ids(&mut self, key: RowKey) -> Result<Vec<ColumnId>> {
        Ok(self.rows.column_ids(key))
    }

    fn get(&mut self, key: RowKey, selection: &Selection, out: &mut Columns) -> Result<()> {
        self.rows.read(key, selection, out);
        Ok(())
    }

    fn get_first(
        &mut self,
        key: RowKey,
        count: usize,
        reverse: bool,
        out: &mut Columns,
    ) -> Result<()> {
        self.rows.read_first(key, count, reverse, out);
        Ok(())
    }

    fn remove(&mut self, key: RowKey, selection: &Selection) -> Result<()> {
        if self.rows.columns_count(key) == 0 {
            return Ok(());
        }

        let stamp = self.rows.next_timestamp();
        self.log(
            stamp,
            Operation::Remove {
                key,
                selection: selection.clone(),
            },
        )?;
        self.rows.remove(key, selection, stamp);
        self.maybe_compact();
        Ok(())
    }

    fn set(&mut self, key: RowKey, upsert: &Columns, remove: &Selection) -> Result<()> {
        let stamp = self.rows.next_timestamp();
        let logged_upsert = upsert
            .iter()
            .map(|(id, value)| (id, value.to_vec()))
            .collect();
        self.log(
            stamp,
            Operation::Set {
                key,
                remove: remove.clone(),
                upsert: logged_upsert,
            },
        )?;
        self.rows.set_columns(key, upsert, remove, stamp);
        self.maybe_compact();
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.rows.row_count() as u64)
    }

    fn keys(&mut self, offset: u64, limit: usize) -> Result<Vec<RowKey>> {
        Ok(self.rows.keys(offset, limit))
    }

    fn row_timestamp(&mut self, key: RowKey) -> Result<Option<i64>> {
        Ok(self.rows.row_timestamp(key))
    }
}
