//! MemTable implementation
//!
//! BTreeMap-based row store with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::model::{Blob, ColumnId, Columns, RowKey};
use crate::table::Selection;

use super::StoredRow;

/// In-memory rows of one table
///
/// ## Concurrency:
/// - `rows`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `clock`: Atomic counter (lock-free)
/// - All methods use `&self`
pub struct MemTable {
    rows: RwLock<BTreeMap<RowKey, StoredRow>>,

    /// Last row stamp handed out or observed
    clock: AtomicI64,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            clock: AtomicI64::new(0),
        }
    }

    // =========================================================================
    // Stamps
    // =========================================================================

    /// Hand out the next row stamp
    pub fn next_timestamp(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Make sure later stamps are greater than `timestamp` (used on replay)
    pub fn observe_timestamp(&self, timestamp: i64) {
        self.clock.fetch_max(timestamp, Ordering::SeqCst);
    }

    /// Stamp of the last mutation of a row
    pub fn row_timestamp(&self, key: RowKey) -> Option<i64> {
        self.rows.read().get(&key).map(|row| row.timestamp)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn columns_count(&self, key: RowKey) -> u64 {
        self.rows
            .read()
            .get(&key)
            .map_or(0, |row| row.columns.len() as u64)
    }

    /// Column ids of a row, ascending
    pub fn column_ids(&self, key: RowKey) -> Vec<ColumnId> {
        self.rows
            .read()
            .get(&key)
            .map(|row| row.columns.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Copy the selected columns of a row into `out`
    pub fn read(&self, key: RowKey, selection: &Selection, out: &mut Columns) {
        let rows = self.rows.read();
        let Some(row) = rows.get(&key) else {
            return;
        };

        match selection {
            Selection::All => {
                for (id, value) in &row.columns {
                    out.put_blob(*id, value.clone());
                }
            }
            Selection::Ids(ids) => {
                for id in ids {
                    if let Some(value) = row.columns.get(id) {
                        out.put_blob(*id, value.clone());
                    }
                }
            }
            Selection::Range(range) if !range.is_empty() => {
                for (id, value) in row.columns.range(range.start()..=range.end()) {
                    out.put_blob(*id, value.clone());
                }
            }
            Selection::Range(_) => {}
        }
    }

    /// Copy the first `count` columns of a row, ascending or descending
    pub fn read_first(&self, key: RowKey, count: usize, reverse: bool, out: &mut Columns) {
        let rows = self.rows.read();
        let Some(row) = rows.get(&key) else {
            return;
        };

        if reverse {
            for (id, value) in row.columns.iter().rev().take(count) {
                out.put_blob(*id, value.clone());
            }
        } else {
            for (id, value) in row.columns.iter().take(count) {
                out.put_blob(*id, value.clone());
            }
        }
    }

    /// Up to `limit` row keys in ascending order, skipping `offset`
    pub fn keys(&self, offset: u64, limit: usize) -> Vec<RowKey> {
        self.rows
            .read()
            .keys()
            .skip(offset as usize)
            .take(limit)
            .copied()
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Remove the selected columns of a row; the row disappears once empty
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, key: RowKey, selection: &Selection, timestamp: i64) -> bool {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&key) else {
            return false;
        };

        let removed = self.remove_from_row(row, selection);
        if removed {
            row.timestamp = timestamp;
            self.observe_timestamp(timestamp);
        }
        if row.columns.is_empty() {
            rows.remove(&key);
        }
        removed
    }

    /// Remove `remove`, then insert or overwrite `upsert`, under one lock
    pub fn set<I>(&self, key: RowKey, upsert: I, remove: &Selection, timestamp: i64)
    where
        I: IntoIterator<Item = (ColumnId, Blob)>,
    {
        let mut rows = self.rows.write();
        let row = rows.entry(key).or_insert_with(|| StoredRow {
            columns: BTreeMap::new(),
            timestamp,
        });

        let mut changed = self.remove_from_row(row, remove);
        for (id, value) in upsert {
            row.columns.insert(id, value);
            changed = true;
        }

        if changed {
            row.timestamp = timestamp;
            self.observe_timestamp(timestamp);
        }
        if row.columns.is_empty() {
            rows.remove(&key);
        }
    }

    /// Copying convenience over [`MemTable::set`]
    pub fn set_columns(&self, key: RowKey, upsert: &Columns, remove: &Selection, timestamp: i64) {
        let entries = upsert
            .iter()
            .map(|(id, value)| (id, Bytes::copy_from_slice(value)));
        self.set(key, entries, remove, timestamp);
    }

    /// Clear all rows
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Snapshot of every row in key order (cloned, so later writes do not
    /// show up in it)
    pub fn snapshot(&self) -> Vec<(RowKey, StoredRow)> {
        self.rows
            .read()
            .iter()
            .map(|(key, row)| (*key, row.clone()))
            .collect()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn remove_from_row(&self, row: &mut StoredRow, selection: &Selection) -> bool {
        let doomed: Vec<ColumnId> = match selection {
            Selection::All => row.columns.keys().copied().collect(),
            Selection::Ids(ids) => ids
                .iter()
                .copied()
                .filter(|id| row.columns.contains_key(id))
                .collect(),
            Selection::Range(range) if !range.is_empty() => row
                .columns
                .range(range.start()..=range.end())
                .map(|(id, _)| *id)
                .collect(),
            Selection::Range(_) => Vec::new(),
        };

        let mut removed = false;
        for id in doomed {
            removed |= row.columns.remove(&id).is_some();
        }
        removed
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
