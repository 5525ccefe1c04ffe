//! Table engine hooks
//!
//! The storage-specific half of a table. [`super::Table`] owns the
//! lifecycle, argument normalization and collision checks; an engine only
//! moves bytes.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ColumnId, Columns, Range, RowKey};

/// Which columns of a row an operation touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Every column
    All,
    /// Exactly these ids (duplicates allowed, missing ids ignored)
    Ids(Vec<ColumnId>),
    /// Every id inside the inclusive range
    Range(Range),
}

impl Selection {
    /// Selects nothing
    pub fn none() -> Self {
        Selection::Ids(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Selection::All => false,
            Selection::Ids(ids) => ids.is_empty(),
            Selection::Range(range) => range.is_empty(),
        }
    }

    pub fn matches(&self, id: ColumnId) -> bool {
        match self {
            Selection::All => true,
            Selection::Ids(ids) => ids.contains(&id),
            Selection::Range(range) => range.contains(id),
        }
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        if range.is_full() {
            Selection::All
        } else {
            Selection::Range(range)
        }
    }
}

/// Storage hooks every backend implements for its tables
///
/// Calls only arrive between a successful `open` and `close`. Empty
/// selections never reach the engine.
pub trait TableEngine: Send {
    /// Acquire resources; called once, lazily
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release resources; called once, only after a successful `open`
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn columns_count(&mut self, key: RowKey) -> Result<u64>;

    /// Column ids of a row in any order; empty when the row is absent
    fn column_ids(&mut self, key: RowKey) -> Result<Vec<ColumnId>>;

    /// Copy the selected existing columns of a row into `out`
    fn get(&mut self, key: RowKey, selection: &Selection, out: &mut Columns) -> Result<()>;

    /// Copy the first `count` columns of a row in ascending id order, or in
    /// descending order when `reverse`
    fn get_first(
        &mut self,
        key: RowKey,
        count: usize,
        reverse: bool,
        out: &mut Columns,
    ) -> Result<()>;

    fn remove(&mut self, key: RowKey, selection: &Selection) -> Result<()>;

    /// Atomically delete `remove`, then insert or overwrite every column of
    /// `upsert`
    fn set(&mut self, key: RowKey, upsert: &Columns, remove: &Selection) -> Result<()>;

    /// Approximate number of rows
    fn size(&mut self) -> Result<u64>;

    /// Up to `limit` row keys in a stable order, skipping the first `offset`
    fn keys(&mut self, offset: u64, limit: usize) -> Result<Vec<RowKey>>;

    /// Release any cursor held for key iteration
    fn release_keys(&mut self) {}

    /// Stamp of the last mutation of a row, `None` when the row is absent
    fn row_timestamp(&mut self, key: RowKey) -> Result<Option<i64>>;

    fn reverse_supported(&self) -> bool {
        true
    }

    fn collisions_supported(&self) -> bool {
        true
    }

    fn column_ordering(&self) -> bool {
        true
    }
}
