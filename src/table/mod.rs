//! Table Module
//!
//! One logical table: rows of sparse columns over a pluggable engine.
//!
//! ## Responsibilities
//! - Lazy, exactly-once open and idempotent close
//! - Normalize requests (empty id lists and ranges never reach the engine)
//! - Fix the column sort direction at construction
//! - Compare-and-abort writes when collision detection is on
//!
//! ## Collision Detection
//! Engines stamp a row on every mutation. With detection on, every
//! `Columns` read from the table carries the row's stamp; handing that
//! `Columns` back to `set*` fails with [`ColKvError::Collision`] if the row
//! changed (or vanished) in between, and nothing is written. An upsert
//! without a stamp is written unconditionally.

mod engine;
mod keys;

use std::fmt;

pub use engine::{Selection, TableEngine};
pub use keys::KeyIterator;

use crate::encoding::Base36;
use crate::error::{ColKvError, Result};
use crate::lifecycle::Lifecycle;
use crate::model::{ColumnId, Columns, Range, RowKey};

/// Default number of keys a [`KeyIterator`] fetches per page
pub const DEFAULT_KEY_PAGE_SIZE: usize = 500;

/// A table of rows keyed by `i64`, each holding sparse binary columns
///
/// Not thread-safe: every operation takes `&mut self`.
pub struct Table {
    name: Base36,
    lifecycle: Lifecycle,
    /// Column ids list and iterate in descending order
    reverse: bool,
    detect_collisions: bool,
    key_page_size: usize,
    engine: Box<dyn TableEngine>,
}

impl Table {
    /// Wrap an engine. Requested features the engine cannot provide are
    /// turned off; `reverse()` and `detect_collisions()` report the result.
    pub fn new(
        name: Base36,
        engine: Box<dyn TableEngine>,
        reverse: bool,
        detect_collisions: bool,
    ) -> Self {
        let reverse = reverse && engine.reverse_supported();
        let detect_collisions = detect_collisions && engine.collisions_supported();
        Self {
            lifecycle: Lifecycle::new("table", name.as_str()),
            name,
            reverse,
            detect_collisions,
            key_page_size: DEFAULT_KEY_PAGE_SIZE,
            engine,
        }
    }

    pub fn with_key_page_size(mut self, page_size: usize) -> Self {
        self.key_page_size = page_size.max(1);
        self
    }

    pub fn name(&self) -> &Base36 {
        &self.name
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the table now instead of on first use
    pub fn open(&mut self) -> Result<()> {
        self.ready().map(|_| ())
    }

    /// Close the table; later calls do nothing
    pub fn close(&mut self) -> Result<()> {
        match self.lifecycle.begin_close() {
            Some(true) => self.engine.close(),
            _ => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    pub fn is_opened(&self) -> bool {
        self.lifecycle.is_opened()
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Whether column listing and iteration are sorted at all
    pub fn column_ordering(&self) -> bool {
        self.engine.column_ordering()
    }

    pub fn reverse_supported(&self) -> bool {
        self.engine.reverse_supported()
    }

    pub fn reverse(&self) -> bool {
        self.reverse
    }

    pub fn detect_collisions(&self) -> bool {
        self.detect_collisions
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn exists(&mut self, key: RowKey) -> Result<bool> {
        Ok(self.columns_count(key)? > 0)
    }

    /// The whole row, or `None` if it has no columns
    pub fn get(&mut self, key: RowKey) -> Result<Option<Columns>> {
        self.read(key, &Selection::All)
    }

    pub fn get_column(&mut self, key: RowKey, id: ColumnId) -> Result<Option<Columns>> {
        self.read(key, &Selection::Ids(vec![id]))
    }

    /// The existing columns among `ids`
    pub fn get_columns(&mut self, key: RowKey, ids: &[ColumnId]) -> Result<Option<Columns>> {
        self.read(key, &Selection::Ids(ids.to_vec()))
    }

    /// The existing columns inside `range`
    pub fn get_range(&mut self, key: RowKey, range: Range) -> Result<Option<Columns>> {
        self.read(key, &Selection::from(range))
    }

    /// The first `count` columns in this table's sort order
    pub fn get_limited(&mut self, key: RowKey, count: usize) -> Result<Option<Columns>> {
        let reverse = self.reverse;
        let engine = self.ready()?;
        if count == 0 {
            return Ok(None);
        }

        let mut out = Columns::new(reverse);
        engine.get_first(key, count, reverse, &mut out)?;
        self.stamp(key, out)
    }

    /// Column ids of a row in this table's sort order
    pub fn columns(&mut self, key: RowKey) -> Result<Option<Vec<ColumnId>>> {
        let ids = self.ready()?.column_ids(key)?;
        if ids.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.order(ids)))
    }

    pub fn columns_count(&mut self, key: RowKey) -> Result<u64> {
        self.ready()?.columns_count(key)
    }

    /// Iterate column ids in the same order as [`Table::columns`]
    pub fn columns_iter(&mut self, key: RowKey) -> Result<Option<std::vec::IntoIter<ColumnId>>> {
        Ok(self.columns(key)?.map(Vec::into_iter))
    }

    /// Lazily page through every row key
    pub fn keys(&mut self) -> Result<KeyIterator<'_>> {
        self.ready()?;
        let page_size = self.key_page_size;
        Ok(KeyIterator::new(self, page_size))
    }

    /// Approximate number of rows; engines may over- or under-count
    pub fn size(&mut self) -> Result<u64> {
        self.ready()?.size()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Delete the whole row
    pub fn remove(&mut self, key: RowKey) -> Result<()> {
        self.delete(key, &Selection::All)
    }

    pub fn remove_columns(&mut self, key: RowKey, ids: &[ColumnId]) -> Result<()> {
        self.delete(key, &Selection::Ids(ids.to_vec()))
    }

    pub fn remove_range(&mut self, key: RowKey, range: Range) -> Result<()> {
        self.delete(key, &Selection::from(range))
    }

    /// Insert or overwrite every column of `upsert`
    pub fn set(&mut self, key: RowKey, upsert: &Columns) -> Result<()> {
        self.write(key, upsert, &Selection::none())
    }

    /// Delete `remove`, then apply `upsert`, as one call into the engine
    pub fn set_removing(
        &mut self,
        key: RowKey,
        upsert: &Columns,
        remove: &[ColumnId],
    ) -> Result<()> {
        self.write(key, upsert, &Selection::Ids(remove.to_vec()))
    }

    /// Delete the columns inside `remove`, then apply `upsert`, as one call
    /// into the engine
    pub fn set_removing_range(
        &mut self,
        key: RowKey,
        upsert: &Columns,
        remove: Range,
    ) -> Result<()> {
        self.write(key, upsert, &Selection::from(remove))
    }

    // =========================================================================
    // Crate-internal (used by KeyIterator)
    // =========================================================================

    pub(crate) fn fetch_keys(&mut self, offset: u64, limit: usize) -> Result<Vec<RowKey>> {
        self.ready()?.keys(offset, limit)
    }

    pub(crate) fn release_keys(&mut self) {
        if self.lifecycle.is_opened() && !self.lifecycle.is_closed() {
            self.engine.release_keys();
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Fail if closed, open on first use, then hand out the engine
    fn ready(&mut self) -> Result<&mut dyn TableEngine> {
        let engine = &mut self.engine;
        self.lifecycle.ensure_open(|| engine.open())?;
        Ok(self.engine.as_mut())
    }

    fn read(&mut self, key: RowKey, selection: &Selection) -> Result<Option<Columns>> {
        let reverse = self.reverse;
        let engine = self.ready()?;
        if selection.is_empty() {
            return Ok(None);
        }

        let mut out = Columns::new(reverse);
        engine.get(key, selection, &mut out)?;
        self.stamp(key, out)
    }

    /// `None` for an empty result, otherwise attach the row stamp when
    /// collision detection is on
    fn stamp(&mut self, key: RowKey, mut out: Columns) -> Result<Option<Columns>> {
        if out.is_empty() {
            return Ok(None);
        }
        if self.detect_collisions {
            out.set_timestamp(self.engine.row_timestamp(key)?);
        }
        Ok(Some(out))
    }

    fn delete(&mut self, key: RowKey, selection: &Selection) -> Result<()> {
        let engine = self.ready()?;
        if selection.is_empty() {
            return Ok(());
        }
        engine.remove(key, selection)
    }

    fn write(&mut self, key: RowKey, upsert: &Columns, remove: &Selection) -> Result<()> {
        let detect = self.detect_collisions;
        let engine = self.ready()?;
        if upsert.is_empty() && remove.is_empty() {
            return Ok(());
        }

        if detect {
            if let Some(expected) = upsert.timestamp() {
                let found = engine.row_timestamp(key)?;
                if found != Some(expected) {
                    return Err(ColKvError::Collision {
                        key,
                        expected,
                        found,
                    });
                }
            }
        }

        engine.set(key, upsert, remove)
    }

    fn order(&self, mut ids: Vec<ColumnId>) -> Vec<ColumnId> {
        if self.engine.column_ordering() {
            ids.sort_unstable();
            if self.reverse {
                ids.reverse();
            }
        }
        ids
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("reverse", &self.reverse)
            .field("detect_collisions", &self.detect_collisions)
            .field("opened", &self.lifecycle.is_opened())
            .field("closed", &self.lifecycle.is_closed())
            .finish()
    }
}
