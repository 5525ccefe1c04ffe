//! Paginated row-key iteration
//!
//! ## Protocol
//! ```text
//!   ┌────────────── page (limit keys) ──────────────┐
//!   │ k0 k1 ... k(limit-1)                          │ ──▶ full page: fetch more
//!   └───────────────────────────────────────────────┘     at offset += limit
//!   ┌──────── page (< limit keys) ────────┐
//!   │ k0 k1 ... kn                        │ ──▶ short page: last one
//!   └─────────────────────────────────────┘
//! ```
//!
//! Rows removed through the iterator were all yielded already, so they sat
//! before the next offset; the offset is pulled back by the number removed
//! to keep offset-paginated engines from skipping keys.

use std::collections::VecDeque;

use crate::error::{ColKvError, Result};
use crate::model::RowKey;

use super::Table;

/// Lazy enumeration of every row key of a [`Table`]
///
/// Holds the table mutably for its lifetime, so the only way to change the
/// table meanwhile is [`KeyIterator::remove`].
pub struct KeyIterator<'a> {
    table: &'a mut Table,
    page: VecDeque<RowKey>,
    page_size: usize,
    /// Keys received from the engine so far
    fetched: u64,
    /// Rows deleted through `remove`
    removed: u64,
    /// The last page was short, or the iterator was closed
    exhausted: bool,
    /// Last yielded key while it may still be removed
    current: Option<RowKey>,
}

impl<'a> KeyIterator<'a> {
    pub(crate) fn new(table: &'a mut Table, page_size: usize) -> Self {
        Self {
            table,
            page: VecDeque::new(),
            page_size: page_size.max(1),
            fetched: 0,
            removed: 0,
            exhausted: false,
            current: None,
        }
    }

    /// Whether another key is available, fetching the next page if the
    /// current one is used up
    pub fn has_next(&mut self) -> Result<bool> {
        if self.page.is_empty() && !self.exhausted {
            self.fill_page()?;
        }
        Ok(!self.page.is_empty())
    }

    /// The next key, or [`ColKvError::NoMoreElements`]
    pub fn next_key(&mut self) -> Result<RowKey> {
        if !self.has_next()? {
            self.current = None;
            return Err(ColKvError::NoMoreElements);
        }
        let key = self.page.pop_front().ok_or(ColKvError::NoMoreElements)?;
        self.current = Some(key);
        Ok(key)
    }

    /// Delete the row of the key last returned by `next_key`
    pub fn remove(&mut self) -> Result<()> {
        let key = self.current.take().ok_or_else(|| {
            ColKvError::InvalidIteratorState(
                "remove() requires a preceding next() and may be called once per element"
                    .to_string(),
            )
        })?;
        self.table.remove(key)?;
        self.removed += 1;
        Ok(())
    }

    /// Stop iterating and release engine-side resources
    pub fn close(&mut self) {
        if !self.exhausted {
            self.table.release_keys();
        }
        self.page.clear();
        self.exhausted = true;
        self.current = None;
    }

    fn fill_page(&mut self) -> Result<()> {
        let offset = self.fetched - self.removed;
        let keys = self.table.fetch_keys(offset, self.page_size)?;
        tracing::trace!(
            table = %self.table.name(),
            offset,
            returned = keys.len(),
            "fetched key page"
        );

        if keys.len() < self.page_size {
            self.exhausted = true;
            self.table.release_keys();
        }
        self.fetched += keys.len() as u64;
        self.page.extend(keys);
        Ok(())
    }
}

impl Iterator for KeyIterator<'_> {
    type Item = Result<RowKey>;

    fn next(&mut self) -> Option<Result<RowKey>> {
        match self.has_next() {
            Ok(true) => Some(self.next_key()),
            Ok(false) => None,
            Err(e) => {
                // Stop after surfacing the failure once
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for KeyIterator<'_> {
    fn drop(&mut self) {
        if !self.exhausted {
            self.table.release_keys();
        }
    }
}
