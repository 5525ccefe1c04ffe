//! Sparse per-row column container

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{ColKvError, Result};

use super::{Blob, ColumnId};

/// Some or all columns of one row
///
/// Column ids are unique. The `reverse` flag is fixed at construction and
/// decides the order produced by [`Columns::columns`] and
/// [`Columns::cursor`] when sorting is requested.
///
/// Two `Columns` compare equal when they hold the same entries; the sort
/// flag and the collision timestamp are not part of equality.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    reverse: bool,
    map: HashMap<ColumnId, Blob>,
    /// Row stamp captured when a backend read the row
    timestamp: Option<i64>,
}

impl Columns {
    pub fn new(reverse: bool) -> Self {
        Self {
            reverse,
            map: HashMap::new(),
            timestamp: None,
        }
    }

    pub fn with_capacity(reverse: bool, capacity: usize) -> Self {
        Self {
            reverse,
            map: HashMap::with_capacity(capacity),
            timestamp: None,
        }
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, id: ColumnId) -> bool {
        self.map.contains_key(&id)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Store a copy of `value`, returning the previous blob if any
    pub fn put_bytes(&mut self, id: ColumnId, value: &[u8]) -> Option<Blob> {
        self.map.insert(id, Bytes::copy_from_slice(value))
    }

    /// Store an existing blob without copying it
    pub fn put_blob(&mut self, id: ColumnId, value: Blob) -> Option<Blob> {
        self.map.insert(id, value)
    }

    pub fn get_bytes(&self, id: ColumnId) -> Option<&Blob> {
        self.map.get(&id)
    }

    pub fn remove_bytes(&mut self, id: ColumnId) -> Option<Blob> {
        self.map.remove(&id)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Merge every entry of `other`, copying each value
    pub fn put_all(&mut self, other: &Columns) {
        self.map.reserve(other.len());
        for (id, value) in &other.map {
            self.map.insert(*id, Bytes::copy_from_slice(value));
        }
    }

    /// Merge a raw id → bytes mapping, copying each value
    pub fn extend_from<I, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (ColumnId, V)>,
        V: AsRef<[u8]>,
    {
        for (id, value) in entries {
            self.put_bytes(id, value.as_ref());
        }
    }

    /// Deep copy; no blob is shared with `self`
    pub fn copy(&self) -> Columns {
        let mut out = Columns::with_capacity(self.reverse, self.len());
        out.put_all(self);
        out.timestamp = self.timestamp;
        out
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Column ids; when `sorted`, ascending, or descending for a reverse
    /// container
    pub fn columns(&self, sorted: bool) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = self.map.keys().copied().collect();
        if sorted {
            ids.sort_unstable();
            if self.reverse {
                ids.reverse();
            }
        }
        ids
    }

    /// Entries in the same order as `columns(true)`
    pub fn entries(&self) -> Vec<(ColumnId, &Blob)> {
        self.columns(true)
            .into_iter()
            .filter_map(|id| self.map.get(&id).map(|v| (id, v)))
            .collect()
    }

    /// Unordered view over all entries
    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &Blob)> {
        self.map.iter().map(|(id, v)| (*id, v))
    }

    /// Walk the ids in `columns(sorted)` order with the option of removing
    /// the current one
    pub fn cursor(&mut self, sorted: bool) -> ColumnsCursor<'_> {
        let ids = self.columns(sorted).into_iter();
        ColumnsCursor {
            columns: self,
            ids,
            current: None,
        }
    }

    // =========================================================================
    // Collision Detection
    // =========================================================================

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Option<i64>) {
        self.timestamp = timestamp;
    }
}

impl PartialEq for Columns {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl Eq for Columns {}

/// Cursor over the column ids of a [`Columns`]
pub struct ColumnsCursor<'a> {
    columns: &'a mut Columns,
    ids: std::vec::IntoIter<ColumnId>,
    /// Last yielded id, cleared once it is removed
    current: Option<ColumnId>,
}

impl ColumnsCursor<'_> {
    /// Remove the column last returned by `next`
    pub fn remove(&mut self) -> Result<Blob> {
        let id = self.current.take().ok_or_else(|| {
            ColKvError::InvalidIteratorState(
                "remove() requires a preceding next() and may be called once per element"
                    .to_string(),
            )
        })?;
        self.columns.map.remove(&id).ok_or_else(|| {
            ColKvError::InvalidIteratorState(format!("column {} is no longer present", id))
        })
    }
}

impl Iterator for ColumnsCursor<'_> {
    type Item = ColumnId;

    fn next(&mut self) -> Option<ColumnId> {
        self.current = self.ids.next();
        self.current
    }
}
