//! Inclusive column-id intervals

use serde::{Deserialize, Serialize};

use super::ColumnId;

/// Inclusive interval `[start, end]` over column ids
///
/// A range whose `end` is below its `start` is empty; reads and deletes
/// over an empty range do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    start: ColumnId,
    end: ColumnId,
}

impl Range {
    pub fn new(start: ColumnId, end: ColumnId) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one column
    pub fn single(id: ColumnId) -> Self {
        Self::new(id, id)
    }

    /// `[i64::MIN, i64::MAX]`
    pub fn full() -> Self {
        Self::new(ColumnId::MIN, ColumnId::MAX)
    }

    pub fn start(&self) -> ColumnId {
        self.start
    }

    pub fn end(&self) -> ColumnId {
        self.end
    }

    pub fn set_start(&mut self, start: ColumnId) -> &mut Self {
        self.start = start;
        self
    }

    pub fn set_end(&mut self, end: ColumnId) -> &mut Self {
        self.end = end;
        self
    }

    pub fn contains(&self, id: ColumnId) -> bool {
        self.start <= id && id <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::full()
    }
}

impl From<std::ops::RangeInclusive<ColumnId>> for Range {
    fn from(r: std::ops::RangeInclusive<ColumnId>) -> Self {
        Self::new(*r.start(), *r.end())
    }
}
