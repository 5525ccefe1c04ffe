//! MemTable Module
//!
//! In-memory row store behind the bundled backends.
//!
//! ## Responsibilities
//! - Hold the rows of one table, each a sorted map of column id → blob
//! - Apply removal-then-upsert writes under a single write lock
//! - Stamp every mutated row for collision detection
//! - Ordered key paging for `KeyIterator`
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered row keys give stable offset pagination
//! - Ordered column ids make range reads and deletes a map range
//! - Simple and correct first, optimize later

mod table;

use std::collections::BTreeMap;

pub use table::MemTable;

use crate::model::{Blob, ColumnId};

/// A row as held in a MemTable
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    /// Live columns, ascending by id
    pub columns: BTreeMap<ColumnId, Blob>,

    /// Stamp of the last mutation
    pub timestamp: i64,
}
