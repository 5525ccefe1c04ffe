//! Data Model Module
//!
//! The sparse row/column model shared by every backend.
//!
//! ## Shape
//! ```text
//! Table
//!  └── row key (i64)
//!       └── Columns: column id (i64) → Blob (opaque bytes)
//! ```

mod columns;
mod profile;
mod range;

pub use columns::{Columns, ColumnsCursor};
pub use profile::{AccessPattern, TableProfile};
pub use range::Range;

/// Identifies a row within a table
pub type RowKey = i64;

/// Identifies a column within a row
pub type ColumnId = i64;

/// Immutable value of one column
pub type Blob = bytes::Bytes;
