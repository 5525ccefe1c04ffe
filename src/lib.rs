//! # ColKV
//!
//! A backend-agnostic column store:
//! - Rows keyed by `i64`, each holding sparse binary columns keyed by `i64`
//! - One API over interchangeable storage engines
//! - Lazy, exactly-once open and idempotent close at every level
//! - Optional compare-and-abort collision detection on writes
//! - Compact base-36 names and a big-endian binary codec
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BackendRegistry                           │
//! │               ("memory" │ "log" │ custom)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ create(kind, instance, config)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │   Backend ──▶ Database ──▶ Table ──▶ KeyIterator             │
//! │   (facades: naming, caching, lifecycle, collision checks)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ BackendEngine / DatabaseEngine / TableEngine
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Memory    │          │     Log     │
//!   │ (MemTable)  │          │ (WAL + Mem) │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod encoding;
pub mod model;

mod lifecycle;
pub mod table;
pub mod database;
pub mod backend;
pub mod registry;

pub mod memtable;
pub mod wal;
pub mod memory;
pub mod logstore;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ColKvError, Result};
pub use config::{Config, WalSyncStrategy};
pub use encoding::{Base36, LimitedBase36};
pub use model::{AccessPattern, Blob, ColumnId, Columns, Range, RowKey, TableProfile};
pub use table::{KeyIterator, Table};
pub use database::Database;
pub use backend::Backend;
pub use registry::BackendRegistry;
pub use memory::MemoryBackend;
pub use logstore::LogBackend;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ColKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
