//! Write-Ahead Log (WAL) Module
//!
//! Provides durability for the log backend's tables through append-only
//! logging.
//!
//! ## Responsibilities
//! - Append one entry per row mutation before it is applied in memory
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Entry 1                                       │
//! │ ┌─────────┬─────────┬──────────┬────────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (2|4) │ Data       │ │
//! │ └─────────┴─────────┴──────────┴────────────┘ │
//! ├───────────────────────────────────────────────┤
//! │ Entry 2                                       │
//! │ ┌─────────┬─────────┬──────────┬────────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (2|4) │ Data       │ │
//! │ └─────────┴─────────┴──────────┴────────────┘ │
//! └───────────────────────────────────────────────┘
//! ```
//! Numbers go through `encoding::binary` (big-endian, variable-length
//! size). Data is the bincode encoding of the row stamp and operation.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
