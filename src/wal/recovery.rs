//! WAL Recovery
//!
//! Handles crash recovery by replaying a table log.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::reader::{Frame, WalReader};
use super::WalEntry;

/// Handles log recovery after a crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries skipped
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the log was (or, for `verify`, would be) truncated
    pub was_truncated: bool,

    /// Length of the valid prefix of the file
    pub valid_length: u64,
}

impl WalRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Stop at the first torn or corrupted frame (nothing after it can
    ///    be trusted)
    /// 3. Truncate the file to its valid prefix
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, result) = Self::scan(path, true)?;

        if result.was_truncated {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_length)?;
            file.sync_all()?;
            tracing::warn!(
                path = %path.display(),
                valid_length = result.valid_length,
                corrupted = result.entries_corrupted,
                "truncated damaged log tail"
            );
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, false).map(|(_, result)| result)
    }

    fn scan(path: &Path, keep: bool) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
            valid_length: 0,
        };

        loop {
            match reader.next_frame()? {
                Frame::Entry(entry) if entry.lsn > result.last_lsn => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    if keep {
                        entries.push(entry);
                    }
                }
                Frame::Entry(_) | Frame::Corrupt(_) => {
                    // Out-of-order LSNs mean the frame was not written by us
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
                Frame::Partial => {
                    result.was_truncated = true;
                    break;
                }
                Frame::End => break,
            }
            result.valid_length = reader.position();
        }

        Ok((entries, result))
    }
}
