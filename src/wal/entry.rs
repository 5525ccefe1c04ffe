//! WAL Entry definitions
//!
//! Defines the structure of individual table log entries and their frame.

use serde::{Deserialize, Serialize};

use crate::encoding::binary;
use crate::error::{ColKvError, Result};
use crate::model::{ColumnId, RowKey};
use crate::table::Selection;

/// Bytes before the size prefix: LSN (8) + CRC (4)
pub(crate) const FIXED_HEADER_SIZE: usize = 12;

/// Smallest possible frame header: LSN (8) + CRC (4) + short size (2)
pub const HEADER_SIZE: usize = FIXED_HEADER_SIZE + 2;

/// A single entry in a table log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing within one file
    pub lsn: u64,

    /// Row stamp the mutation assigns
    pub stamp: i64,

    /// The operation to perform
    pub operation: Operation,
}

/// Row mutations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Remove `remove`, then insert or overwrite `upsert`
    Set {
        key: RowKey,
        remove: Selection,
        upsert: Vec<(ColumnId, Vec<u8>)>,
    },

    /// Remove the selected columns of a row
    Remove { key: RowKey, selection: Selection },
}

impl Operation {
    pub fn key(&self) -> RowKey {
        match self {
            Operation::Set { key, .. } | Operation::Remove { key, .. } => *key,
        }
    }
}

impl WalEntry {
    pub fn new(lsn: u64, stamp: i64, operation: Operation) -> Self {
        Self {
            lsn,
            stamp,
            operation,
        }
    }

    /// Encode the full frame:
    /// `[LSN (8)][CRC (4)][Len (2|4)][bincode(stamp, operation)]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&(self.stamp, &self.operation))?;

        let mut frame = vec![0u8; FIXED_HEADER_SIZE];
        binary::put_i64(&mut frame, 0, self.lsn as i64)?;
        binary::put_u32(&mut frame, 8, Self::compute_crc(self.lsn, &payload))?;
        binary::append_size(&mut frame, payload.len())?;
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode one frame from the start of `bytes`, returning the entry and
    /// the number of bytes it occupied
    pub fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(ColKvError::WalCorruption(format!(
                "Incomplete header: expected at least {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let lsn = binary::get_i64(bytes, 0)? as u64;
        let crc = binary::get_u32(bytes, 8)?;
        let prefix_len = binary::size_prefix_len(bytes, FIXED_HEADER_SIZE)?;
        if bytes.len() < FIXED_HEADER_SIZE + prefix_len {
            return Err(ColKvError::WalCorruption(
                "Incomplete size prefix".to_string(),
            ));
        }
        let (payload_len, _) = binary::read_size(bytes, FIXED_HEADER_SIZE)?;

        let start = FIXED_HEADER_SIZE + prefix_len;
        let end = start + payload_len;
        if bytes.len() < end {
            return Err(ColKvError::WalCorruption(format!(
                "Incomplete payload: expected {} bytes, got {}",
                payload_len,
                bytes.len() - start
            )));
        }

        let entry = Self::decode_body(lsn, crc, &bytes[start..end])?;
        Ok((entry, end))
    }

    /// Check the CRC of a payload and decode it
    pub(crate) fn decode_body(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(lsn, payload);
        if actual != crc {
            return Err(ColKvError::WalCorruption(format!(
                "CRC mismatch at LSN {}: stored {:08x}, computed {:08x}",
                lsn, crc, actual
            )));
        }

        let (stamp, operation): (i64, Operation) = bincode::deserialize(payload)?;
        Ok(Self::new(lsn, stamp, operation))
    }

    /// CRC32 over the LSN and payload
    pub fn compute_crc(lsn: u64, payload: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_be_bytes());
        hasher.update(payload);
        hasher.finalize()
    }
}
