//! WAL Reader
//!
//! Handles reading entries from a table log file.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::encoding::binary;
use crate::error::{ColKvError, Result};

use super::entry::{FIXED_HEADER_SIZE, HEADER_SIZE};
use super::WalEntry;

/// Outcome of reading one frame
#[derive(Debug)]
pub(crate) enum Frame {
    /// A complete, checksummed entry
    Entry(WalEntry),
    /// Clean end of file on a frame boundary
    End,
    /// The file ends in the middle of a frame (interrupted write)
    Partial,
    /// A complete frame whose checksum or payload is bad
    Corrupt(String),
}

/// Reads entries from a table log file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last complete entry
    position: u64,
    /// File length at open; bounds payload allocations
    file_len: u64,
}

impl WalReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the log
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// torn or damaged frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Partial => Err(ColKvError::WalCorruption(format!(
                "Incomplete entry at offset {}",
                self.position
            ))),
            Frame::Corrupt(reason) => Err(ColKvError::WalCorruption(reason)),
        }
    }

    /// Offset just past the last complete entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries, stopping at the first error
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        // Header: LSN (8) + CRC (4) + leading two bytes of the size
        let mut header = [0u8; HEADER_SIZE];
        match read_full(&mut self.reader, &mut header)? {
            0 => return Ok(Frame::End),
            n if n < HEADER_SIZE => return Ok(Frame::Partial),
            _ => {}
        }

        let lsn = binary::get_i64(&header, 0)? as u64;
        let crc = binary::get_u32(&header, 8)?;
        let prefix_len = binary::size_prefix_len(&header, FIXED_HEADER_SIZE)?;

        let mut size_bytes = [0u8; 4];
        size_bytes[..2].copy_from_slice(&header[FIXED_HEADER_SIZE..]);
        if prefix_len == 4 && read_full(&mut self.reader, &mut size_bytes[2..])? < 2 {
            return Ok(Frame::Partial);
        }
        let (payload_len, _) = binary::read_size(&size_bytes, 0)?;

        let frame_start = self.position + (FIXED_HEADER_SIZE + prefix_len) as u64;
        if frame_start + payload_len as u64 > self.file_len {
            return Ok(Frame::Partial);
        }

        let mut payload = vec![0u8; payload_len];
        if read_full(&mut self.reader, &mut payload)? < payload_len {
            return Ok(Frame::Partial);
        }

        match WalEntry::decode_body(lsn, crc, &payload) {
            Ok(entry) => {
                self.position += (FIXED_HEADER_SIZE + prefix_len + payload_len) as u64;
                Ok(Frame::Entry(entry))
            }
            Err(e) => Ok(Frame::Corrupt(e.to_string())),
        }
    }
}

/// Iterator over log entries
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the file allows, returning the bytes read
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
