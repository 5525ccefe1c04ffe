//! Binary codec
//!
//! Fixed-width encoding of primitive values into byte buffers, plus a
//! variable-length size prefix.
//!
//! ## Byte Order
//! All multi-byte values are big-endian, so the byte-wise order of encoded
//! unsigned integers matches their numeric order.
//!
//! ## Size Format
//! ```text
//! size <= 32767:  ┌──────────────────────────┐
//!                 │ 0 | size (15 bits)       │   2 bytes
//!                 └──────────────────────────┘
//! size >  32767:  ┌──────────────────────────┬──────────────────┐
//!                 │ 1 | size >> 16 (15 bits) │ size & 0xFFFF    │   4 bytes
//!                 └──────────────────────────┴──────────────────┘
//! ```
//! The leading bit is the continuation flag.

use crate::error::{ColKvError, Result};

/// Encoded width of a `bool`
pub const BOOL_SIZE: usize = 1;
/// Encoded width of a `u16` (also used for UTF-16 code units)
pub const U16_SIZE: usize = 2;
/// Encoded width of an `i32` / `f32`
pub const I32_SIZE: usize = 4;
/// Encoded width of an `i64` / `f64`
pub const I64_SIZE: usize = 8;

/// Largest size that fits the 2-byte form
pub const MAX_SHORT_SIZE: usize = 0x7FFF;
/// Largest size the codec can represent at all
pub const MAX_SIZE: usize = i32::MAX as usize;

const CONTINUATION_FLAG: u16 = 0x8000;

// =============================================================================
// Fixed-Width Values
// =============================================================================

/// Write a `bool` at `offset`, returning the offset just past it
pub fn put_bool(buf: &mut [u8], offset: usize, value: bool) -> Result<usize> {
    write_array(buf, offset, [value as u8])
}

/// Read a `bool`; any non-zero byte is `true`
pub fn get_bool(buf: &[u8], offset: usize) -> Result<bool> {
    let [b] = read_array::<BOOL_SIZE>(buf, offset)?;
    Ok(b != 0)
}

pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) -> Result<usize> {
    write_array(buf, offset, value.to_be_bytes())
}

pub fn get_u16(buf: &[u8], offset: usize) -> Result<u16> {
    Ok(u16::from_be_bytes(read_array(buf, offset)?))
}

pub fn put_i32(buf: &mut [u8], offset: usize, value: i32) -> Result<usize> {
    write_array(buf, offset, value.to_be_bytes())
}

pub fn get_i32(buf: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_be_bytes(read_array(buf, offset)?))
}

pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) -> Result<usize> {
    write_array(buf, offset, value.to_be_bytes())
}

pub fn get_u32(buf: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_be_bytes(read_array(buf, offset)?))
}

pub fn put_i64(buf: &mut [u8], offset: usize, value: i64) -> Result<usize> {
    write_array(buf, offset, value.to_be_bytes())
}

pub fn get_i64(buf: &[u8], offset: usize) -> Result<i64> {
    Ok(i64::from_be_bytes(read_array(buf, offset)?))
}

pub fn put_f32(buf: &mut [u8], offset: usize, value: f32) -> Result<usize> {
    write_array(buf, offset, value.to_bits().to_be_bytes())
}

pub fn get_f32(buf: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_bits(u32::from_be_bytes(read_array(buf, offset)?)))
}

pub fn put_f64(buf: &mut [u8], offset: usize, value: f64) -> Result<usize> {
    write_array(buf, offset, value.to_bits().to_be_bytes())
}

pub fn get_f64(buf: &[u8], offset: usize) -> Result<f64> {
    Ok(f64::from_bits(u64::from_be_bytes(read_array(buf, offset)?)))
}

// =============================================================================
// Variable-Length Sizes
// =============================================================================

/// Number of bytes `write_size` uses for `size`
pub fn bytes_for_size(size: usize) -> Result<usize> {
    if size <= MAX_SHORT_SIZE {
        Ok(2)
    } else if size <= MAX_SIZE {
        Ok(4)
    } else {
        Err(ColKvError::Serialization(format!(
            "Size {} exceeds maximum encodable size {}",
            size, MAX_SIZE
        )))
    }
}

/// Number of bytes the size starting at `offset` occupies, judged from its
/// leading byte alone
pub fn size_prefix_len(buf: &[u8], offset: usize) -> Result<usize> {
    let [lead] = read_array::<1>(buf, offset)?;
    Ok(if lead & 0x80 != 0 { 4 } else { 2 })
}

/// Write `size` at `offset`, returning the number of bytes written
pub fn write_size(buf: &mut [u8], offset: usize, size: usize) -> Result<usize> {
    match bytes_for_size(size)? {
        2 => {
            put_u16(buf, offset, size as u16)?;
            Ok(2)
        }
        _ => {
            let high = ((size >> 16) as u16) | CONTINUATION_FLAG;
            let low = (size & 0xFFFF) as u16;
            // Bounds check the whole slot before touching the buffer
            read_array::<4>(buf, offset)?;
            put_u16(buf, offset, high)?;
            put_u16(buf, offset + 2, low)?;
            Ok(4)
        }
    }
}

/// Read a size at `offset`, returning `(size, bytes_consumed)`
pub fn read_size(buf: &[u8], offset: usize) -> Result<(usize, usize)> {
    let first = get_u16(buf, offset)?;
    if first & CONTINUATION_FLAG == 0 {
        return Ok((first as usize, 2));
    }

    let low = get_u16(buf, offset + 2)?;
    let high = (first & !CONTINUATION_FLAG) as usize;
    Ok(((high << 16) | low as usize, 4))
}

/// Append `size` to a growable buffer
pub fn append_size(out: &mut Vec<u8>, size: usize) -> Result<()> {
    let start = out.len();
    out.resize(start + bytes_for_size(size)?, 0);
    write_size(out, start, size)?;
    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

fn slot_end(len: usize, offset: usize, width: usize) -> Result<usize> {
    offset
        .checked_add(width)
        .filter(|&end| end <= len)
        .ok_or_else(|| {
            ColKvError::Serialization(format!(
                "Buffer overflow: {} bytes at offset {} exceed buffer of {} bytes",
                width, offset, len
            ))
        })
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let end = slot_end(buf.len(), offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..end]);
    Ok(out)
}

fn write_array<const N: usize>(buf: &mut [u8], offset: usize, bytes: [u8; N]) -> Result<usize> {
    let end = slot_end(buf.len(), offset, N)?;
    buf[offset..end].copy_from_slice(&bytes);
    Ok(end)
}
