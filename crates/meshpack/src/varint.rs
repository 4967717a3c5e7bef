//! Variable-length integer and zigzag helpers.
//!
//! Varints store 7 bits per byte, least significant group first, with the high
//! bit set on every byte except the last. Readers stop after
//! [`MAX_VARINT_LEN`] bytes even if the continuation bit is still set, so a
//! malformed stream can never make a read run away.

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// Maximum number of bytes a single varint occupies.
pub const MAX_VARINT_LEN: usize = 5;

/// Read a varint from `data` starting at `*offset`, advancing the offset.
///
/// At most [`MAX_VARINT_LEN`] bytes are consumed, which yields up to 35
/// significant bits.
pub fn read_varint(data: &[u8], offset: &mut usize) -> DecodeResult<u64> {
    let mut result = 0u64;
    let mut shift = 0;

    for _ in 0..MAX_VARINT_LEN {
        let byte = *data.get(*offset).ok_or(DecodeError::UnexpectedEof)?;
        *offset += 1;

        result |= u64::from(byte & 0x7f) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok(result)
}

/// Write `value` as a varint into `data` at `*offset`, advancing the offset.
///
/// `value` must fit in 35 bits so that [`read_varint`] can restore it.
pub fn write_varint(data: &mut [u8], offset: &mut usize, mut value: u64) -> EncodeResult<()> {
    debug_assert!(value < 1 << (7 * MAX_VARINT_LEN));

    loop {
        let byte = data.get_mut(*offset).ok_or(EncodeError::BufferTooSmall)?;
        *offset += 1;

        let more = value > 0x7f;
        *byte = (value & 0x7f) as u8 | if more { 0x80 } else { 0 };
        value >>= 7;

        if !more {
            return Ok(());
        }
    }
}

/// Map a signed delta onto an unsigned value so small magnitudes stay small.
#[inline]
#[must_use]
pub fn zigzag_encode(delta: i32) -> u32 {
    ((delta << 1) ^ (delta >> 31)) as u32
}

/// Inverse of [`zigzag_encode`].
#[inline]
#[must_use]
pub fn zigzag_decode(value: u32) -> i32 {
    ((value >> 1) ^ 0u32.wrapping_sub(value & 1)) as i32
}
