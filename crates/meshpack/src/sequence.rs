//! Index sequence codec.
//!
//! For index data that is not a triangle list: strips, line lists, point
//! lists, meshlet vertex lists. Each index is coded as a zigzag delta against
//! one of two baselines; the encoder flips to the other baseline whenever the
//! current one is far away, which keeps interleaved runs cheap.
//!
//! # Format
//!
//! ```text
//! [0xD0 | version]
//! [one varint per index: zigzag(delta) << 1 | baseline]
//! [4 zero bytes]
//! ```

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::index::{IndexType, index_varint_groups};
use crate::indices::IndexEncodingVersion;
use crate::varint::{read_varint, write_varint, zigzag_decode, zigzag_encode};

const SEQUENCE_HEADER: u8 = 0xd0;

const TAIL_SIZE: usize = 4;

/// Deltas at least this large switch to the other baseline.
const BASELINE_SWITCH_DISTANCE: u32 = 30;

/// Worst-case encoded size for `index_count` indices referencing
/// `vertex_count` vertices.
#[must_use]
pub fn encode_index_sequence_bound(index_count: usize, vertex_count: usize) -> usize {
    // One extra bit for the zigzag sign and one for the baseline.
    1 + index_count * index_varint_groups(vertex_count, 2) + TAIL_SIZE
}

/// Encode an index sequence into `buffer`, returning the number of bytes written.
pub fn encode_index_sequence_into<T: IndexType>(
    buffer: &mut [u8],
    indices: &[T],
    version: IndexEncodingVersion,
) -> EncodeResult<usize> {
    if buffer.len() < 1 + indices.len() + TAIL_SIZE {
        tracing::debug!(capacity = buffer.len(), "index sequence encode out of space");
        return Err(EncodeError::BufferTooSmall);
    }

    buffer[0] = SEQUENCE_HEADER | version as u8;

    let mut last = [0u32; 2];
    let mut current = 0;
    let mut offset = 1;

    for index in indices.iter().map(|i| i.to_u32()) {
        let distance = index.wrapping_sub(last[current]) as i32;
        if distance.unsigned_abs() >= BASELINE_SWITCH_DISTANCE {
            current ^= 1;
        }

        let delta = index.wrapping_sub(last[current]) as i32;
        let value = (u64::from(zigzag_encode(delta)) << 1) | current as u64;
        write_varint(buffer, &mut offset, value)?;

        last[current] = index;
    }

    buffer
        .get_mut(offset..offset + TAIL_SIZE)
        .ok_or(EncodeError::BufferTooSmall)?
        .fill(0);

    Ok(offset + TAIL_SIZE)
}

/// Encode an index sequence into a freshly allocated buffer.
pub fn encode_index_sequence<T: IndexType>(
    indices: &[T],
    vertex_count: usize,
    version: IndexEncodingVersion,
) -> EncodeResult<Vec<u8>> {
    let mut buffer = vec![0; encode_index_sequence_bound(indices.len(), vertex_count)];
    let written = encode_index_sequence_into(&mut buffer, indices, version)?;
    buffer.truncate(written);
    Ok(buffer)
}

/// Decode an index sequence into `destination`.
///
/// On error the contents of `destination` are unspecified.
pub fn decode_index_sequence_into<T: IndexType>(
    destination: &mut [T],
    encoded: &[u8],
) -> DecodeResult<()> {
    if encoded.len() < 1 + destination.len() + TAIL_SIZE {
        return Err(DecodeError::UnexpectedEof);
    }

    let header = encoded[0];
    if header & 0xf0 != SEQUENCE_HEADER {
        return Err(DecodeError::InvalidHeader(header));
    }
    if header & 0x0f > 1 {
        return Err(DecodeError::UnsupportedVersion(header & 0x0f));
    }

    let data_end = encoded.len() - TAIL_SIZE;
    let mut last = [0u32; 2];
    let mut offset = 1;

    for slot in destination.iter_mut() {
        // A varint is at most 5 bytes and the tail covers the overrun.
        if offset >= data_end {
            return Err(DecodeError::UnexpectedEof);
        }

        let value = read_varint(encoded, &mut offset)?;
        let current = (value & 1) as usize;
        let delta = zigzag_decode((value >> 1) as u32);

        let index = last[current].wrapping_add_signed(delta);
        last[current] = index;

        *slot = T::from_u32(index).ok_or(DecodeError::IndexOverflow(index))?;
    }

    match offset.cmp(&data_end) {
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Less => Err(DecodeError::TrailingData(data_end - offset)),
        std::cmp::Ordering::Greater => Err(DecodeError::UnexpectedEof),
    }
}

/// Decode an index sequence of `index_count` indices.
pub fn decode_index_sequence<T: IndexType>(encoded: &[u8], index_count: usize) -> DecodeResult<Vec<T>> {
    let mut indices = vec![T::default(); index_count];
    decode_index_sequence_into(&mut indices, encoded)?;
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const STRIP: [u32; 10] = [0, 1, 2, 3, 4, 100, 5, 101, 6, 102];

    #[test]
    fn test_roundtrip_strip() {
        let encoded = encode_index_sequence(&STRIP, 103, IndexEncodingVersion::V1).unwrap();

        // Only the jump to the second run needs two bytes.
        assert_eq!(encoded.len(), 1 + STRIP.len() + 1 + TAIL_SIZE);

        let decoded: Vec<u16> = decode_index_sequence(&encoded, STRIP.len()).unwrap();
        assert!(decoded.iter().map(|&i| u32::from(i)).eq(STRIP));
    }

    #[test]
    fn test_large_indices() {
        let indices = [0, u32::MAX, 1 << 31, 7];
        let encoded = encode_index_sequence(&indices, usize::MAX, IndexEncodingVersion::V1).unwrap();
        let decoded: Vec<u32> = decode_index_sequence(&encoded, indices.len()).unwrap();
        assert_eq!(decoded, indices);
    }

    #[test]
    fn test_rejects_truncation_and_trailing() {
        let encoded = encode_index_sequence(&STRIP, 103, IndexEncodingVersion::V1).unwrap();

        for len in 0..encoded.len() {
            let result: DecodeResult<Vec<u32>> = decode_index_sequence(&encoded[..len], STRIP.len());
            assert!(result.is_err(), "prefix of {len} bytes decoded");
        }

        let mut extended = encoded.clone();
        extended.push(0);
        let result: DecodeResult<Vec<u32>> = decode_index_sequence(&extended, STRIP.len());
        assert_eq!(result, Err(DecodeError::TrailingData(1)));
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut encoded = encode_index_sequence(&STRIP, 103, IndexEncodingVersion::V1).unwrap();
        encoded[0] = 0xe1;

        let result: DecodeResult<Vec<u32>> = decode_index_sequence(&encoded, STRIP.len());
        assert_eq!(result, Err(DecodeError::InvalidHeader(0xe1)));
    }

    #[test]
    fn test_encode_capacity() {
        let encoded = encode_index_sequence(&STRIP, 103, IndexEncodingVersion::V1).unwrap();

        for capacity in 0..encoded.len() {
            let mut buffer = vec![0u8; capacity];
            assert_eq!(
                encode_index_sequence_into(&mut buffer, &STRIP, IndexEncodingVersion::V1),
                Err(EncodeError::BufferTooSmall)
            );
        }

        let mut buffer = vec![0u8; encoded.len()];
        assert_eq!(
            encode_index_sequence_into(&mut buffer, &STRIP, IndexEncodingVersion::V1),
            Ok(encoded.len())
        );
    }

    proptest! {
        #[test]
        fn prop_roundtrip(indices in prop::collection::vec(any::<u32>(), 0..300)) {
            let encoded = encode_index_sequence(&indices, usize::MAX, IndexEncodingVersion::V1).unwrap();
            let decoded: Vec<u32> = decode_index_sequence(&encoded, indices.len()).unwrap();
            prop_assert_eq!(decoded, indices);
        }
    }
}
