//! Vertex buffer codec.
//!
//! Vertices are treated as opaque fixed-size records. The buffer is split into
//! blocks; within a block every byte offset of the record (a "lane") is delta
//! coded against the same byte of the previous vertex, zigzag mapped, and bit
//! packed in groups of 16 values.
//!
//! # Format
//!
//! ```text
//! [0xA0 | version]
//! [version 1: vertex_size / 4]
//! per block, per lane:
//!     [group widths, 2 bits per group]
//!     per group: [packed values][full bytes for values at the sentinel]
//! [tail: zero padding + first vertex, max(32, vertex_size) bytes]
//! ```
//!
//! Group widths are 0 (all zero), 2, 4 or 8 bits per value. The tail seeds the
//! decoder's predictor and pads the stream so that a group read never has to
//! be bounds checked against a truncated end.

use bytemuck::Pod;

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

const VERTEX_HEADER: u8 = 0xa0;

const VERTEX_BLOCK_SIZE_BYTES: usize = 8192;
const VERTEX_BLOCK_MAX_SIZE: usize = 256;
const BYTE_GROUP_SIZE: usize = 16;
const BYTE_GROUP_DECODE_LIMIT: usize = 24;
const TAIL_MAX_SIZE: usize = 32;

/// Largest supported vertex size in bytes.
pub const MAX_VERTEX_SIZE: usize = 256;

/// Vertex codec format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexEncodingVersion {
    /// Decodable by every decoder; the stream does not record the stride.
    V0,
    /// Records the stride after the header so mismatches are detected.
    #[default]
    V1,
}

impl VertexEncodingVersion {
    fn from_header(header: u8) -> DecodeResult<Self> {
        if header & 0xf0 != VERTEX_HEADER {
            return Err(DecodeError::InvalidHeader(header));
        }
        match header & 0x0f {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            version => Err(DecodeError::UnsupportedVersion(version)),
        }
    }
}

fn is_valid_vertex_size(vertex_size: usize) -> bool {
    vertex_size > 0 && vertex_size <= MAX_VERTEX_SIZE && vertex_size % 4 == 0
}

/// Vertices per block, a multiple of the group size.
fn vertex_block_size(vertex_size: usize) -> usize {
    let result = (VERTEX_BLOCK_SIZE_BYTES / vertex_size) & !(BYTE_GROUP_SIZE - 1);
    result.min(VERTEX_BLOCK_MAX_SIZE)
}

fn tail_size(vertex_size: usize) -> usize {
    vertex_size.max(TAIL_MAX_SIZE)
}

/// Header bytes for a lane of `lane_len` values, 2 bits per group.
fn lane_header_size(lane_len: usize) -> usize {
    (lane_len / BYTE_GROUP_SIZE).div_ceil(4)
}

#[inline]
fn zigzag8(v: u8) -> u8 {
    (((v as i8) >> 7) as u8) ^ (v << 1)
}

#[inline]
fn unzigzag8(v: u8) -> u8 {
    0u8.wrapping_sub(v & 1) ^ (v >> 1)
}

/// Worst-case encoded size for `vertex_count` vertices of `vertex_size` bytes.
///
/// Returns 0 for an invalid vertex size.
#[must_use]
pub fn encode_vertex_buffer_bound(vertex_count: usize, vertex_size: usize) -> usize {
    if !is_valid_vertex_size(vertex_size) {
        return 0;
    }

    let block_size = vertex_block_size(vertex_size);
    let block_count = vertex_count.div_ceil(block_size);

    // Every group at 8 bits, plus the lane headers.
    let block_lane_size = lane_header_size(block_size) + block_size;

    2 + block_count * vertex_size * block_lane_size + tail_size(vertex_size)
}

/// Byte sink over a caller buffer that never writes past its end.
struct Output<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl Output<'_> {
    fn write(&mut self, bytes: &[u8]) -> EncodeResult<()> {
        self.buffer
            .get_mut(self.offset..self.offset + bytes.len())
            .ok_or(EncodeError::BufferTooSmall)?
            .copy_from_slice(bytes);
        self.offset += bytes.len();
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> EncodeResult<()> {
        self.write(&[byte])
    }
}

/// Encode vertex records into `buffer`, returning the number of bytes written.
///
/// `vertices` holds tightly packed records of `vertex_size` bytes; the size
/// must be a multiple of 4 no larger than [`MAX_VERTEX_SIZE`].
pub fn encode_vertex_buffer_into(
    buffer: &mut [u8],
    vertices: &[u8],
    vertex_size: usize,
    version: VertexEncodingVersion,
) -> EncodeResult<usize> {
    if !is_valid_vertex_size(vertex_size) {
        return Err(EncodeError::InvalidVertexSize(vertex_size));
    }
    if vertices.len() % vertex_size != 0 {
        return Err(EncodeError::VertexDataMisaligned {
            len: vertices.len(),
            stride: vertex_size,
        });
    }

    let mut out = Output { buffer, offset: 0 };

    out.write_byte(VERTEX_HEADER | version as u8)?;
    if version == VertexEncodingVersion::V1 {
        out.write_byte((vertex_size / 4) as u8)?;
    }

    let mut first_vertex = [0u8; MAX_VERTEX_SIZE];
    if let Some(first) = vertices.get(..vertex_size) {
        first_vertex[..vertex_size].copy_from_slice(first);
    }

    let mut last_vertex = first_vertex;

    for block in vertices.chunks(vertex_block_size(vertex_size) * vertex_size) {
        encode_vertex_block(&mut out, block, vertex_size, &mut last_vertex)?;
    }

    // Zero padding, then the first vertex as the decoder's initial predictor.
    let padding = tail_size(vertex_size) - vertex_size;
    out.write(&[0u8; TAIL_MAX_SIZE][..padding])?;
    out.write(&first_vertex[..vertex_size])?;

    tracing::trace!(
        vertices = vertices.len() / vertex_size,
        vertex_size,
        bytes = out.offset,
        "encoded vertex buffer"
    );

    Ok(out.offset)
}

/// Encode vertex records into a freshly allocated buffer.
pub fn encode_vertex_buffer(
    vertices: &[u8],
    vertex_size: usize,
    version: VertexEncodingVersion,
) -> EncodeResult<Vec<u8>> {
    if !is_valid_vertex_size(vertex_size) {
        return Err(EncodeError::InvalidVertexSize(vertex_size));
    }

    let vertex_count = vertices.len() / vertex_size;
    let mut buffer = vec![0; encode_vertex_buffer_bound(vertex_count, vertex_size)];
    let written = encode_vertex_buffer_into(&mut buffer, vertices, vertex_size, version)?;
    buffer.truncate(written);
    Ok(buffer)
}

/// Encode a slice of plain-old-data vertices.
pub fn encode_vertices<V: Pod>(vertices: &[V], version: VertexEncodingVersion) -> EncodeResult<Vec<u8>> {
    let vertex_size = std::mem::size_of::<V>();
    if !is_valid_vertex_size(vertex_size) {
        return Err(EncodeError::InvalidVertexSize(vertex_size));
    }
    encode_vertex_buffer(bytemuck::cast_slice(vertices), vertex_size, version)
}

fn encode_vertex_block(
    out: &mut Output<'_>,
    block: &[u8],
    vertex_size: usize,
    last_vertex: &mut [u8; MAX_VERTEX_SIZE],
) -> EncodeResult<()> {
    let vertex_count = block.len() / vertex_size;
    let lane_len = vertex_count.next_multiple_of(BYTE_GROUP_SIZE);

    // Values past vertex_count stay zero for every lane.
    let mut lane = [0u8; VERTEX_BLOCK_MAX_SIZE];

    for k in 0..vertex_size {
        let mut p = last_vertex[k];

        for (value, vertex) in lane.iter_mut().zip(block.chunks_exact(vertex_size)) {
            *value = zigzag8(vertex[k].wrapping_sub(p));
            p = vertex[k];
        }

        encode_lane(out, &lane[..lane_len])?;
    }

    last_vertex[..vertex_size].copy_from_slice(&block[block.len() - vertex_size..]);

    Ok(())
}

fn encode_lane(out: &mut Output<'_>, lane: &[u8]) -> EncodeResult<()> {
    let mut header = [0u8; VERTEX_BLOCK_MAX_SIZE / BYTE_GROUP_SIZE / 4];
    let header = &mut header[..lane_header_size(lane.len())];

    let mut widths = [8u32; VERTEX_BLOCK_MAX_SIZE / BYTE_GROUP_SIZE];

    for (group, values) in lane.chunks_exact(BYTE_GROUP_SIZE).enumerate() {
        widths[group] = best_group_width(values);
        header[group / 4] |= (widths[group].trailing_zeros() as u8) << ((group % 4) * 2);
    }

    out.write(header)?;

    for (group, &bits) in lane.chunks_exact(BYTE_GROUP_SIZE).zip(&widths) {
        encode_group(out, group, bits)?;
    }

    Ok(())
}

/// Encoded size of a group at `bits` per value, or `None` if it cannot be
/// represented (1 bit is only used for all-zero groups).
fn measure_group(group: &[u8], bits: u32) -> Option<usize> {
    match bits {
        1 => group.iter().all(|&v| v == 0).then_some(0),
        8 => Some(BYTE_GROUP_SIZE),
        _ => {
            let sentinel = (1u8 << bits) - 1;
            let escaped = group.iter().filter(|&&v| v >= sentinel).count();
            Some(BYTE_GROUP_SIZE * bits as usize / 8 + escaped)
        }
    }
}

fn best_group_width(group: &[u8]) -> u32 {
    let mut best_bits = 8;
    let mut best_size = BYTE_GROUP_SIZE;

    for bits in [1, 2, 4] {
        if let Some(size) = measure_group(group, bits) {
            if size < best_size {
                best_bits = bits;
                best_size = size;
            }
        }
    }

    best_bits
}

fn encode_group(out: &mut Output<'_>, group: &[u8], bits: u32) -> EncodeResult<()> {
    match bits {
        1 => Ok(()),
        8 => out.write(group),
        _ => {
            let per_byte = 8 / bits as usize;
            let sentinel = (1u8 << bits) - 1;

            for chunk in group.chunks_exact(per_byte) {
                let byte = chunk
                    .iter()
                    .fold(0u8, |byte, &v| (byte << bits) | v.min(sentinel));
                out.write_byte(byte)?;
            }

            for &v in group.iter().filter(|&&v| v >= sentinel) {
                out.write_byte(v)?;
            }

            Ok(())
        }
    }
}

/// Decode vertex records into `destination`.
///
/// `destination.len()` must be a multiple of `vertex_size`; its length
/// determines the vertex count. On error the contents of `destination` are
/// unspecified.
pub fn decode_vertex_buffer_into(
    destination: &mut [u8],
    vertex_size: usize,
    encoded: &[u8],
) -> DecodeResult<()> {
    if !is_valid_vertex_size(vertex_size) {
        return Err(DecodeError::InvalidVertexSize(vertex_size));
    }
    if destination.len() % vertex_size != 0 {
        return Err(DecodeError::DestinationMisaligned {
            len: destination.len(),
            stride: vertex_size,
        });
    }

    if encoded.len() < 1 + vertex_size {
        tracing::debug!(len = encoded.len(), "vertex buffer too short");
        return Err(DecodeError::UnexpectedEof);
    }

    let version = VertexEncodingVersion::from_header(encoded[0])?;
    let mut offset = 1;

    if version == VertexEncodingVersion::V1 {
        let found = usize::from(encoded[1]) * 4;
        if found != vertex_size {
            tracing::debug!(expected = vertex_size, found, "vertex stride mismatch");
            return Err(DecodeError::StrideMismatch {
                expected: vertex_size,
                found,
            });
        }
        offset += 1;
    }

    let mut last_vertex = [0u8; MAX_VERTEX_SIZE];
    last_vertex[..vertex_size].copy_from_slice(&encoded[encoded.len() - vertex_size..]);

    let mut input = Input { encoded, offset };

    for block in destination.chunks_mut(vertex_block_size(vertex_size) * vertex_size) {
        decode_vertex_block(&mut input, block, vertex_size, &mut last_vertex)?;
    }

    let remaining = encoded.len() - input.offset;
    let tail = tail_size(vertex_size);

    match remaining.cmp(&tail) {
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Greater => {
            tracing::debug!(extra = remaining - tail, "vertex buffer has trailing data");
            Err(DecodeError::TrailingData(remaining - tail))
        }
        std::cmp::Ordering::Less => Err(DecodeError::UnexpectedEof),
    }
}

/// Decode `vertex_count` records of `vertex_size` bytes.
pub fn decode_vertex_buffer(
    encoded: &[u8],
    vertex_count: usize,
    vertex_size: usize,
) -> DecodeResult<Vec<u8>> {
    if !is_valid_vertex_size(vertex_size) {
        return Err(DecodeError::InvalidVertexSize(vertex_size));
    }

    let len = checked_buffer_len(vertex_count, vertex_size)?;
    let mut vertices = vec![0; len];
    decode_vertex_buffer_into(&mut vertices, vertex_size, encoded)?;
    Ok(vertices)
}

/// Byte length of `vertex_count` vertices, rejecting counts the encoded stream
/// could not possibly describe before anything is allocated.
fn checked_buffer_len(vertex_count: usize, vertex_size: usize) -> DecodeResult<usize> {
    vertex_count
        .checked_mul(vertex_size)
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(DecodeError::VertexCountOverflow {
            count: vertex_count,
            stride: vertex_size,
        })
}

/// Decode `vertex_count` plain-old-data vertices.
pub fn decode_vertices<V: Pod>(encoded: &[u8], vertex_count: usize) -> DecodeResult<Vec<V>> {
    let vertex_size = std::mem::size_of::<V>();
    if !is_valid_vertex_size(vertex_size) {
        return Err(DecodeError::InvalidVertexSize(vertex_size));
    }

    checked_buffer_len(vertex_count, vertex_size)?;

    let mut vertices = vec![V::zeroed(); vertex_count];
    decode_vertex_buffer_into(bytemuck::cast_slice_mut(&mut vertices), vertex_size, encoded)?;
    Ok(vertices)
}

/// Read cursor over the encoded stream.
struct Input<'a> {
    encoded: &'a [u8],
    offset: usize,
}

impl<'a> Input<'a> {
    fn remaining(&self) -> usize {
        self.encoded.len() - self.offset
    }

    fn read(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let bytes = self
            .encoded
            .get(self.offset..self.offset + len)
            .ok_or(DecodeError::UnexpectedEof)?;
        self.offset += len;
        Ok(bytes)
    }

    fn read_byte(&mut self) -> DecodeResult<u8> {
        Ok(self.read(1)?[0])
    }
}

fn decode_vertex_block(
    input: &mut Input<'_>,
    block: &mut [u8],
    vertex_size: usize,
    last_vertex: &mut [u8; MAX_VERTEX_SIZE],
) -> DecodeResult<()> {
    let vertex_count = block.len() / vertex_size;
    let lane_len = vertex_count.next_multiple_of(BYTE_GROUP_SIZE);

    let mut lane = [0u8; VERTEX_BLOCK_MAX_SIZE];

    for k in 0..vertex_size {
        decode_lane(input, &mut lane[..lane_len])?;

        let mut p = last_vertex[k];

        for (&value, vertex) in lane.iter().zip(block.chunks_exact_mut(vertex_size)) {
            let v = unzigzag8(value).wrapping_add(p);
            vertex[k] = v;
            p = v;
        }
    }

    last_vertex[..vertex_size].copy_from_slice(&block[block.len() - vertex_size..]);

    Ok(())
}

fn decode_lane(input: &mut Input<'_>, lane: &mut [u8]) -> DecodeResult<()> {
    let header = input.read(lane_header_size(lane.len()))?;

    for (group, values) in lane.chunks_exact_mut(BYTE_GROUP_SIZE).enumerate() {
        // The largest group is 24 bytes; anything shorter cannot be a valid stream.
        if input.remaining() < BYTE_GROUP_DECODE_LIMIT {
            return Err(DecodeError::UnexpectedEof);
        }

        let bitslog2 = (header[group / 4] >> ((group % 4) * 2)) & 3;
        decode_group(input, values, bitslog2)?;
    }

    Ok(())
}

fn decode_group(input: &mut Input<'_>, values: &mut [u8], bitslog2: u8) -> DecodeResult<()> {
    match bitslog2 {
        0 => values.fill(0),
        3 => values.copy_from_slice(input.read(BYTE_GROUP_SIZE)?),
        _ => {
            let bits = 1usize << bitslog2;
            let per_byte = 8 / bits;
            let sentinel = (1u8 << bits) - 1;

            let packed = input.read(BYTE_GROUP_SIZE / per_byte)?;

            for (i, value) in values.iter_mut().enumerate() {
                let shift = 8 - bits * (i % per_byte + 1);
                let v = (packed[i / per_byte] >> shift) & sentinel;
                *value = if v == sentinel { input.read_byte()? } else { v };
            }
        }
    }

    Ok(())
}
