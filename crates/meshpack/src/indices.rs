//! Triangle index buffer codec.
//!
//! Triangles are coded one at a time against two small FIFOs: recently seen
//! edges and recently seen vertices. A triangle whose leading edge was seen
//! recently only needs its third vertex coded; otherwise each vertex is
//! either the next unused sequential index, a vertex FIFO reference, or a
//! free index stored as a zigzag varint delta.
//!
//! Triangles are never rotated, so decoding returns every triangle with the
//! same first vertex it was encoded with.
//!
//! # Format
//!
//! ```text
//! [0xE0 | version]
//! [one code byte per triangle]
//! [data: aux bytes and free index varints]
//! [16-byte codeaux table]
//! ```
//!
//! The trailing table is both the lookup table for short aux codes and the
//! padding that lets every triangle read up to 16 data bytes without running
//! off the end of the stream.

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::index::{IndexType, index_varint_groups};
use crate::varint::{read_varint, write_varint, zigzag_decode, zigzag_encode};

const INDEX_HEADER: u8 = 0xe0;

const FIFO_SIZE: usize = 16;

/// Aux byte table, generated from symbol frequencies on a training set.
///
/// Only the first 14 entries are addressable by short codes; no entry uses a
/// nibble of 15 since free indices always take the long form.
const CODEAUX_TABLE: [u8; 16] = [
    0x00, 0x76, 0x87, 0x56, 0x67, 0x78, 0xa9, 0x86, 0x65, 0x89, 0x68, 0x98, 0x01, 0x69, 0x00, 0x00,
];

/// Edge FIFO distances addressable by an edge code.
const EDGE_CODE_LIMIT: usize = 15;

/// Index codec format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexEncodingVersion {
    /// Decodable by every decoder.
    V0,
    /// Adds `last ± 1` codes for strip-like runs and restart codes for
    /// concatenated meshes.
    #[default]
    V1,
}

impl IndexEncodingVersion {
    fn from_header(header: u8) -> DecodeResult<Self> {
        if header & 0xf0 != INDEX_HEADER {
            return Err(DecodeError::InvalidHeader(header));
        }
        match header & 0x0f {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            version => Err(DecodeError::UnsupportedVersion(version)),
        }
    }

    fn header(self) -> u8 {
        INDEX_HEADER | self as u8
    }

    /// First vertex FIFO code that is not a FIFO reference on the edge path.
    fn fecmax(self) -> u8 {
        match self {
            Self::V0 => 15,
            Self::V1 => 13,
        }
    }
}

struct EdgeFifo {
    entries: [(u32, u32); FIFO_SIZE],
    offset: usize,
}

impl EdgeFifo {
    fn new() -> Self {
        Self {
            entries: [(u32::MAX, u32::MAX); FIFO_SIZE],
            offset: 0,
        }
    }

    /// Distance of the newest `(a, b)` entry that an edge code can address.
    fn find(&self, a: u32, b: u32) -> Option<usize> {
        (0..EDGE_CODE_LIMIT).find(|&distance| self.get(distance) == (a, b))
    }

    fn get(&self, distance: usize) -> (u32, u32) {
        self.entries[(self.offset + FIFO_SIZE - 1 - distance) % FIFO_SIZE]
    }

    fn push(&mut self, a: u32, b: u32) {
        self.entries[self.offset] = (a, b);
        self.offset = (self.offset + 1) % FIFO_SIZE;
    }
}

struct VertexFifo {
    entries: [u32; FIFO_SIZE],
    offset: usize,
}

impl VertexFifo {
    fn new() -> Self {
        Self {
            entries: [u32::MAX; FIFO_SIZE],
            offset: 0,
        }
    }

    /// Distance of the newest entry equal to `v`.
    ///
    /// Empty slots never match: after a restart the encoder clears its FIFO
    /// while the decoder keeps stale entries, so only real entries agree.
    fn find(&self, v: u32) -> Option<usize> {
        if v == u32::MAX {
            return None;
        }
        (0..FIFO_SIZE).find(|&distance| self.get(distance) == v)
    }

    fn get(&self, distance: usize) -> u32 {
        self.entries[(self.offset + FIFO_SIZE - 1 - distance) % FIFO_SIZE]
    }

    /// Store `v` in the next slot, but only advance when `advance` is set.
    fn push_if(&mut self, v: u32, advance: bool) {
        self.entries[self.offset] = v;
        self.offset = (self.offset + usize::from(advance)) % FIFO_SIZE;
    }

    fn push(&mut self, v: u32) {
        self.push_if(v, true);
    }

    fn clear(&mut self) {
        self.entries = [u32::MAX; FIFO_SIZE];
    }
}

/// Prediction state shared by encoder and decoder.
///
/// Both sides must update it identically, triangle for triangle.
struct CodecState {
    edges: EdgeFifo,
    vertices: VertexFifo,
    next: u32,
    last: u32,
}

impl CodecState {
    fn new() -> Self {
        Self {
            edges: EdgeFifo::new(),
            vertices: VertexFifo::new(),
            next: 0,
            last: 0,
        }
    }

    /// Take the next sequential index.
    fn take_next(&mut self) -> u32 {
        let v = self.next;
        self.next = self.next.wrapping_add(1);
        v
    }
}

/// Worst-case encoded size for `index_count` indices referencing
/// `vertex_count` vertices.
#[must_use]
pub fn encode_index_buffer_bound(index_count: usize, vertex_count: usize) -> usize {
    let vertex_groups = index_varint_groups(vertex_count, 1);

    // Code byte + aux byte + three free indices per triangle.
    1 + (index_count / 3) * (2 + 3 * vertex_groups) + CODEAUX_TABLE.len()
}

/// Encode a triangle list into `buffer`, returning the number of bytes written.
///
/// Fails with [`EncodeError::BufferTooSmall`] when `buffer` cannot hold the
/// stream; nothing is written past `buffer.len()` either way.
pub fn encode_index_buffer_into<T: IndexType>(
    buffer: &mut [u8],
    indices: &[T],
    version: IndexEncodingVersion,
) -> EncodeResult<usize> {
    if indices.len() % 3 != 0 {
        return Err(EncodeError::InvalidIndexCount(indices.len()));
    }

    let triangle_count = indices.len() / 3;

    if buffer.len() < 1 + triangle_count + CODEAUX_TABLE.len() {
        tracing::debug!(capacity = buffer.len(), "index buffer encode out of space");
        return Err(EncodeError::BufferTooSmall);
    }

    let (header, rest) = buffer.split_at_mut(1);
    let (codes, data) = rest.split_at_mut(triangle_count);

    header[0] = version.header();

    let mut encoder = TriangleEncoder {
        state: CodecState::new(),
        version,
        data,
        offset: 0,
    };

    for (triangle, code) in indices.chunks_exact(3).zip(codes.iter_mut()) {
        *code = encoder.encode([triangle[0].to_u32(), triangle[1].to_u32(), triangle[2].to_u32()])?;
    }

    let data_len = encoder.offset;
    encoder
        .data
        .get_mut(data_len..data_len + CODEAUX_TABLE.len())
        .ok_or(EncodeError::BufferTooSmall)?
        .copy_from_slice(&CODEAUX_TABLE);

    let written = 1 + triangle_count + data_len + CODEAUX_TABLE.len();
    tracing::trace!(triangles = triangle_count, bytes = written, "encoded index buffer");

    Ok(written)
}

/// Encode a triangle list into a freshly allocated buffer.
pub fn encode_index_buffer<T: IndexType>(
    indices: &[T],
    vertex_count: usize,
    version: IndexEncodingVersion,
) -> EncodeResult<Vec<u8>> {
    let mut buffer = vec![0; encode_index_buffer_bound(indices.len(), vertex_count)];
    let written = encode_index_buffer_into(&mut buffer, indices, version)?;
    buffer.truncate(written);
    Ok(buffer)
}

struct TriangleEncoder<'a> {
    state: CodecState,
    version: IndexEncodingVersion,
    data: &'a mut [u8],
    offset: usize,
}

impl TriangleEncoder<'_> {
    fn write_byte(&mut self, byte: u8) -> EncodeResult<()> {
        *self
            .data
            .get_mut(self.offset)
            .ok_or(EncodeError::BufferTooSmall)? = byte;
        self.offset += 1;
        Ok(())
    }

    /// Write `index` as a delta from the last free index.
    fn write_free(&mut self, index: u32) -> EncodeResult<()> {
        let delta = index.wrapping_sub(self.state.last) as i32;
        write_varint(self.data, &mut self.offset, u64::from(zigzag_encode(delta)))?;
        self.state.last = index;
        Ok(())
    }

    /// Encode one triangle and return its code byte.
    fn encode(&mut self, triangle: [u32; 3]) -> EncodeResult<u8> {
        let [a, b, _] = triangle;

        match self.state.edges.find(a, b) {
            Some(fe) => self.encode_edge(fe as u8, triangle),
            None => self.encode_free(triangle),
        }
    }

    /// Triangle whose first edge `(a, b)` sits at distance `fe` in the edge FIFO.
    fn encode_edge(&mut self, fe: u8, [a, b, c]: [u32; 3]) -> EncodeResult<u8> {
        let fecmax = self.version.fecmax();
        let fc = self.state.vertices.find(c);

        let mut fec = match fc {
            Some(fc) if fc >= 1 && fc < usize::from(fecmax) => fc as u8,
            _ if c == self.state.next => {
                self.state.take_next();
                0
            }
            _ => 15,
        };

        if fec == 15 && self.version == IndexEncodingVersion::V1 {
            // Strip-like sequences step by one from the last free index.
            if c.wrapping_add(1) == self.state.last {
                fec = 13;
                self.state.last = c;
            } else if c == self.state.last.wrapping_add(1) {
                fec = 14;
                self.state.last = c;
            }
        }

        if fec == 15 {
            self.write_free(c)?;
        }

        // a and b are almost always in the vertex FIFO already.
        if fec == 0 || fec >= fecmax {
            self.state.vertices.push(c);
        }

        // The first edge is already in the FIFO.
        self.state.edges.push(c, b);
        self.state.edges.push(a, c);

        Ok((fe << 4) | fec)
    }

    /// Triangle whose leading edge is not in the FIFO.
    fn encode_free(&mut self, [a, b, c]: [u32; 3]) -> EncodeResult<u8> {
        let state = &mut self.state;

        let reset = self.version == IndexEncodingVersion::V1
            && (a, b, c) == (0, 1, 2)
            && state.next > 0;

        if reset {
            state.next = 0;
            // Stale entries would let later triangles skip past `next`.
            state.vertices.clear();
        }

        let fb = state.vertices.find(b);
        let fc = state.vertices.find(c);

        let fea: u8 = if a == state.next {
            state.take_next();
            0
        } else {
            15
        };
        let feb = Self::vertex_code(state, fb, b, true);
        // A long-form aux byte of zero means restart, so a free `a` followed
        // by two next vertices codes `c` as free instead.
        let fec = Self::vertex_code(state, fc, c, reset || fea == 0 || feb != 0);

        let codeaux = (feb << 4) | fec;
        let table_index = CODEAUX_TABLE.iter().position(|&entry| entry == codeaux);

        let code = match table_index {
            Some(index) if fea == 0 && index < 14 && !reset => 0xf0 | index as u8,
            _ => {
                self.write_byte(codeaux)?;
                0xf0 | 14 | fea
            }
        };

        if fea == 15 {
            self.write_free(a)?;
        }
        if feb == 15 {
            self.write_free(b)?;
        }
        if fec == 15 {
            self.write_free(c)?;
        }

        let state = &mut self.state;
        state.vertices.push(a);
        if feb == 0 || feb == 15 {
            state.vertices.push(b);
        }
        if fec == 0 || fec == 15 {
            state.vertices.push(c);
        }

        state.edges.push(b, a);
        state.edges.push(c, b);
        state.edges.push(a, c);

        Ok(code)
    }

    /// Code for `b` or `c` on the free path: FIFO reference, next, or free.
    fn vertex_code(state: &mut CodecState, fifo: Option<usize>, v: u32, allow_next: bool) -> u8 {
        match fifo {
            Some(distance) if distance < 14 => distance as u8 + 1,
            _ if allow_next && v == state.next => {
                state.take_next();
                0
            }
            _ => 15,
        }
    }
}

/// Decode a triangle list into `destination`.
///
/// `destination.len()` is the index count and must be a multiple of 3. On
/// error the contents of `destination` are unspecified.
pub fn decode_index_buffer_into<T: IndexType>(
    destination: &mut [T],
    encoded: &[u8],
) -> DecodeResult<()> {
    let index_count = destination.len();
    if index_count % 3 != 0 {
        return Err(DecodeError::InvalidIndexCount(index_count));
    }

    let triangle_count = index_count / 3;

    if encoded.len() < 1 + triangle_count + CODEAUX_TABLE.len() {
        tracing::debug!(len = encoded.len(), "index buffer too short");
        return Err(DecodeError::UnexpectedEof);
    }

    let version = IndexEncodingVersion::from_header(encoded[0])?;

    let codes = &encoded[1..=triangle_count];
    let data_end = encoded.len() - CODEAUX_TABLE.len();
    let codeaux_table = &encoded[data_end..];

    let mut decoder = TriangleDecoder {
        state: CodecState::new(),
        fecmax: version.fecmax(),
        encoded,
        offset: 1 + triangle_count,
    };

    for (&code, triangle) in codes.iter().zip(destination.chunks_exact_mut(3)) {
        // Each triangle reads at most 16 data bytes; the table pads the end.
        if decoder.offset > data_end {
            return Err(DecodeError::UnexpectedEof);
        }

        let [a, b, c] = decoder.decode(code, codeaux_table)?;

        for (slot, value) in triangle.iter_mut().zip([a, b, c]) {
            *slot = T::from_u32(value).ok_or(DecodeError::IndexOverflow(value))?;
        }
    }

    match decoder.offset.cmp(&data_end) {
        std::cmp::Ordering::Equal => Ok(()),
        std::cmp::Ordering::Less => {
            tracing::debug!(extra = data_end - decoder.offset, "index buffer has trailing data");
            Err(DecodeError::TrailingData(data_end - decoder.offset))
        }
        std::cmp::Ordering::Greater => Err(DecodeError::UnexpectedEof),
    }
}

/// Decode a triangle list of `index_count` indices.
pub fn decode_index_buffer<T: IndexType>(encoded: &[u8], index_count: usize) -> DecodeResult<Vec<T>> {
    let mut indices = vec![T::default(); index_count];
    decode_index_buffer_into(&mut indices, encoded)?;
    Ok(indices)
}

struct TriangleDecoder<'a> {
    state: CodecState,
    fecmax: u8,
    encoded: &'a [u8],
    offset: usize,
}

impl TriangleDecoder<'_> {
    fn read_byte(&mut self) -> DecodeResult<u8> {
        let byte = *self
            .encoded
            .get(self.offset)
            .ok_or(DecodeError::UnexpectedEof)?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_free(&mut self) -> DecodeResult<u32> {
        let value = read_varint(self.encoded, &mut self.offset)? as u32;
        let index = self.state.last.wrapping_add_signed(zigzag_decode(value));
        self.state.last = index;
        Ok(index)
    }

    fn decode(&mut self, code: u8, codeaux_table: &[u8]) -> DecodeResult<[u32; 3]> {
        if code < 0xf0 {
            self.decode_edge(code)
        } else if code < 0xfe {
            Ok(self.decode_table(codeaux_table[usize::from(code & 15)]))
        } else {
            let codeaux = self.read_byte()?;
            self.decode_aux(code == 0xfe, codeaux)
        }
    }

    fn decode_edge(&mut self, code: u8) -> DecodeResult<[u32; 3]> {
        let (a, b) = self.state.edges.get(usize::from(code >> 4));
        let fec = code & 15;

        let c = if fec == 0 {
            self.state.take_next()
        } else if fec < self.fecmax {
            self.state.vertices.get(usize::from(fec))
        } else {
            let c = match fec {
                13 => self.state.last.wrapping_sub(1),
                14 => self.state.last.wrapping_add(1),
                _ => self.read_free()?,
            };
            self.state.last = c;
            c
        };

        let state = &mut self.state;
        state.vertices.push_if(c, fec == 0 || fec >= self.fecmax);
        state.edges.push(c, b);
        state.edges.push(a, c);

        Ok([a, b, c])
    }

    /// Short form: `a` is next, `b` and `c` come from the codeaux table.
    fn decode_table(&mut self, codeaux: u8) -> [u32; 3] {
        let feb = codeaux >> 4;
        let fec = codeaux & 15;

        let state = &mut self.state;

        // Table entries are never free indices, so nibble 15 reads the FIFO.
        let a = state.take_next();
        let b = if feb == 0 {
            state.take_next()
        } else {
            state.vertices.get(usize::from(feb) - 1)
        };
        let c = if fec == 0 {
            state.take_next()
        } else {
            state.vertices.get(usize::from(fec) - 1)
        };

        state.vertices.push(a);
        state.vertices.push_if(b, feb == 0);
        state.vertices.push_if(c, fec == 0);

        state.edges.push(b, a);
        state.edges.push(c, b);
        state.edges.push(a, c);

        [a, b, c]
    }

    /// Long form with an explicit aux byte.
    fn decode_aux(&mut self, a_is_next: bool, codeaux: u8) -> DecodeResult<[u32; 3]> {
        let feb = codeaux >> 4;
        let fec = codeaux & 15;

        // A zero aux byte is never written in long form except as a restart.
        if codeaux == 0 {
            self.state.next = 0;
        }

        let mut a = if a_is_next { self.state.take_next() } else { 0 };
        let mut b = self.fifo_or_next(feb);
        let mut c = self.fifo_or_next(fec);

        if !a_is_next {
            a = self.read_free()?;
        }
        if feb == 15 {
            b = self.read_free()?;
        }
        if fec == 15 {
            c = self.read_free()?;
        }

        let state = &mut self.state;
        state.vertices.push(a);
        state.vertices.push_if(b, feb == 0 || feb == 15);
        state.vertices.push_if(c, fec == 0 || fec == 15);

        state.edges.push(b, a);
        state.edges.push(c, b);
        state.edges.push(a, c);

        Ok([a, b, c])
    }

    fn fifo_or_next(&mut self, code: u8) -> u32 {
        match code {
            0 => self.state.take_next(),
            15 => 0,
            _ => self.state.vertices.get(usize::from(code) - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const INDICES: [u32; 12] = [0, 1, 2, 2, 1, 3, 4, 6, 5, 7, 8, 9];

    fn encode(indices: &[u32], version: IndexEncodingVersion) -> Vec<u8> {
        encode_index_buffer(indices, 10, version).unwrap()
    }

    #[test]
    fn test_roundtrip_u16_and_u32() {
        for version in [IndexEncodingVersion::V0, IndexEncodingVersion::V1] {
            let encoded = encode(&INDICES, version);

            let wide: Vec<u32> = decode_index_buffer(&encoded, INDICES.len()).unwrap();
            assert_eq!(wide, INDICES);

            let narrow: Vec<u16> = decode_index_buffer(&encoded, INDICES.len()).unwrap();
            assert!(narrow.iter().map(|&i| u32::from(i)).eq(INDICES));
        }
    }

    #[test]
    fn test_empty() {
        let encoded = encode(&[], IndexEncodingVersion::V1);
        assert_eq!(encoded.len(), 1 + CODEAUX_TABLE.len());

        let decoded: Vec<u32> = decode_index_buffer(&encoded, 0).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_shared_edge_costs_one_byte() {
        // A quad: the second triangle replays an edge and uses next.
        let encoded = encode(&[0, 1, 2, 2, 1, 3], IndexEncodingVersion::V1);
        assert_eq!(encoded.len(), 1 + 2 + CODEAUX_TABLE.len());
        assert_eq!(&encoded[1..3], &[0xf0, 0x10]);
    }

    #[test]
    fn test_triangle_order_preserved() {
        let cases: [[u32; 6]; 4] = [
            // Leading vertex reused, the other two are next.
            [0, 5, 6, 0, 1, 2],
            // Shares edge (2, 1) only through its last and first vertex.
            [0, 1, 2, 1, 3, 2],
            // Shares edge (0, 2) only through its second and third vertex.
            [0, 1, 2, 3, 0, 2],
            // Next vertices in second and third position.
            [0, 1, 2, 5, 3, 4],
        ];

        for indices in cases {
            for version in [IndexEncodingVersion::V0, IndexEncodingVersion::V1] {
                let encoded = encode(&indices, version);
                let decoded: Vec<u32> = decode_index_buffer(&encoded, indices.len()).unwrap();
                assert_eq!(decoded, indices, "{version:?}");
            }
        }
    }

    #[test]
    fn test_long_form_codes_v0() {
        let indices = [0u16, 5, 6, 0, 1, 2, 7, 3, 9];
        let encoded = encode_index_buffer(&indices, 10, IndexEncodingVersion::V0).unwrap();

        // Neither aux byte is in the table; the second triangle starts with a free index.
        assert_eq!(&encoded[1..3], &[0xfe, 0xff]);

        let decoded: Vec<u16> = decode_index_buffer(&encoded, indices.len()).unwrap();
        assert_eq!(decoded, indices);

        for len in 0..encoded.len() {
            let result: DecodeResult<Vec<u16>> = decode_index_buffer(&encoded[..len], indices.len());
            assert!(result.is_err(), "prefix of {len} bytes decoded");
        }

        let mut extended = encoded.clone();
        extended.push(0);
        let result: DecodeResult<Vec<u16>> = decode_index_buffer(&extended, indices.len());
        assert_eq!(result, Err(DecodeError::TrailingData(1)));
    }

    #[test]
    fn test_restart_code() {
        let indices = [0, 1, 2, 0, 1, 2];
        let encoded = encode(&indices, IndexEncodingVersion::V1);
        let decoded: Vec<u32> = decode_index_buffer(&encoded, indices.len()).unwrap();
        assert_eq!(decoded, indices);

        // Two concatenated meshes that both start at vertex 0.
        let indices = [0, 1, 2, 2, 1, 3, 0, 1, 2, 2, 3, 4];
        for version in [IndexEncodingVersion::V0, IndexEncodingVersion::V1] {
            let encoded = encode(&indices, version);
            let decoded: Vec<u32> = decode_index_buffer(&encoded, indices.len()).unwrap();
            assert_eq!(decoded, indices);
        }
    }

    #[test]
    fn test_strip_deltas_v1() {
        // Every third vertex is one past the previous free index.
        let indices = [10, 20, 30, 30, 20, 31, 31, 20, 32, 32, 20, 33];
        let encoded = encode(&indices, IndexEncodingVersion::V1);
        let decoded: Vec<u32> = decode_index_buffer(&encoded, indices.len()).unwrap();
        assert_eq!(decoded, indices);

        let v0 = encode(&indices, IndexEncodingVersion::V0);
        assert!(encoded.len() < v0.len());
    }

    #[test]
    fn test_rejects_truncation() {
        let encoded = encode(&INDICES, IndexEncodingVersion::V1);

        for len in 0..encoded.len() {
            let result: DecodeResult<Vec<u32>> = decode_index_buffer(&encoded[..len], INDICES.len());
            assert!(result.is_err(), "prefix of {len} bytes decoded");
        }
    }

    #[test]
    fn test_rejects_extra_byte() {
        let mut encoded = encode(&INDICES, IndexEncodingVersion::V1);
        encoded.push(0);

        let result: DecodeResult<Vec<u32>> = decode_index_buffer(&encoded, INDICES.len());
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut encoded = encode(&INDICES, IndexEncodingVersion::V1);

        encoded[0] = 0;
        let result: DecodeResult<Vec<u32>> = decode_index_buffer(&encoded, INDICES.len());
        assert_eq!(result, Err(DecodeError::InvalidHeader(0)));

        encoded[0] = INDEX_HEADER | 7;
        let result: DecodeResult<Vec<u32>> = decode_index_buffer(&encoded, INDICES.len());
        assert_eq!(result, Err(DecodeError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_rejects_bad_count() {
        let encoded = encode(&INDICES, IndexEncodingVersion::V1);
        let result: DecodeResult<Vec<u32>> = decode_index_buffer(&encoded, 4);
        assert_eq!(result, Err(DecodeError::InvalidIndexCount(4)));

        assert_eq!(
            encode_index_buffer(&[0u32, 1], 2, IndexEncodingVersion::V1),
            Err(EncodeError::InvalidIndexCount(2))
        );
    }

    #[test]
    fn test_u16_overflow() {
        let indices = [0u32, 1, 70_000];
        let encoded = encode_index_buffer(&indices, 70_001, IndexEncodingVersion::V1).unwrap();

        let result: DecodeResult<Vec<u16>> = decode_index_buffer(&encoded, 3);
        assert_eq!(result, Err(DecodeError::IndexOverflow(70_000)));
    }

    #[test]
    fn test_encode_capacity() {
        let bound = encode_index_buffer_bound(INDICES.len(), 10);
        let encoded = encode(&INDICES, IndexEncodingVersion::V1);
        assert!(encoded.len() <= bound);

        for capacity in 0..=encoded.len() {
            let mut buffer = vec![0u8; capacity];
            let result = encode_index_buffer_into(&mut buffer, &INDICES, IndexEncodingVersion::V1);

            if capacity == encoded.len() {
                assert_eq!(result, Ok(encoded.len()));
                assert_eq!(buffer, encoded);
            } else {
                assert_eq!(result, Err(EncodeError::BufferTooSmall));
            }
        }
    }

    #[test]
    fn test_garbage_never_panics() {
        // Every code path, fed arbitrary bytes behind a valid header.
        let mut stream = vec![INDEX_HEADER | 1];
        stream.extend((0..=255u8).rev());
        stream.extend([0xff; 16]);

        for count in [3, 30, 90, 240] {
            let _: DecodeResult<Vec<u32>> = decode_index_buffer(&stream, count);
        }
    }

    /// Grid mesh in scanline order.
    fn grid(width: u32, height: u32) -> Vec<u32> {
        let mut indices = Vec::new();
        for y in 0..height - 1 {
            for x in 0..width - 1 {
                let i = y * width + x;
                indices.extend([i, i + width, i + 1, i + 1, i + width, i + width + 1]);
            }
        }
        indices
    }

    #[test]
    fn test_grid_compresses() {
        let indices = grid(32, 32);
        let triangle_count = indices.len() / 3;

        // A raw u32 triangle is 12 bytes.
        let encoded = encode_index_buffer(&indices, 32 * 32, IndexEncodingVersion::V1).unwrap();
        assert!(encoded.len() < triangle_count * 5 / 2, "{} bytes", encoded.len());
    }

    fn triangle_list() -> impl Strategy<Value = (Vec<u32>, usize)> {
        (1usize..2000).prop_flat_map(|vertex_count| {
            let index = 0..vertex_count as u32;
            (
                prop::collection::vec([index.clone(), index.clone(), index], 0..200)
                    .prop_map(|triangles| triangles.concat()),
                Just(vertex_count),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip((indices, vertex_count) in triangle_list(), v1 in any::<bool>()) {
            let version = if v1 { IndexEncodingVersion::V1 } else { IndexEncodingVersion::V0 };
            let encoded = encode_index_buffer(&indices, vertex_count, version).unwrap();
            prop_assert!(encoded.len() <= encode_index_buffer_bound(indices.len(), vertex_count));

            let decoded: Vec<u32> = decode_index_buffer(&encoded, indices.len()).unwrap();
            prop_assert_eq!(decoded, indices);
        }

        #[test]
        fn prop_roundtrip_grid(width in 2u32..40, height in 2u32..40) {
            let indices = grid(width, height);
            let vertex_count = (width * height) as usize;

            let encoded = encode_index_buffer(&indices, vertex_count, IndexEncodingVersion::V1).unwrap();
            let decoded: Vec<u16> = decode_index_buffer(&encoded, indices.len()).unwrap();
            prop_assert!(decoded.iter().map(|&i| u32::from(i)).eq(indices.iter().copied()));
        }
    }
}
