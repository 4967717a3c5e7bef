//! Reference streams produced by the version 0 encoders.
//!
//! These pin the wire format: any change to the encoders that alters a
//! version 0 stream breaks compatibility with existing data.

use bytemuck::{Pod, Zeroable};
use meshpack::{
    DecodeError, IndexEncodingVersion, VertexEncodingVersion, decode_index_buffer, decode_vertex_buffer,
    decode_vertices, encode_index_buffer, encode_vertices,
};

const INDEX_BUFFER: [u32; 12] = [0, 1, 2, 2, 1, 3, 4, 6, 5, 7, 8, 9];

const INDEX_DATA_V0: [u8; 27] = [
    0xe0, 0xf0, 0x10, 0xfe, 0xff, 0xf0, 0x0c, 0xff, 0x02, 0x02, 0x02, 0x00, 0x76, 0x87, 0x56, 0x67,
    0x78, 0xa9, 0x86, 0x65, 0x89, 0x68, 0x98, 0x01, 0x69, 0x00, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct PackedVertex {
    px: u16,
    py: u16,
    pz: u16,
    nu: u8,
    nv: u8,
    tx: u16,
    ty: u16,
}

const _: () = assert!(std::mem::size_of::<PackedVertex>() == 12);

const fn vertex(px: u16, py: u16, tx: u16, ty: u16) -> PackedVertex {
    PackedVertex {
        px,
        py,
        pz: 0,
        nu: 0,
        nv: 0,
        tx,
        ty,
    }
}

const VERTEX_BUFFER: [PackedVertex; 4] = [
    vertex(0, 0, 0, 0),
    vertex(300, 0, 500, 0),
    vertex(0, 300, 0, 500),
    vertex(300, 300, 500, 500),
];

const VERTEX_DATA_V0: [u8; 85] = [
    0xa0, 0x01, 0x3f, 0x00, 0x00, 0x00, 0x58, 0x57, 0x58, 0x01, 0x26, 0x00, 0x00, 0x00, 0x01,
    0x0c, 0x00, 0x00, 0x00, 0x58, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
    0x3f, 0x00, 0x00, 0x00, 0x17, 0x18, 0x17, 0x01, 0x26, 0x00, 0x00, 0x00, 0x01, 0x0c, 0x00,
    0x00, 0x00, 0x17, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[test]
fn test_decode_index_v0() {
    let decoded: Vec<u32> = decode_index_buffer(&INDEX_DATA_V0, INDEX_BUFFER.len()).unwrap();
    assert_eq!(decoded, INDEX_BUFFER);

    let decoded: Vec<u16> = decode_index_buffer(&INDEX_DATA_V0, INDEX_BUFFER.len()).unwrap();
    assert!(decoded.iter().map(|&i| u32::from(i)).eq(INDEX_BUFFER));
}

#[test]
fn test_encode_index_v0() {
    let encoded = encode_index_buffer(&INDEX_BUFFER, 10, IndexEncodingVersion::V0).unwrap();
    assert_eq!(encoded, INDEX_DATA_V0);
}

#[test]
fn test_index_v1_roundtrip() {
    let encoded = encode_index_buffer(&INDEX_BUFFER, 10, IndexEncodingVersion::V1).unwrap();
    assert_eq!(encoded[0], 0xe1);

    let decoded: Vec<u32> = decode_index_buffer(&encoded, INDEX_BUFFER.len()).unwrap();
    assert_eq!(decoded, INDEX_BUFFER);
}

#[test]
fn test_index_v0_prefixes_rejected() {
    for len in 0..INDEX_DATA_V0.len() {
        let result: Result<Vec<u32>, _> = decode_index_buffer(&INDEX_DATA_V0[..len], INDEX_BUFFER.len());
        assert!(result.is_err(), "prefix of {len} bytes decoded");
    }
}

#[test]
fn test_decode_vertex_v0() {
    let decoded: Vec<PackedVertex> = decode_vertices(&VERTEX_DATA_V0, VERTEX_BUFFER.len()).unwrap();
    assert_eq!(decoded, VERTEX_BUFFER);
}

#[test]
fn test_encode_vertex_v0() {
    let encoded = encode_vertices(&VERTEX_BUFFER, VertexEncodingVersion::V0).unwrap();
    assert_eq!(encoded, VERTEX_DATA_V0);
}

#[test]
fn test_vertex_v1_adds_stride() {
    let encoded = encode_vertices(&VERTEX_BUFFER, VertexEncodingVersion::V1).unwrap();

    assert_eq!(encoded.len(), VERTEX_DATA_V0.len() + 1);
    assert_eq!(&encoded[..2], &[0xa1, 3]);
    assert_eq!(&encoded[2..], &VERTEX_DATA_V0[1..]);
}

#[test]
fn test_vertex_v0_trailing_byte() {
    let mut data = VERTEX_DATA_V0.to_vec();
    data.push(0);

    assert_eq!(
        decode_vertex_buffer(&data, VERTEX_BUFFER.len(), 12),
        Err(DecodeError::TrailingData(1))
    );
}
