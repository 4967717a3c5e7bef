//! Compact encodings for triangle mesh buffers.
//!
//! This crate provides pure synchronous functions for compressing index and
//! vertex buffers into small byte streams and restoring them exactly, plus
//! culling bounds for triangle clusters. The streams are designed to be
//! further compressed by a general-purpose compressor.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives, no global state
//! - **Caller-owned buffers**: Every encoder and decoder has an `_into`
//!   variant that works on caller slices and never writes past them
//! - **Untrusted input**: Decoders validate every byte they read and reject
//!   truncated, oversized or mislabeled streams
//!
//! # Key functions
//!
//! - [`encode_index_buffer`] / [`decode_index_buffer`]: Triangle lists
//! - [`encode_index_sequence`] / [`decode_index_sequence`]: Strips, lists and
//!   other index sequences
//! - [`encode_vertex_buffer`] / [`decode_vertex_buffer`]: Fixed-stride vertex
//!   records
//! - [`compute_cluster_bounds`]: Bounding sphere and normal cone

mod error;

pub mod bounds;
pub mod index;
pub mod indices;
pub mod sequence;
pub mod varint;
pub mod vertices;

pub use bounds::{Bounds, compute_cluster_bounds, compute_meshlet_bounds, quantize_snorm};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use index::IndexType;
pub use indices::{
    IndexEncodingVersion, decode_index_buffer, decode_index_buffer_into, encode_index_buffer,
    encode_index_buffer_bound, encode_index_buffer_into,
};
pub use sequence::{
    decode_index_sequence, decode_index_sequence_into, encode_index_sequence,
    encode_index_sequence_bound, encode_index_sequence_into,
};
pub use varint::{read_varint, write_varint, zigzag_decode, zigzag_encode};
pub use vertices::{
    MAX_VERTEX_SIZE, VertexEncodingVersion, decode_vertex_buffer, decode_vertex_buffer_into,
    decode_vertices, encode_vertex_buffer, encode_vertex_buffer_bound, encode_vertex_buffer_into,
    encode_vertices,
};
