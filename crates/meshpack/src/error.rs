//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors that can occur while decoding an encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The header byte does not carry the expected stream tag.
    #[error("invalid header byte {0:#04x}")]
    InvalidHeader(u8),

    /// The stream tag is correct but the version is unknown.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// The stream ended before a codeword or body was complete.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// The stream has bytes left over after the expected body.
    #[error("{0} trailing bytes after encoded data")]
    TrailingData(usize),

    /// A decoded index does not fit the destination index type.
    #[error("decoded index {0} does not fit the destination index type")]
    IndexOverflow(u32),

    /// The stream was encoded with a different vertex stride.
    #[error("vertex stride mismatch: expected {expected}, stream has {found}")]
    StrideMismatch { expected: usize, found: usize },

    /// The requested vertex size is not a multiple of 4 in `4..=256`.
    #[error("invalid vertex size {0}")]
    InvalidVertexSize(usize),

    /// The requested index count is not a multiple of 3.
    #[error("index count {0} is not a multiple of 3")]
    InvalidIndexCount(usize),

    /// The destination length is not a multiple of the vertex size.
    #[error("destination length {len} is not a multiple of vertex size {stride}")]
    DestinationMisaligned { len: usize, stride: usize },

    /// `count * stride` does not fit in memory.
    #[error("{count} vertices of {stride} bytes overflow the address space")]
    VertexCountOverflow { count: usize, stride: usize },
}

/// Errors that can occur while encoding a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The output buffer cannot hold the encoded stream.
    #[error("output buffer too small")]
    BufferTooSmall,

    /// The index count is not a multiple of 3.
    #[error("index count {0} is not a multiple of 3")]
    InvalidIndexCount(usize),

    /// The vertex size is not a multiple of 4 in `4..=256`.
    #[error("invalid vertex size {0}")]
    InvalidVertexSize(usize),

    /// The vertex data length is not a multiple of the stride.
    #[error("vertex data length {len} is not a multiple of stride {stride}")]
    VertexDataMisaligned { len: usize, stride: usize },
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
