//! Index element types accepted by the index codecs.

/// An unsigned integer type usable as a mesh index.
///
/// Encoders widen every index to `u32`; decoders narrow back and reject
/// values the destination type cannot represent.
pub trait IndexType: Copy + Default + Eq + std::fmt::Debug {
    /// Widen to `u32`.
    fn to_u32(self) -> u32;

    /// Narrow from `u32`, returning `None` when the value does not fit.
    fn from_u32(value: u32) -> Option<Self>;
}

impl IndexType for u16 {
    #[inline]
    fn to_u32(self) -> u32 {
        u32::from(self)
    }

    #[inline]
    fn from_u32(value: u32) -> Option<Self> {
        u16::try_from(value).ok()
    }
}

impl IndexType for u32 {
    #[inline]
    fn to_u32(self) -> u32 {
        self
    }

    #[inline]
    fn from_u32(value: u32) -> Option<Self> {
        Some(value)
    }
}

/// Number of varint bytes needed for a zigzag delta between indices below
/// `vertex_count`, plus `extra_bits` of payload.
pub(crate) fn index_varint_groups(vertex_count: usize, extra_bits: u32) -> usize {
    let mut vertex_bits = 1;

    while vertex_bits < 32 && vertex_count > 1usize << vertex_bits {
        vertex_bits += 1;
    }

    ((vertex_bits + extra_bits + 6) / 7) as usize
}
