//! Raw buffer files and shared argument types.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use meshpack::{IndexEncodingVersion, VertexEncodingVersion};

/// Element size of a raw index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexWidth {
    #[value(name = "16")]
    U16,
    #[value(name = "32")]
    U32,
}

impl IndexWidth {
    pub fn bytes(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Encoder format version selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatVersion {
    #[value(name = "0")]
    V0,
    #[value(name = "1")]
    V1,
}

impl From<FormatVersion> for IndexEncodingVersion {
    fn from(version: FormatVersion) -> Self {
        match version {
            FormatVersion::V0 => Self::V0,
            FormatVersion::V1 => Self::V1,
        }
    }
}

impl From<FormatVersion> for VertexEncodingVersion {
    fn from(version: FormatVersion) -> Self {
        match version {
            FormatVersion::V0 => Self::V0,
            FormatVersion::V1 => Self::V1,
        }
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Parse little-endian indices of the given width, widened to `u32`.
pub fn parse_indices(bytes: &[u8], width: IndexWidth) -> Result<Vec<u32>> {
    if bytes.len() % width.bytes() != 0 {
        bail!(
            "index file is {} bytes, not a multiple of {}",
            bytes.len(),
            width.bytes()
        );
    }

    Ok(match width {
        IndexWidth::U16 => bytemuck::pod_collect_to_vec::<u8, u16>(bytes)
            .into_iter()
            .map(|i| u32::from(u16::from_le(i)))
            .collect(),
        IndexWidth::U32 => bytemuck::pod_collect_to_vec::<u8, u32>(bytes)
            .into_iter()
            .map(u32::from_le)
            .collect(),
    })
}

/// Serialize indices as little-endian values of the given width.
///
/// Callers decode into the narrow type first, so `U16` never truncates.
pub fn indices_to_bytes(indices: &[u32], width: IndexWidth) -> Vec<u8> {
    match width {
        IndexWidth::U16 => {
            let narrow: Vec<u16> = indices.iter().map(|&i| (i as u16).to_le()).collect();
            bytemuck::cast_slice(&narrow).to_vec()
        }
        IndexWidth::U32 => {
            let wide: Vec<u32> = indices.iter().map(|&i| i.to_le()).collect();
            bytemuck::cast_slice(&wide).to_vec()
        }
    }
}

/// Parse little-endian `f32` values.
pub fn parse_floats(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        bail!("position file is {} bytes, not a multiple of 4", bytes.len());
    }

    Ok(bytemuck::pod_collect_to_vec::<u8, u32>(bytes)
        .into_iter()
        .map(|bits| f32::from_bits(u32::from_le(bits)))
        .collect())
}

/// Percentage of `encoded` relative to `raw`, for log output.
pub fn ratio(encoded: usize, raw: usize) -> f64 {
    if raw == 0 {
        0.0
    } else {
        encoded as f64 * 100.0 / raw as f64
    }
}
