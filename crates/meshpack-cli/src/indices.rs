//! Index buffer commands.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use meshpack::{
    DecodeResult, IndexType, decode_index_buffer, decode_index_sequence, encode_index_buffer, encode_index_sequence,
};

use crate::io::{self, FormatVersion, IndexWidth};

/// Arguments for the encode-indices command
#[derive(Args)]
pub struct EncodeIndicesArgs {
    /// Raw little-endian index file
    pub input: PathBuf,

    /// Encoded output file
    pub output: PathBuf,

    /// Index size in bits
    #[arg(long, value_enum, default_value = "32")]
    pub width: IndexWidth,

    /// Encoder format version
    #[arg(long, value_enum, default_value = "1")]
    pub version: FormatVersion,

    /// Treat the input as an arbitrary index sequence instead of a triangle list
    #[arg(long)]
    pub sequence: bool,
}

/// Arguments for the decode-indices command
#[derive(Args)]
pub struct DecodeIndicesArgs {
    /// Encoded input file
    pub input: PathBuf,

    /// Raw little-endian index output file
    pub output: PathBuf,

    /// Number of indices in the stream
    #[arg(long)]
    pub count: usize,

    /// Index size in bits
    #[arg(long, value_enum, default_value = "32")]
    pub width: IndexWidth,

    /// Decode an index sequence instead of a triangle list
    #[arg(long)]
    pub sequence: bool,
}

/// Execute the encode-indices command
pub fn encode(args: EncodeIndicesArgs) -> Result<()> {
    let raw = io::read_file(&args.input)?;
    let indices = io::parse_indices(&raw, args.width)?;

    if !args.sequence && indices.len() % 3 != 0 {
        bail!(
            "{} indices do not form a triangle list; pass --sequence for other index data",
            indices.len()
        );
    }

    let vertex_count = indices.iter().max().map_or(0, |&max| max as usize + 1);

    let encoded = if args.sequence {
        encode_index_sequence(&indices, vertex_count, args.version.into())
    } else {
        encode_index_buffer(&indices, vertex_count, args.version.into())
    }
    .context("Failed to encode indices")?;

    io::write_file(&args.output, &encoded)?;

    tracing::info!(
        indices = indices.len(),
        vertices = vertex_count,
        bytes = encoded.len(),
        "encoded {:.1}% of raw size",
        io::ratio(encoded.len(), raw.len())
    );

    Ok(())
}

/// Execute the decode-indices command
pub fn decode(args: DecodeIndicesArgs) -> Result<()> {
    let encoded = io::read_file(&args.input)?;

    let indices = match args.width {
        IndexWidth::U16 => decode_widened::<u16>(&encoded, args.count, args.sequence),
        IndexWidth::U32 => decode_widened::<u32>(&encoded, args.count, args.sequence),
    }
    .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    io::write_file(&args.output, &io::indices_to_bytes(&indices, args.width))?;

    tracing::info!(indices = args.count, bytes = encoded.len(), "decoded indices");

    Ok(())
}

/// Decode into `T` so out-of-range indices are rejected, then widen.
fn decode_widened<T: IndexType>(encoded: &[u8], count: usize, sequence: bool) -> DecodeResult<Vec<u32>> {
    let indices: Vec<T> = if sequence {
        decode_index_sequence(encoded, count)?
    } else {
        decode_index_buffer(encoded, count)?
    };

    Ok(indices.into_iter().map(IndexType::to_u32).collect())
}
