//! Vertex buffer commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use meshpack::{decode_vertex_buffer, encode_vertex_buffer};

use crate::io::{self, FormatVersion};

/// Arguments for the encode-vertices command
#[derive(Args)]
pub struct EncodeVerticesArgs {
    /// Raw vertex file
    pub input: PathBuf,

    /// Encoded output file
    pub output: PathBuf,

    /// Size of one vertex in bytes (multiple of 4, at most 256)
    #[arg(long)]
    pub stride: usize,

    /// Encoder format version
    #[arg(long, value_enum, default_value = "1")]
    pub version: FormatVersion,
}

/// Arguments for the decode-vertices command
#[derive(Args)]
pub struct DecodeVerticesArgs {
    /// Encoded input file
    pub input: PathBuf,

    /// Raw vertex output file
    pub output: PathBuf,

    /// Number of vertices in the stream
    #[arg(long)]
    pub count: usize,

    /// Size of one vertex in bytes
    #[arg(long)]
    pub stride: usize,
}

/// Execute the encode-vertices command
pub fn encode(args: EncodeVerticesArgs) -> Result<()> {
    let raw = io::read_file(&args.input)?;

    let encoded = encode_vertex_buffer(&raw, args.stride, args.version.into())
        .with_context(|| format!("Failed to encode {}", args.input.display()))?;

    io::write_file(&args.output, &encoded)?;

    tracing::info!(
        vertices = raw.len() / args.stride,
        stride = args.stride,
        bytes = encoded.len(),
        "encoded {:.1}% of raw size",
        io::ratio(encoded.len(), raw.len())
    );

    Ok(())
}

/// Execute the decode-vertices command
pub fn decode(args: DecodeVerticesArgs) -> Result<()> {
    let encoded = io::read_file(&args.input)?;

    let raw = decode_vertex_buffer(&encoded, args.count, args.stride)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    io::write_file(&args.output, &raw)?;

    tracing::info!(vertices = args.count, bytes = encoded.len(), "decoded vertices");

    Ok(())
}
