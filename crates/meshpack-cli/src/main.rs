//! meshpack - Encode and decode mesh buffers from the command line
//!
//! # Commands
//!
//! - `meshpack encode-indices` - Compress a raw index buffer
//! - `meshpack decode-indices` - Restore a raw index buffer
//! - `meshpack encode-vertices` - Compress a raw vertex buffer
//! - `meshpack decode-vertices` - Restore a raw vertex buffer
//! - `meshpack bounds` - Print culling bounds for a cluster
//!
//! All raw buffers are little-endian arrays without any header.
//!
//! # Usage
//!
//! ```bash
//! # 32-bit triangle list, default format version
//! meshpack encode-indices mesh.idx mesh.idx.mp
//! meshpack decode-indices mesh.idx.mp mesh.idx --count 36
//!
//! # 16-byte vertices
//! meshpack encode-vertices mesh.vtx mesh.vtx.mp --stride 16
//!
//! # Bounds as JSON
//! meshpack bounds --indices mesh.idx --positions mesh.vtx --stride 16 --json
//! ```
//!
//! Set `RUST_LOG=debug` to see why a stream was rejected.

mod bounds;
mod indices;
mod io;
mod vertices;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// meshpack - Encode and decode mesh buffers
#[derive(Parser)]
#[command(name = "meshpack")]
#[command(about = "Encode and decode mesh index and vertex buffers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a raw index buffer
    EncodeIndices(indices::EncodeIndicesArgs),

    /// Restore a raw index buffer
    DecodeIndices(indices::DecodeIndicesArgs),

    /// Compress a raw vertex buffer
    EncodeVertices(vertices::EncodeVerticesArgs),

    /// Restore a raw vertex buffer
    DecodeVertices(vertices::DecodeVerticesArgs),

    /// Print the bounding sphere and normal cone of a cluster
    Bounds(bounds::BoundsArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EncodeIndices(args) => indices::encode(args),
        Commands::DecodeIndices(args) => indices::decode(args),
        Commands::EncodeVertices(args) => vertices::encode(args),
        Commands::DecodeVertices(args) => vertices::decode(args),
        Commands::Bounds(args) => bounds::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode_indices() {
        let cli = Cli::try_parse_from([
            "meshpack",
            "encode-indices",
            "in.bin",
            "out.bin",
            "--width",
            "16",
            "--version",
            "0",
            "--sequence",
        ])
        .unwrap();

        let Commands::EncodeIndices(args) = cli.command else {
            panic!("wrong subcommand");
        };
        assert_eq!(args.width, io::IndexWidth::U16);
        assert_eq!(args.version, io::FormatVersion::V0);
        assert!(args.sequence);
    }

    #[test]
    fn test_decode_requires_count() {
        assert!(Cli::try_parse_from(["meshpack", "decode-vertices", "a", "b", "--stride", "8"]).is_err());
    }
}
