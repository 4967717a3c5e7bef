//! Cluster bounds command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use meshpack::{Bounds, compute_cluster_bounds};

use crate::io::{self, IndexWidth};

/// Arguments for the bounds command
#[derive(Args)]
pub struct BoundsArgs {
    /// Raw little-endian triangle index file
    #[arg(long)]
    pub indices: PathBuf,

    /// Raw little-endian f32 vertex file, position first in every vertex
    #[arg(long)]
    pub positions: PathBuf,

    /// Distance between vertices in bytes
    #[arg(long, default_value_t = 12)]
    pub stride: usize,

    /// Index size in bits
    #[arg(long, value_enum, default_value = "32")]
    pub width: IndexWidth,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Execute the bounds command
pub fn execute(args: BoundsArgs) -> Result<()> {
    println!("{}", render(&compute(&args)?, args.json)?);
    Ok(())
}

fn compute(args: &BoundsArgs) -> Result<Bounds> {
    if args.stride % 4 != 0 || args.stride < 12 {
        bail!("stride must be a multiple of 4 and at least 12, got {}", args.stride);
    }

    let indices = io::parse_indices(&io::read_file(&args.indices)?, args.width)?;
    let positions = io::parse_floats(&io::read_file(&args.positions)?)?;

    if indices.len() % 3 != 0 {
        bail!("{} indices do not form a triangle list", indices.len());
    }

    tracing::info!(
        triangles = indices.len() / 3,
        vertices = positions.len() * 4 / args.stride,
        "computing cluster bounds"
    );

    Ok(compute_cluster_bounds(&indices, &positions, args.stride))
}

fn render(bounds: &Bounds, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string_pretty(bounds).context("Failed to serialize bounds");
    }

    Ok(format!(
        "center:      {}\nradius:      {}\ncone apex:   {}\ncone axis:   {}\ncone cutoff: {}\naxis s8:     {:?}\ncutoff s8:   {}",
        bounds.center,
        bounds.radius,
        bounds.cone_apex,
        bounds.cone_axis,
        bounds.cone_cutoff,
        bounds.cone_axis_s8,
        bounds.cone_cutoff_s8
    ))
}
