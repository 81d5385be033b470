//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

/// Extract one directory of a tiled JPEG TIFF into per-tile JPEG files.
///
/// Each tile of the chosen directory is written to the output directory as
/// `<row>_<column>.jpeg`, with the directory's shared JPEG tables spliced in
/// so every file decodes standalone.
#[derive(Debug, Parser)]
#[command(name = "tifftiles", version, about)]
pub struct Config {
    /// Input TIFF file (classic or BigTIFF)
    pub input: PathBuf,

    /// Zero-based directory index to extract
    pub directory: usize,

    /// Output directory, created if it does not exist
    pub output: PathBuf,

    /// Enable debug logging (per-tile detail)
    #[arg(short, long)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
