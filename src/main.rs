use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tifftiles::config::Config;
use tifftiles::error::ExtractError;
use tifftiles::extract::{ExtractReport, TileExtractor};
use tifftiles::io::{FileRangeReader, RangeReader};
use tifftiles::plan::DirectoryPlan;

// Exit codes; clap itself exits with 2 on usage errors
const EXIT_OUTPUT_DIR: u8 = 3;
const EXIT_INPUT_OPEN: u8 = 4;
const EXIT_INVALID_DIRECTORY: u8 = 5;
const EXIT_UNSUPPORTED_COMPRESSION: u8 = 6;
const EXIT_MISSING_TILE_LAYOUT: u8 = 7;
const EXIT_MISSING_BYTE_COUNTS: u8 = 8;
const EXIT_TILE_COUNT_MISMATCH: u8 = 9;
const EXIT_TILE_READ: u8 = 10;
const EXIT_ALLOCATION: u8 = 11;

fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    if let Err(e) = fs::create_dir_all(&config.output) {
        error!(path = %config.output.display(), error = %e, "cannot create output directory");
        return ExitCode::from(EXIT_OUTPUT_DIR);
    }

    let reader = match FileRangeReader::open(&config.input) {
        Ok(reader) => reader,
        Err(e) => {
            error!(error = %e, "cannot open input file");
            return ExitCode::from(EXIT_INPUT_OPEN);
        }
    };

    match run(&reader, &config) {
        Ok(report) => {
            info!(
                written = report.written,
                skipped = report.skipped,
                "extraction complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "extraction failed");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(reader: &FileRangeReader, config: &Config) -> Result<ExtractReport, ExtractError> {
    let plan = DirectoryPlan::build(reader, config.directory)?;

    info!(
        input = reader.identifier(),
        directory = plan.directory_index,
        image_width = plan.image_width,
        image_height = plan.image_height,
        tile_width = plan.tile_width,
        tile_height = plan.tile_height,
        tiles_across = plan.tiles_across,
        tiles_down = plan.tiles_down,
        tile_count = plan.tile_count(),
        "directory layout"
    );
    info!(
        bits_per_sample = plan.bits_per_sample,
        samples_per_pixel = plan.samples_per_pixel,
        compression = plan.compression.name(),
        photometric = plan.photometric.map(|p| p.name()).unwrap_or("unknown"),
        jpeg_tables_bytes = plan.jpeg_tables.as_ref().map(|t| t.len()).unwrap_or(0),
        "directory format"
    );

    let mut extractor = TileExtractor::new(reader, &plan);
    extractor.run(&config.output)
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "tifftiles=debug"
    } else {
        "tifftiles=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn exit_code(err: &ExtractError) -> u8 {
    match err {
        ExtractError::InvalidDirectory { .. } => EXIT_INVALID_DIRECTORY,
        ExtractError::UnsupportedCompression(_) => EXIT_UNSUPPORTED_COMPRESSION,
        ExtractError::MissingTileLayout => EXIT_MISSING_TILE_LAYOUT,
        ExtractError::MissingByteCounts => EXIT_MISSING_BYTE_COUNTS,
        ExtractError::TileCountMismatch { .. } => EXIT_TILE_COUNT_MISMATCH,
        ExtractError::TileRead { .. } => EXIT_TILE_READ,
        ExtractError::Allocation { .. } => EXIT_ALLOCATION,
        ExtractError::Tiff(_) | ExtractError::Jpeg(_) => 1,
    }
}
