//! The tile extraction loop.
//!
//! Walks the tile grid of a prepared [`DirectoryPlan`] in row-major order
//! and writes each tile to the output directory as a standalone JPEG named
//! `<row>_<column>.jpeg`. Tiles are processed strictly one at a time through
//! a single reused scratch buffer, so peak memory stays at one tile
//! regardless of grid size.
//!
//! A failed tile read or a malformed JPEG segment aborts the run; a failed
//! file write only skips that tile, so one unwritable path does not throw
//! away the rest of an otherwise good extraction.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::format::jpeg;
use crate::io::RangeReader;
use crate::plan::DirectoryPlan;

/// Tiles between progress log lines
const PROGRESS_INTERVAL: usize = 100;

// =============================================================================
// ExtractReport
// =============================================================================

/// Outcome of an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Tiles written to the output directory
    pub written: usize,

    /// Tiles skipped because their output file could not be written
    pub skipped: usize,
}

// =============================================================================
// TileExtractor
// =============================================================================

/// Extracts every tile of one directory to standalone JPEG files.
pub struct TileExtractor<'a, R: RangeReader> {
    reader: &'a R,
    plan: &'a DirectoryPlan,

    /// Reused tile buffer; grows to the largest tile seen, never shrinks
    scratch: Vec<u8>,
}

impl<'a, R: RangeReader> TileExtractor<'a, R> {
    /// Create an extractor over a prepared plan.
    pub fn new(reader: &'a R, plan: &'a DirectoryPlan) -> Self {
        Self {
            reader,
            plan,
            scratch: Vec::new(),
        }
    }

    /// Extract all tiles into `output_dir`.
    ///
    /// The directory must already exist. Existing files with matching names
    /// are overwritten, which makes reruns idempotent.
    ///
    /// # Errors
    /// - [`ExtractError::TileRead`] when a tile's bytes cannot be read
    /// - [`ExtractError::Allocation`] when the scratch buffer cannot grow
    /// - [`ExtractError::Jpeg`] when an RGB tile's SOF0/SOS segments do not
    ///   have the shape the component-ID patch expects
    pub fn run(&mut self, output_dir: &Path) -> Result<ExtractReport, ExtractError> {
        let total = self.plan.tile_count();
        let patch_rgb = self.plan.is_rgb();
        let mut report = ExtractReport::default();

        for index in 0..total {
            if index % PROGRESS_INTERVAL == 0 {
                info!(tile = index, total, "extracting tiles");
            }

            let offset = self.plan.tile_offsets[index];
            let byte_count = self.plan.tile_byte_counts[index] as usize;

            self.ensure_scratch_len(byte_count)?;
            let tile = &mut self.scratch[..byte_count];

            self.reader
                .read_exact_into(offset, tile)
                .map_err(|source| ExtractError::TileRead { index, source })?;

            if patch_rgb {
                jpeg::override_component_ids(tile)?;
            }

            let standalone = jpeg::build_standalone_jpeg(self.plan.jpeg_tables.as_deref(), tile);

            let (row, col) = self.plan.tile_position(index);
            let path = output_dir.join(format!("{row}_{col}.jpeg"));

            match fs::write(&path, &standalone) {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = standalone.len(), "wrote tile");
                    report.written += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to write tile, skipping");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Grow the scratch buffer to at least `len` usable bytes.
    fn ensure_scratch_len(&mut self, len: usize) -> Result<(), ExtractError> {
        if len <= self.scratch.len() {
            return Ok(());
        }
        let additional = len - self.scratch.len();
        self.scratch
            .try_reserve(additional)
            .map_err(|_| ExtractError::Allocation { bytes: len })?;
        self.scratch.resize(len, 0);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
