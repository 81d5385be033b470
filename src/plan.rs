//! Directory inspection and extraction planning.
//!
//! Before any tile is read, the requested directory is inspected once and
//! condensed into a [`DirectoryPlan`]: dimensions, tile grid, shared JPEG
//! tables, and the full tile offset/byte-count tables. Everything that can
//! fail structurally fails here, so the extraction loop itself only deals
//! with per-tile reads and writes.

use bytes::Bytes;

use crate::error::{ExtractError, TiffError};
use crate::format::jpeg::MIN_JPEG_TABLES_LEN;
use crate::format::tiff::{
    directory_at, Compression, Ifd, Photometric, TiffHeader, TiffTag, ValueReader,
    BIGTIFF_HEADER_SIZE,
};
use crate::io::RangeReader;

// =============================================================================
// DirectoryPlan
// =============================================================================

/// Everything needed to extract one directory's tiles.
#[derive(Debug, Clone)]
pub struct DirectoryPlan {
    /// Directory index in the file's IFD chain
    pub directory_index: usize,

    /// Full image width in pixels
    pub image_width: u32,

    /// Full image height in pixels
    pub image_height: u32,

    /// Tile width in pixels
    pub tile_width: u32,

    /// Tile height in pixels
    pub tile_height: u32,

    /// Number of tile columns (edge tiles padded to full width)
    pub tiles_across: u32,

    /// Number of tile rows
    pub tiles_down: u32,

    /// Bits per sample (8 for the files this tool targets)
    pub bits_per_sample: u32,

    /// Samples per pixel (3 for RGB/YCbCr, 1 for grayscale)
    pub samples_per_pixel: u32,

    /// Compression scheme, always JPEG once the plan is built
    pub compression: Compression,

    /// Declared meaning of the sample channels, `None` when the tag is
    /// absent or carries a value this tool does not know
    pub photometric: Option<Photometric>,

    /// Shared quantization/Huffman tables, `None` when absent or too short
    /// to carry any table segment
    pub jpeg_tables: Option<Bytes>,

    /// File offset of each tile, row-major
    pub tile_offsets: Vec<u64>,

    /// Byte count of each tile, row-major
    pub tile_byte_counts: Vec<u64>,
}

impl DirectoryPlan {
    /// Inspect directory `index` of a TIFF file and build its plan.
    ///
    /// # Errors
    /// - [`ExtractError::InvalidDirectory`] when the IFD chain is shorter
    ///   than `index + 1`
    /// - [`ExtractError::UnsupportedCompression`] for anything but JPEG
    /// - [`ExtractError::MissingTileLayout`] when the directory has no
    ///   tile dimensions (strip-organized files)
    /// - [`ExtractError::MissingByteCounts`] when TileByteCounts is absent
    /// - [`ExtractError::TileCountMismatch`] when either tile table's
    ///   length disagrees with the grid implied by the dimensions
    /// - [`ExtractError::Tiff`] for I/O and structural parse failures
    pub fn build<R: RangeReader>(reader: &R, index: usize) -> Result<Self, ExtractError> {
        let header_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
        let header_bytes = reader
            .read_exact_at(0, header_len)
            .map_err(TiffError::from)?;
        let header = TiffHeader::parse(&header_bytes, reader.size())?;

        let ifd = directory_at(reader, &header, index)?
            .ok_or(ExtractError::InvalidDirectory { index })?;

        let values = ValueReader::new(reader, &header);

        let compression = read_compression(&values, &ifd)?;

        let image_width = read_required_u32(&values, &ifd, TiffTag::ImageWidth, "ImageWidth")?;
        let image_height = read_required_u32(&values, &ifd, TiffTag::ImageLength, "ImageLength")?;

        let (tile_width, tile_height) = match (
            ifd.get_entry_by_tag(TiffTag::TileWidth),
            ifd.get_entry_by_tag(TiffTag::TileLength),
        ) {
            (Some(w), Some(h)) => (values.read_u32(w)?, values.read_u32(h)?),
            _ => return Err(ExtractError::MissingTileLayout),
        };
        if tile_width == 0 || tile_height == 0 {
            return Err(ExtractError::MissingTileLayout);
        }

        let tiles_across = image_width.div_ceil(tile_width);
        let tiles_down = image_height.div_ceil(tile_height);
        let expected = tiles_across as usize * tiles_down as usize;

        let tile_offsets = match ifd.get_entry_by_tag(TiffTag::TileOffsets) {
            Some(entry) => values.read_u64_array(entry)?,
            None => return Err(ExtractError::Tiff(TiffError::MissingTag("TileOffsets"))),
        };
        let tile_byte_counts = match ifd.get_entry_by_tag(TiffTag::TileByteCounts) {
            Some(entry) => values.read_u64_array(entry)?,
            None => return Err(ExtractError::MissingByteCounts),
        };

        if tile_offsets.len() != expected {
            return Err(ExtractError::TileCountMismatch {
                expected,
                actual: tile_offsets.len(),
                table: "TileOffsets",
            });
        }
        if tile_byte_counts.len() != expected {
            return Err(ExtractError::TileCountMismatch {
                expected,
                actual: tile_byte_counts.len(),
                table: "TileByteCounts",
            });
        }

        let bits_per_sample = match ifd.get_entry_by_tag(TiffTag::BitsPerSample) {
            Some(entry) => values.read_first_u32(entry)?,
            None => 8,
        };
        let samples_per_pixel = match ifd.get_entry_by_tag(TiffTag::SamplesPerPixel) {
            Some(entry) => values.read_u32(entry)?,
            None => 1,
        };

        let photometric = match ifd.get_entry_by_tag(TiffTag::PhotometricInterpretation) {
            Some(entry) => Photometric::from_u16(values.read_u32(entry)? as u16),
            None => None,
        };

        let jpeg_tables = read_jpeg_tables(&values, &ifd)?;

        Ok(DirectoryPlan {
            directory_index: index,
            image_width,
            image_height,
            tile_width,
            tile_height,
            tiles_across,
            tiles_down,
            bits_per_sample,
            samples_per_pixel,
            compression,
            photometric,
            jpeg_tables,
            tile_offsets,
            tile_byte_counts,
        })
    }

    /// Total number of tiles in the grid.
    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tile_offsets.len()
    }

    /// Whether the component-ID patch applies to this directory.
    #[inline]
    pub fn is_rgb(&self) -> bool {
        self.photometric == Some(Photometric::Rgb)
    }

    /// Grid position (row, column) of a row-major tile index.
    #[inline]
    pub fn tile_position(&self, index: usize) -> (u32, u32) {
        let row = index as u32 / self.tiles_across;
        let col = index as u32 % self.tiles_across;
        (row, col)
    }

    /// Largest single tile in bytes, 0 for an empty grid.
    pub fn max_tile_byte_count(&self) -> u64 {
        self.tile_byte_counts.iter().copied().max().unwrap_or(0)
    }
}

fn read_compression<R: RangeReader>(
    values: &ValueReader<'_, R>,
    ifd: &Ifd,
) -> Result<Compression, ExtractError> {
    // An absent Compression tag means uncompressed per the TIFF default
    let raw = match ifd.get_entry_by_tag(TiffTag::Compression) {
        Some(entry) => values.read_u32(entry)?,
        None => 1,
    };

    match Compression::from_u16(raw as u16) {
        Some(c) if c.is_supported() => Ok(c),
        Some(c) => Err(ExtractError::UnsupportedCompression(c.name().to_string())),
        None => Err(ExtractError::UnsupportedCompression(format!("code {raw}"))),
    }
}

fn read_required_u32<R: RangeReader>(
    values: &ValueReader<'_, R>,
    ifd: &Ifd,
    tag: TiffTag,
    name: &'static str,
) -> Result<u32, ExtractError> {
    let entry = ifd
        .get_entry_by_tag(tag)
        .ok_or(ExtractError::Tiff(TiffError::MissingTag(name)))?;
    Ok(values.read_u32(entry)?)
}

fn read_jpeg_tables<R: RangeReader>(
    values: &ValueReader<'_, R>,
    ifd: &Ifd,
) -> Result<Option<Bytes>, ExtractError> {
    let entry = match ifd.get_entry_by_tag(TiffTag::JpegTables) {
        Some(entry) => entry,
        None => return Ok(None),
    };

    let tables = values.read_raw_bytes(entry)?;
    if tables.len() < MIN_JPEG_TABLES_LEN {
        return Ok(None);
    }
    Ok(Some(tables))
}

// =============================================================================
// Tests
// =============================================================================
