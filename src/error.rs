use thiserror::Error;

/// I/O errors that can occur when reading from the container file
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// The input file could not be opened
    #[error("cannot open {path}: {message}")]
    Open { path: String, message: String },

    /// A read at a specific offset failed or returned fewer bytes than requested
    #[error("read of {requested} bytes at offset {offset} failed: {message}")]
    Read {
        offset: u64,
        requested: u64,
        message: String,
    },

    /// Requested range exceeds resource bounds
    #[error("range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

/// Errors that can occur when parsing the TIFF container
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Invalid TIFF version number
    #[error("Invalid TIFF version: expected 42 (TIFF) or 43 (BigTIFF), got {0}")]
    InvalidVersion(u16),

    /// Invalid BigTIFF offset byte size (must be 8)
    #[error("Invalid BigTIFF offset byte size: expected 8, got {0}")]
    InvalidBigTiffOffsetSize(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Required tag is missing from IFD
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors raised by the JPEG marker surgery.
///
/// The component-ID patch writes at fixed offsets inside the SOF0 and SOS
/// segments, which is only valid for the one segment shape the embedded
/// encoder produces. Any other shape is reported instead of being patched.
#[derive(Debug, Clone, Error)]
pub enum JpegError {
    /// SOF0 segment does not have the expected baseline 3-component layout
    #[error("unexpected SOF0 segment shape at offset {offset}: {message}")]
    SofLayout { offset: usize, message: String },

    /// SOS segment does not cover exactly 3 components
    #[error("unexpected SOS segment shape at offset {offset}: {message}")]
    SosLayout { offset: usize, message: String },
}

/// Failure classes of a tile extraction run.
///
/// Setup-phase variants abort before any tile is written. `TileRead`,
/// `Allocation` and `Jpeg` abort mid-loop; already written files are kept.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The requested directory index does not exist in the file
    #[error("no directory {index} in this file")]
    InvalidDirectory { index: usize },

    /// Directory is not JPEG-compressed
    #[error("unsupported compression: {0} (tiles must be JPEG-compressed)")]
    UnsupportedCompression(String),

    /// Directory uses strips instead of tiles
    #[error("directory has no tile layout (TileWidth/TileLength missing, file uses strips?)")]
    MissingTileLayout,

    /// The per-tile byte-count table is absent
    #[error("tile byte counts are missing")]
    MissingByteCounts,

    /// Tile tables disagree with the tile grid derived from the image dimensions
    #[error("tile count mismatch: grid is {expected} tiles, {table} table has {actual} entries")]
    TileCountMismatch {
        expected: usize,
        actual: usize,
        table: &'static str,
    },

    /// Reading a tile's raw bytes from the container failed
    #[error("failed to read tile {index}: {source}")]
    TileRead { index: usize, source: IoError },

    /// The tile scratch buffer could not be grown
    #[error("cannot grow tile buffer to {bytes} bytes")]
    Allocation { bytes: usize },

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// JPEG marker surgery error
    #[error("JPEG error: {0}")]
    Jpeg(#[from] JpegError),
}
