//! Extraction of per-tile JPEG files from tiled, JPEG-compressed TIFFs.
//!
//! Tiled JPEG TIFFs (common for scanned whole-slide images and other large
//! scans) store each tile as an abbreviated JPEG bitstream: the quantization
//! and Huffman tables live once per directory in the `JPEGTables` tag, not
//! in the tiles themselves. This crate parses the container far enough to
//! reach one directory, then writes every tile as a standalone JPEG with the
//! shared tables spliced back in.
//!
//! # Pipeline
//!
//! 1. [`io`]: positioned reads over the input file
//! 2. [`format::tiff`]: header, IFD chain, tag values
//! 3. [`plan`]: one directory condensed into a [`plan::DirectoryPlan`]
//! 4. [`format::jpeg`]: table splicing and the RGB component-ID patch
//! 5. [`extract`]: the tile loop writing `<row>_<column>.jpeg` files

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod io;
pub mod plan;

pub use error::{ExtractError, IoError, JpegError, TiffError};
pub use extract::{ExtractReport, TileExtractor};
pub use plan::DirectoryPlan;
