//! TIFF container parsing.
//!
//! This module handles parsing of TIFF and BigTIFF files far enough to reach
//! one directory's tile data: header, IFD chain, tag values.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header. All multi-byte values must be read
//!   respecting this order.
//!
//! - **Classic TIFF vs BigTIFF**: Classic TIFF uses 32-bit offsets (max 4GB
//!   files), while BigTIFF uses 64-bit offsets. The parser handles both
//!   transparently.
//!
//! - **IFD (Image File Directory)**: Contains metadata and pointers to image
//!   data. Pyramidal files have one IFD per resolution level.
//!
//! - **Inline vs offset values**: Small values are stored inline in the IFD
//!   entry, larger values at an offset pointed to by the entry.

mod directory;
mod parser;
mod tags;
mod values;

pub use directory::directory_at;
pub use parser::{ByteOrder, Ifd, IfdEntry, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, Photometric, TiffTag};
pub use values::ValueReader;
