use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from the container file.
///
/// This abstraction lets the TIFF parser and the tile extraction engine work
/// against any random-access byte source. Production code uses
/// [`FileRangeReader`](super::FileRangeReader); tests substitute in-memory
/// readers.
pub trait RangeReader {
    /// Read exactly `len` bytes starting at `offset` into a fresh buffer.
    ///
    /// `len` may come from untrusted file metadata, so the range is checked
    /// against [`size`](RangeReader::size) before the buffer is allocated.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let in_bounds = offset
            .checked_add(len as u64)
            .map(|end| end <= self.size())
            .unwrap_or(false);
        if !in_bounds {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            });
        }

        let mut buf = vec![0u8; len];
        self.read_exact_into(offset, &mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// A short read is an error; the caller's byte-count table is the ground
    /// truth for how many bytes must exist at that location.
    fn read_exact_into(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get an identifier for this resource (for logging).
    fn identifier(&self) -> &str;
}

// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// TIFF files can be either little-endian or big-endian, determined by the
// magic bytes at the start of the file. These helpers are used extensively
// by the TIFF parser.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a big-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a little-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_le(bytes: &[u8]) -> u64 {
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Read a big-endian u64 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 8 bytes.
#[inline]
pub fn read_u64_be(bytes: &[u8]) -> u64 {
    u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}
