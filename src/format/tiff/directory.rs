//! TIFF directory chain traversal.
//!
//! A multi-image TIFF stores one IFD per image (for pyramidal files, one per
//! resolution level), linked by next-IFD offsets. Extraction only ever needs
//! a single directory, so the chain is walked lazily up to the requested
//! index instead of parsing every IFD in the file.

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{Ifd, TiffHeader};

/// Maximum number of IFDs to follow (safety limit against offset cycles)
const MAX_IFDS: usize = 100;

/// Read the IFD at `index` in the directory chain.
///
/// Returns `Ok(None)` when the chain ends before reaching `index`, which the
/// caller reports as an invalid directory index.
///
/// # Errors
/// Propagates I/O and structural parse errors; a chain longer than
/// [`MAX_IFDS`] is reported as an invalid offset (it is almost certainly a
/// cycle).
pub fn directory_at<R: RangeReader>(
    reader: &R,
    header: &TiffHeader,
    index: usize,
) -> Result<Option<Ifd>, TiffError> {
    let mut offset = header.first_ifd_offset;
    let mut walked = 0usize;

    while offset != 0 {
        if walked > MAX_IFDS {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        let ifd = read_ifd_at(reader, header, offset)?;

        if walked == index {
            return Ok(Some(ifd));
        }

        offset = ifd.next_ifd_offset;
        walked += 1;
    }

    Ok(None)
}

/// Read and parse one complete IFD at a known offset.
///
/// The entry count is read first so the exact IFD size can be fetched in a
/// second read. The count is untrusted input: the implied IFD size is
/// checked against the file before any buffer is sized from it.
fn read_ifd_at<R: RangeReader>(
    reader: &R,
    header: &TiffHeader,
    offset: u64,
) -> Result<Ifd, TiffError> {
    let count_size = header.ifd_count_size();
    let count_bytes = reader.read_exact_at(offset, count_size)?;

    let entry_count = if header.is_bigtiff {
        header.byte_order.read_u64(&count_bytes)
    } else {
        header.byte_order.read_u16(&count_bytes) as u64
    };

    let ifd_size = Ifd::calculate_size(entry_count, header).unwrap_or(u64::MAX);
    let in_bounds = offset
        .checked_add(ifd_size)
        .map(|end| end <= reader.size())
        .unwrap_or(false);
    if !in_bounds {
        return Err(TiffError::FileTooSmall {
            required: ifd_size,
            actual: reader.size().saturating_sub(offset),
        });
    }

    let ifd_bytes = reader.read_exact_at(offset, ifd_size as usize)?;
    Ifd::parse(&ifd_bytes, header)
}
