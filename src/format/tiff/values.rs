//! TIFF tag value reading.
//!
//! Values can be stored either inline in the IFD entry (for small values)
//! or at an offset in the file (for larger values like the tile offset and
//! byte-count tables). The reader hides that distinction behind typed
//! lookups.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file.
///
/// This struct combines a RangeReader with TIFF header information to
/// read values respecting the file's byte order and format.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Get the byte order from the header.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the file.
    pub fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            let bytes = self.reader.read_exact_at(offset, size as usize)?;
            Ok(bytes)
        }
    }

    /// Read a single u32 value from an entry.
    ///
    /// Handles both Short and Long field types, converting as needed.
    pub fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        // Try inline first
        if let Some(value) = entry.inline_u32(self.header.byte_order) {
            return Ok(value);
        }

        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if entry.count != 1 {
            return Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("expected count 1, got {}", entry.count),
            });
        }

        let bytes = self.read_bytes(entry)?;
        let byte_order = self.header.byte_order;

        match field_type {
            FieldType::Short => Ok(byte_order.read_u16(&bytes) as u32),
            FieldType::Long => Ok(byte_order.read_u32(&bytes)),
            _ => Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("expected Short or Long, got {:?}", field_type),
            }),
        }
    }

    /// Read the first value of a Short/Long entry, scalar or array.
    ///
    /// Some writers store per-sample tags (BitsPerSample) as one value per
    /// component; the components always agree for JPEG directories, so the
    /// first value is representative.
    pub fn read_first_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if entry.count == 1 {
            return self.read_u32(entry);
        }

        let values = self.read_u32_array(entry)?;
        values.first().copied().ok_or(TiffError::InvalidTagValue {
            tag: "unknown",
            message: "empty value array".to_string(),
        })
    }

    /// Read an array of u32 values from an entry.
    pub fn read_u32_array(&self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        let count = entry.count as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry)?;
        let byte_order = self.header.byte_order;

        let mut values = Vec::with_capacity(count);

        match field_type {
            FieldType::Short => {
                for i in 0..count {
                    values.push(byte_order.read_u16(&bytes[i * 2..]) as u32);
                }
            }
            FieldType::Long => {
                for i in 0..count {
                    values.push(byte_order.read_u32(&bytes[i * 4..]));
                }
            }
            _ => {
                return Err(TiffError::InvalidTagValue {
                    tag: "unknown",
                    message: format!("expected Short or Long for u32 array, got {:?}", field_type),
                });
            }
        }

        Ok(values)
    }

    /// Read an array of u64 values from an entry.
    ///
    /// This is the primary method for reading TileOffsets and TileByteCounts.
    /// The entire array is fetched in a single read.
    ///
    /// Handles Short, Long, and Long8 field types, converting all to u64.
    pub fn read_u64_array(&self, entry: &IfdEntry) -> Result<Vec<u64>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        let count = entry.count as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry)?;
        let byte_order = self.header.byte_order;

        let mut values = Vec::with_capacity(count);

        match field_type {
            FieldType::Short => {
                for i in 0..count {
                    values.push(byte_order.read_u16(&bytes[i * 2..]) as u64);
                }
            }
            FieldType::Long => {
                for i in 0..count {
                    values.push(byte_order.read_u32(&bytes[i * 4..]) as u64);
                }
            }
            FieldType::Long8 => {
                for i in 0..count {
                    values.push(byte_order.read_u64(&bytes[i * 8..]));
                }
            }
            _ => {
                return Err(TiffError::InvalidTagValue {
                    tag: "unknown",
                    message: format!(
                        "expected Short, Long, or Long8 for array, got {:?}",
                        field_type
                    ),
                });
            }
        }

        Ok(values)
    }

    /// Read raw bytes from an entry (for UNDEFINED or opaque data).
    ///
    /// This is used for the JPEGTables payload.
    pub fn read_raw_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        self.read_bytes(entry)
    }
}

// =============================================================================
// Tests
// =============================================================================
