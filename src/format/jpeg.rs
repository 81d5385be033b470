//! JPEG bitstream surgery for TIFF tiles.
//!
//! # Abbreviated tile streams
//!
//! Tiled JPEG TIFFs store the quantization (DQT) and Huffman (DHT) tables
//! once per directory, in the `JPEGTables` tag, instead of repeating them in
//! every tile. Each tile therefore carries only SOI plus its own frame/scan
//! segments and entropy-coded data. A standalone decoder needs the tables
//! back: [`build_standalone_jpeg`] splices the shared segment in directly
//! after the tile's SOI marker.
//!
//! # RGB component identifiers
//!
//! The encoder that produced the tiles labels frame components with the
//! conventional luma/chroma identifiers even when the directory's samples
//! are literally red/green/blue. A decoder trusting those identifiers would
//! run a chroma transform over raw RGB planes. [`override_component_ids`]
//! rewrites the component identifiers in the SOF0 and SOS segments to the
//! ASCII bytes 'R', 'G', 'B', which decoders read as "no transform".

use bytes::{Bytes, BytesMut};

use crate::error::JpegError;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Frame (baseline DCT) marker
pub const SOF0: [u8; 2] = [0xFF, 0xC0];

/// Define Huffman Table marker
pub const DHT: [u8; 2] = [0xFF, 0xC4];

/// Define Quantization Table marker
pub const DQT: [u8; 2] = [0xFF, 0xDB];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

/// Shortest JPEGTables payload that can carry any table data.
///
/// Anything up to 4 bytes is just a marker plus a length field with no
/// payload, and is treated as if the tag were absent.
pub const MIN_JPEG_TABLES_LEN: usize = 5;

// Expected segment shapes for the component-ID patch. Baseline SOF with
// 3 components: 2-byte length + precision + height + width + component
// count + 3 * (id, sampling, quant table) = 17. SOS over 3 components:
// 2-byte length + count + 3 * (selector, huffman tables) + 3 spectral
// bytes = 12.
const SOF0_EXPECTED_LENGTH: u16 = 17;
const SOS_EXPECTED_LENGTH: u16 = 12;

/// Component-identifier byte positions relative to the SOF0 marker.
const SOF0_COMPONENT_ID_OFFSETS: [usize; 3] = [10, 13, 16];

/// Component-selector byte positions relative to the SOS marker.
const SOS_COMPONENT_ID_OFFSETS: [usize; 3] = [5, 7, 9];

// =============================================================================
// Marker Search
// =============================================================================

/// Find the first occurrence of a 2-byte marker signature.
///
/// Plain byte-string search over the whole buffer; a lone first byte of the
/// signature followed by a non-matching byte is not a match.
pub fn find_marker(data: &[u8], marker: [u8; 2]) -> Option<usize> {
    data.windows(2).position(|w| w == marker)
}

// =============================================================================
// Component-ID Patch
// =============================================================================

/// Override the SOF0/SOS component identifiers with 'R', 'G', 'B'.
///
/// Applied in place when the directory's photometric interpretation is RGB.
/// The buffer length never changes, so declared segment lengths elsewhere in
/// the stream stay valid.
///
/// A missing marker is skipped silently (some encoder configurations omit
/// one), but a marker whose segment does not have the expected 3-component
/// shape is an error: the fixed offsets would land inside unrelated bytes.
///
/// # Errors
/// [`JpegError::SofLayout`]/[`JpegError::SosLayout`] when a present segment
/// does not match the expected shape.
pub fn override_component_ids(data: &mut [u8]) -> Result<(), JpegError> {
    if let Some(pos) = find_marker(data, SOF0) {
        check_sof0_shape(data, pos)?;
        for (offset, id) in SOF0_COMPONENT_ID_OFFSETS.iter().zip(*b"RGB") {
            data[pos + offset] = id;
        }
    }

    if let Some(pos) = find_marker(data, SOS) {
        check_sos_shape(data, pos)?;
        for (offset, id) in SOS_COMPONENT_ID_OFFSETS.iter().zip(*b"RGB") {
            data[pos + offset] = id;
        }
    }

    Ok(())
}

/// Validate that the SOF0 segment at `pos` is baseline with 3 components.
fn check_sof0_shape(data: &[u8], pos: usize) -> Result<(), JpegError> {
    // Marker + declared segment content
    let needed = pos + 2 + SOF0_EXPECTED_LENGTH as usize;
    if data.len() < needed {
        return Err(JpegError::SofLayout {
            offset: pos,
            message: format!("segment truncated ({} of {} bytes)", data.len() - pos, needed - pos),
        });
    }

    let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]);
    if length != SOF0_EXPECTED_LENGTH {
        return Err(JpegError::SofLayout {
            offset: pos,
            message: format!("declared length {length}, expected {SOF0_EXPECTED_LENGTH}"),
        });
    }

    let components = data[pos + 9];
    if components != 3 {
        return Err(JpegError::SofLayout {
            offset: pos,
            message: format!("{components} components, expected 3"),
        });
    }

    Ok(())
}

/// Validate that the SOS segment at `pos` covers exactly 3 components.
fn check_sos_shape(data: &[u8], pos: usize) -> Result<(), JpegError> {
    let needed = pos + 2 + SOS_EXPECTED_LENGTH as usize;
    if data.len() < needed {
        return Err(JpegError::SosLayout {
            offset: pos,
            message: format!("segment truncated ({} of {} bytes)", data.len() - pos, needed - pos),
        });
    }

    let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]);
    if length != SOS_EXPECTED_LENGTH {
        return Err(JpegError::SosLayout {
            offset: pos,
            message: format!("declared length {length}, expected {SOS_EXPECTED_LENGTH}"),
        });
    }

    let components = data[pos + 4];
    if components != 3 {
        return Err(JpegError::SosLayout {
            offset: pos,
            message: format!("{components} components, expected 3"),
        });
    }

    Ok(())
}

// =============================================================================
// Bitstream Reconstruction
// =============================================================================

/// Splice the shared tables segment into a tile bitstream.
///
/// Produces the standalone JPEG written to disk:
///
/// 1. The tile's first 2 bytes (SOI) verbatim
/// 2. The tables payload from offset 2 onward, minus its trailing EOI
/// 3. The rest of the tile from offset 2 onward
///
/// The tables payload is itself an abbreviated JPEG stream ending in EOI.
/// That EOI must not survive the splice: a decoder walking the result would
/// stop at it before ever reaching the tile's frame header. Only a trailing
/// EOI is dropped; a payload that does not end in one is copied whole.
///
/// When no usable tables are available (absent, or too short to carry any
/// table definition) the tile bytes are returned unchanged; such tiles carry
/// their own complete tables.
pub fn build_standalone_jpeg(tables: Option<&[u8]>, tile_data: &[u8]) -> Bytes {
    let tables = match tables {
        Some(t) if t.len() >= MIN_JPEG_TABLES_LEN && tile_data.len() >= 2 => t,
        _ => return Bytes::copy_from_slice(tile_data),
    };

    let mut body = &tables[2..];
    if body.ends_with(&EOI) {
        body = &body[..body.len() - 2];
    }

    let mut result = BytesMut::with_capacity(2 + body.len() + tile_data.len() - 2);
    result.extend_from_slice(&tile_data[..2]);
    result.extend_from_slice(body);
    result.extend_from_slice(&tile_data[2..]);
    result.freeze()
}

// =============================================================================
// Tests
// =============================================================================
