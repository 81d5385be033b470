//! Synthetic TIFF construction for integration tests.
//!
//! Builds minimal but structurally valid tiled TIFF files, classic or
//! BigTIFF, with full control over tags and tile payloads. Tile data and
//! external tag values are laid out before each IFD; next-IFD offsets are
//! patched as directories are appended.

// =============================================================================
// DirectorySpec
// =============================================================================

/// One directory of a synthetic TIFF under construction.
pub struct DirectorySpec {
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
    compression: u16,
    photometric: Option<u16>,
    samples_per_pixel: u16,
    jpeg_tables: Option<Vec<u8>>,
    tiles: Vec<Vec<u8>>,
    omit_tile_dimensions: bool,
}

impl DirectorySpec {
    pub fn new(image_width: u32, image_height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            tile_width,
            tile_height,
            compression: 7, // JPEG
            photometric: Some(6), // YCbCr
            samples_per_pixel: 3,
            jpeg_tables: None,
            tiles: Vec::new(),
            omit_tile_dimensions: false,
        }
    }

    pub fn with_compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_photometric(mut self, photometric: u16) -> Self {
        self.photometric = Some(photometric);
        self
    }

    pub fn with_jpeg_tables(mut self, tables: Vec<u8>) -> Self {
        self.jpeg_tables = Some(tables);
        self
    }

    pub fn with_tile(mut self, data: Vec<u8>) -> Self {
        self.tiles.push(data);
        self
    }

    /// Leave out TileWidth/TileLength, mimicking a strip-organized file.
    pub fn without_tile_dimensions(mut self) -> Self {
        self.omit_tile_dimensions = true;
        self
    }
}

// =============================================================================
// TiffBuilder
// =============================================================================

/// Builds a complete little-endian TIFF file in memory.
pub struct TiffBuilder {
    is_bigtiff: bool,
    directories: Vec<DirectorySpec>,
}

/// One IFD entry before encoding: raw value payload, externalized when it
/// does not fit the inline field.
struct Entry {
    tag: u16,
    field_type: u16,
    count: u64,
    payload: Vec<u8>,
}

impl Entry {
    fn short(tag: u16, value: u16) -> Self {
        Self {
            tag,
            field_type: 3,
            count: 1,
            payload: value.to_le_bytes().to_vec(),
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            field_type: 4,
            count: 1,
            payload: value.to_le_bytes().to_vec(),
        }
    }

    fn shorts(tag: u16, values: &[u16]) -> Self {
        let mut payload = Vec::with_capacity(values.len() * 2);
        for v in values {
            payload.extend(v.to_le_bytes());
        }
        Self {
            tag,
            field_type: 3,
            count: values.len() as u64,
            payload,
        }
    }

    fn longs(tag: u16, values: &[u32]) -> Self {
        let mut payload = Vec::with_capacity(values.len() * 4);
        for v in values {
            payload.extend(v.to_le_bytes());
        }
        Self {
            tag,
            field_type: 4,
            count: values.len() as u64,
            payload,
        }
    }

    fn undefined(tag: u16, bytes: Vec<u8>) -> Self {
        Self {
            tag,
            field_type: 7,
            count: bytes.len() as u64,
            payload: bytes,
        }
    }
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            is_bigtiff: false,
            directories: Vec::new(),
        }
    }

    pub fn new_bigtiff() -> Self {
        Self {
            is_bigtiff: true,
            directories: Vec::new(),
        }
    }

    pub fn directory(mut self, spec: DirectorySpec) -> Self {
        self.directories.push(spec);
        self
    }

    /// Encode the file.
    pub fn build(&self) -> Vec<u8> {
        let mut data = if self.is_bigtiff {
            let mut h = Vec::new();
            h.extend(b"II");
            h.extend(43u16.to_le_bytes());
            h.extend(8u16.to_le_bytes());
            h.extend(0u16.to_le_bytes());
            h.extend(0u64.to_le_bytes()); // first IFD offset, patched below
            h
        } else {
            let mut h = Vec::new();
            h.extend(b"II");
            h.extend(42u16.to_le_bytes());
            h.extend(0u32.to_le_bytes()); // first IFD offset, patched below
            h
        };

        // Position of the pointer to patch with the next IFD's offset
        let mut link_pos = if self.is_bigtiff { 8 } else { 4 };

        for dir in &self.directories {
            // Tile payloads first
            let mut offsets = Vec::new();
            let mut counts = Vec::new();
            for tile in &dir.tiles {
                offsets.push(data.len() as u32);
                counts.push(tile.len() as u32);
                data.extend(tile);
            }

            // Entries sorted by tag, as the format requires
            let mut entries = vec![
                Entry::long(256, dir.image_width),
                Entry::long(257, dir.image_height),
                Entry::shorts(258, &vec![8u16; dir.samples_per_pixel as usize]),
                Entry::short(259, dir.compression),
            ];
            if let Some(p) = dir.photometric {
                entries.push(Entry::short(262, p));
            }
            entries.push(Entry::short(277, dir.samples_per_pixel));
            if !dir.omit_tile_dimensions {
                entries.push(Entry::short(322, dir.tile_width as u16));
                entries.push(Entry::short(323, dir.tile_height as u16));
            }
            entries.push(Entry::longs(324, &offsets));
            entries.push(Entry::longs(325, &counts));
            if let Some(tables) = &dir.jpeg_tables {
                entries.push(Entry::undefined(347, tables.clone()));
            }

            // Externalize oversized values, then place the IFD
            let inline_size = if self.is_bigtiff { 8 } else { 4 };
            let mut value_fields = Vec::with_capacity(entries.len());
            for entry in &entries {
                let mut field = vec![0u8; inline_size];
                if entry.payload.len() <= inline_size {
                    field[..entry.payload.len()].copy_from_slice(&entry.payload);
                } else {
                    let offset = data.len() as u64;
                    data.extend(&entry.payload);
                    if self.is_bigtiff {
                        field.copy_from_slice(&offset.to_le_bytes());
                    } else {
                        field.copy_from_slice(&(offset as u32).to_le_bytes());
                    }
                }
                value_fields.push(field);
            }

            let ifd_offset = data.len() as u64;
            if self.is_bigtiff {
                data[link_pos..link_pos + 8].copy_from_slice(&ifd_offset.to_le_bytes());
                data.extend((entries.len() as u64).to_le_bytes());
            } else {
                data[link_pos..link_pos + 4]
                    .copy_from_slice(&(ifd_offset as u32).to_le_bytes());
                data.extend((entries.len() as u16).to_le_bytes());
            }

            for (entry, field) in entries.iter().zip(&value_fields) {
                data.extend(entry.tag.to_le_bytes());
                data.extend(entry.field_type.to_le_bytes());
                if self.is_bigtiff {
                    data.extend(entry.count.to_le_bytes());
                } else {
                    data.extend((entry.count as u32).to_le_bytes());
                }
                data.extend(field);
            }

            link_pos = data.len();
            if self.is_bigtiff {
                data.extend(0u64.to_le_bytes());
            } else {
                data.extend(0u32.to_le_bytes());
            }
        }

        data
    }
}

// =============================================================================
// Payload helpers
// =============================================================================

/// An abbreviated tile stream: SOI plus recognizable filler.
pub fn fake_tile(fill: u8, len: usize) -> Vec<u8> {
    assert!(len >= 2);
    let mut tile = vec![0xFF, 0xD8];
    tile.extend(std::iter::repeat(fill).take(len - 2));
    tile
}

/// A JPEGTables payload: SOI, one DQT segment, EOI.
pub fn fake_jpeg_tables() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xDB, 0x00, 0x06, 0x00, 0x10, 0x20, 0x30, // DQT
        0xFF, 0xD9, // EOI
    ]
}

/// A tile whose SOF0 marker sits at a chosen byte offset.
///
/// The segment is a valid baseline 3-component frame header, so the
/// component-ID patch applies at fixed distances from the marker.
pub fn tile_with_sof0_at(sof_offset: usize) -> Vec<u8> {
    assert!(sof_offset >= 2);
    let mut tile = vec![0xFF, 0xD8];
    tile.resize(sof_offset, 0x00);
    tile.extend([
        0xFF, 0xC0, // SOF0
        0x00, 0x11, // length 17
        0x08, // precision
        0x00, 0x40, // height 64
        0x00, 0x40, // width 64
        0x03, // 3 components
        0x01, 0x22, 0x00, //
        0x02, 0x11, 0x01, //
        0x03, 0x11, 0x01,
    ]);
    tile
}
