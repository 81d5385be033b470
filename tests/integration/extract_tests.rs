//! End-to-end extraction tests over synthetic TIFF files on disk.

use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;

use tempdir::TempDir;

use tifftiles::error::ExtractError;
use tifftiles::extract::{ExtractReport, TileExtractor};
use tifftiles::io::FileRangeReader;
use tifftiles::plan::DirectoryPlan;

use crate::test_utils::{
    fake_jpeg_tables, fake_tile, tile_with_sof0_at, DirectorySpec, TiffBuilder,
};

/// Write `data` as a TIFF file, extract directory `dir_index` into a fresh
/// output directory, and hand back the temp dir for inspection.
fn run_extraction(data: &[u8], dir_index: usize) -> (TempDir, Result<ExtractReport, ExtractError>) {
    let tmp = TempDir::new("tifftiles").unwrap();
    let input = tmp.path().join("input.tiff");
    fs::write(&input, data).unwrap();

    let out = tmp.path().join("tiles");
    fs::create_dir_all(&out).unwrap();

    let reader = FileRangeReader::open(&input).unwrap();
    let result = DirectoryPlan::build(&reader, dir_index)
        .and_then(|plan| TileExtractor::new(&reader, &plan).run(&out));

    (tmp, result)
}

fn read_tile(tmp: &TempDir, name: &str) -> Vec<u8> {
    fs::read(tmp.path().join("tiles").join(name)).unwrap()
}

fn output_names(tmp: &TempDir) -> BTreeSet<String> {
    fs::read_dir(tmp.path().join("tiles"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect()
}

// -----------------------------------------------------------------------------
// Full grid extraction
// -----------------------------------------------------------------------------

#[test]
fn test_extracts_full_grid_with_spliced_tables() {
    // 600x400 at 256x256 tiles: 3 across, 2 down
    let tables = fake_jpeg_tables();
    let tiles: Vec<Vec<u8>> = (0..6).map(|i| fake_tile(0x10 + i as u8, 24)).collect();

    let mut dir = DirectorySpec::new(600, 400, 256, 256).with_jpeg_tables(tables.clone());
    for tile in &tiles {
        dir = dir.with_tile(tile.clone());
    }
    let file = TiffBuilder::new().directory(dir).build();

    let (tmp, result) = run_extraction(&file, 0);
    assert_eq!(result.unwrap(), ExtractReport { written: 6, skipped: 0 });

    let expected: BTreeSet<String> = ["0_0", "0_1", "0_2", "1_0", "1_1", "1_2"]
        .iter()
        .map(|n| format!("{n}.jpeg"))
        .collect();
    assert_eq!(output_names(&tmp), expected);

    for (i, tile) in tiles.iter().enumerate() {
        let name = format!("{}_{}.jpeg", i / 3, i % 3);
        let written = read_tile(&tmp, &name);

        // Tables are spliced without their own SOI and trailing EOI
        let mut expected = vec![0xFF, 0xD8];
        expected.extend(&tables[2..tables.len() - 2]);
        expected.extend(&tile[2..]);
        assert_eq!(written, expected, "{name}");
    }
}

#[test]
fn test_tiles_without_tables_written_verbatim() {
    let tile = fake_tile(0x42, 16);
    let file = TiffBuilder::new()
        .directory(DirectorySpec::new(64, 64, 64, 64).with_tile(tile.clone()))
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    result.unwrap();
    assert_eq!(read_tile(&tmp, "0_0.jpeg"), tile);
}

#[test]
fn test_degenerate_tables_payload_ignored() {
    // 4 bytes of tables carry no segment and must not be spliced
    let tile = fake_tile(0x42, 16);
    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_jpeg_tables(vec![0xFF, 0xD8, 0xFF, 0xD9])
                .with_tile(tile.clone()),
        )
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    result.unwrap();
    assert_eq!(read_tile(&tmp, "0_0.jpeg"), tile);
}

// -----------------------------------------------------------------------------
// Component-ID patching
// -----------------------------------------------------------------------------

#[test]
fn test_rgb_directory_patched_on_disk() {
    // SOF0 at offset 50: component IDs land at 60, 63, 66
    let tile = tile_with_sof0_at(50);
    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_photometric(2)
                .with_tile(tile),
        )
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    result.unwrap();

    let written = read_tile(&tmp, "0_0.jpeg");
    assert_eq!(written[60], b'R');
    assert_eq!(written[63], b'G');
    assert_eq!(written[66], b'B');
}

#[test]
fn test_ycbcr_directory_not_patched() {
    let tile = tile_with_sof0_at(50);
    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_photometric(6)
                .with_tile(tile.clone()),
        )
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    result.unwrap();
    assert_eq!(read_tile(&tmp, "0_0.jpeg"), tile);
}

// -----------------------------------------------------------------------------
// Directory selection
// -----------------------------------------------------------------------------

#[test]
fn test_extracts_requested_directory_only() {
    let level0: Vec<Vec<u8>> = (0..2).map(|i| fake_tile(0xA0 + i as u8, 12)).collect();
    let level1 = fake_tile(0xB0, 12);

    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(128, 64, 64, 64)
                .with_tile(level0[0].clone())
                .with_tile(level0[1].clone()),
        )
        .directory(DirectorySpec::new(64, 64, 64, 64).with_tile(level1.clone()))
        .build();

    let (tmp, result) = run_extraction(&file, 1);
    assert_eq!(result.unwrap(), ExtractReport { written: 1, skipped: 0 });

    assert_eq!(output_names(&tmp).len(), 1);
    assert_eq!(read_tile(&tmp, "0_0.jpeg"), level1);
}

#[test]
fn test_directory_index_past_chain_fails() {
    let file = TiffBuilder::new()
        .directory(DirectorySpec::new(64, 64, 64, 64).with_tile(fake_tile(1, 8)))
        .build();

    let (_tmp, result) = run_extraction(&file, 5);
    assert!(matches!(
        result,
        Err(ExtractError::InvalidDirectory { index: 5 })
    ));
}

// -----------------------------------------------------------------------------
// Rejected inputs
// -----------------------------------------------------------------------------

#[test]
fn test_non_jpeg_compression_rejected() {
    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_compression(5)
                .with_tile(fake_tile(1, 8)),
        )
        .build();

    let (_tmp, result) = run_extraction(&file, 0);
    assert!(matches!(result, Err(ExtractError::UnsupportedCompression(_))));
}

#[test]
fn test_strip_organized_directory_rejected() {
    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .without_tile_dimensions()
                .with_tile(fake_tile(1, 8)),
        )
        .build();

    let (_tmp, result) = run_extraction(&file, 0);
    assert!(matches!(result, Err(ExtractError::MissingTileLayout)));
}

// -----------------------------------------------------------------------------
// BigTIFF
// -----------------------------------------------------------------------------

#[test]
fn test_bigtiff_container_extracts() {
    let tables = fake_jpeg_tables();
    let tile = fake_tile(0x55, 20);
    let file = TiffBuilder::new_bigtiff()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_jpeg_tables(tables.clone())
                .with_tile(tile.clone()),
        )
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    assert_eq!(result.unwrap(), ExtractReport { written: 1, skipped: 0 });

    let mut expected = vec![0xFF, 0xD8];
    expected.extend(&tables[2..tables.len() - 2]);
    expected.extend(&tile[2..]);
    assert_eq!(read_tile(&tmp, "0_0.jpeg"), expected);
}

// -----------------------------------------------------------------------------
// Real JPEG payloads
// -----------------------------------------------------------------------------

fn gradient_jpeg() -> Vec<u8> {
    let rgb = image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 4) as u8, 0x80])
    });
    let mut encoded = Vec::new();
    image::DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Jpeg)
        .unwrap();
    encoded
}

/// Split a self-contained JPEG into an abbreviated stream pair: a tables
/// payload (SOI, DQT/DHT segments, EOI) and a tile without those segments,
/// the way a tiled TIFF writer factors them apart.
fn split_into_tables_and_tile(encoded: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut tables = vec![0xFF, 0xD8];
    let mut tile = vec![0xFF, 0xD8];

    let mut pos = 2;
    loop {
        assert_eq!(encoded[pos], 0xFF, "lost marker sync at {pos}");
        let marker = encoded[pos + 1];
        if marker == 0xDA {
            // SOS: the scan header, entropy data, and EOI all stay with
            // the tile
            tile.extend(&encoded[pos..]);
            break;
        }
        let length = u16::from_be_bytes([encoded[pos + 2], encoded[pos + 3]]) as usize;
        let segment = &encoded[pos..pos + 2 + length];
        if marker == 0xDB || marker == 0xC4 {
            tables.extend(segment);
        } else {
            tile.extend(segment);
        }
        pos += 2 + length;
    }

    tables.extend([0xFF, 0xD9]);
    (tables, tile)
}

#[test]
fn test_extracted_real_jpeg_decodes() {
    use image::GenericImageView;

    // A real self-contained JPEG as the single tile; no shared tables.
    let encoded = gradient_jpeg();

    let file = TiffBuilder::new()
        .directory(DirectorySpec::new(64, 64, 64, 64).with_tile(encoded.clone()))
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    assert_eq!(result.unwrap(), ExtractReport { written: 1, skipped: 0 });

    let written = read_tile(&tmp, "0_0.jpeg");
    assert_eq!(written, encoded);

    let decoded = image::load_from_memory(&written).unwrap();
    assert_eq!(decoded.dimensions(), (64, 64));
}

#[test]
fn test_abbreviated_tile_with_shared_tables_decodes() {
    use image::GenericImageView;

    // The case the tool exists for: the tile alone is missing its DQT/DHT
    // segments and only decodes once the shared tables are spliced back in.
    let (tables, tile) = split_into_tables_and_tile(&gradient_jpeg());
    assert!(image::load_from_memory(&tile).is_err());

    let file = TiffBuilder::new()
        .directory(
            DirectorySpec::new(64, 64, 64, 64)
                .with_jpeg_tables(tables)
                .with_tile(tile),
        )
        .build();

    let (tmp, result) = run_extraction(&file, 0);
    assert_eq!(result.unwrap(), ExtractReport { written: 1, skipped: 0 });

    let decoded = image::load_from_memory(&read_tile(&tmp, "0_0.jpeg")).unwrap();
    assert_eq!(decoded.dimensions(), (64, 64));
}
