//! Local-file implementation of [`RangeReader`].
//!
//! The extraction run is strictly sequential, but the TIFF parser jumps
//! around the file (header, IFD chain, out-of-line tag values, tile data),
//! so the reader exposes positioned reads rather than a streaming interface.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::error::IoError;

use super::RangeReader;

/// Reads byte ranges from a local file.
///
/// The file handle lives behind a mutex so positioned reads can take `&self`,
/// matching the [`RangeReader`] contract. With the single-threaded extraction
/// loop the lock is never contended.
pub struct FileRangeReader {
    file: Mutex<File>,
    size: u64,
    identifier: String,
}

impl FileRangeReader {
    /// Open a file for range reading.
    ///
    /// # Errors
    /// Returns [`IoError::Open`] if the file cannot be opened or its
    /// metadata cannot be read.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let display = path.display().to_string();

        let file = File::open(path).map_err(|e| IoError::Open {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let size = file
            .metadata()
            .map_err(|e| IoError::Open {
                path: display.clone(),
                message: e.to_string(),
            })?
            .len();

        Ok(Self {
            file: Mutex::new(file),
            size,
            identifier: display,
        })
    }
}

impl RangeReader for FileRangeReader {
    fn read_exact_into(&self, offset: u64, buf: &mut [u8]) -> Result<(), IoError> {
        let requested = buf.len() as u64;

        let in_bounds = offset
            .checked_add(requested)
            .map(|end| end <= self.size)
            .unwrap_or(false);
        if !in_bounds {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested,
                size: self.size,
            });
        }

        let mut file = self.file.lock().unwrap_or_else(|poison| poison.into_inner());

        file.seek(SeekFrom::Start(offset)).map_err(|e| IoError::Read {
            offset,
            requested,
            message: e.to_string(),
        })?;

        file.read_exact(buf).map_err(|e| IoError::Read {
            offset,
            requested,
            message: e.to_string(),
        })
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
