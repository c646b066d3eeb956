//! Memory-mapped file backend.
//!
//! Symbol files and assemblies are opened read-only and mapped into memory, so parsing only
//! touches the pages that are actually read.

use std::{fs, path::Path};

use memmap2::Mmap;

use super::Backend;
use crate::{Error, Result};

/// A [`Backend`] over a read-only memory mapping of a file on disk.
#[derive(Debug)]
pub struct Physical {
    map: Option<Mmap>,
}

impl Physical {
    /// Opens and maps the file at `path`. Empty files are not mapped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be opened; the wrapped
    /// [`std::io::Error`] keeps its kind, so callers can tell "not found" apart. Returns
    /// [`Error::Error`] if the mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Physical { map: None });
        }

        // The mapping is read-only; symbol stores are not modified while they are being served
        let map = unsafe { Mmap::map(&file) }.map_err(|error| Error::Error(error.to_string()))?;
        Ok(Physical { map: Some(map) })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.map.as_deref().unwrap_or_default()
    }
}
