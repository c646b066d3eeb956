//! PE image access for .NET assemblies.
//!
//! [`File`] wraps a parsed PE image over a [`Backend`] (memory-mapped file or owned buffer) and
//! offers just enough of the PE surface to find the two things symbolication needs from a
//! compiled module: the CLR runtime header (and through it, the ECMA-335 metadata) and the debug
//! directory that names the matching symbol file.
//!
//! # Key Components
//!
//! - [`File`] - a loaded PE image, validated to carry a CLR runtime header
//! - [`Backend`] - the data source abstraction, implemented by [`physical::Physical`] and
//!   [`memory::Memory`]
//! - [`debugdirectory::DebugDirectoryEntry`] and [`debugdirectory::CodeViewRecord`] - debug
//!   directory records as decoded by `goblin`
//! - [`parser::Parser`] and [`io`] - bounds-checked binary reading
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("MyApp.dll"))?;
//! for entry in file.debug_directory()? {
//!     println!("debug entry type {} ({} bytes)", entry.data_type, entry.size_of_data);
//! }
//! # Ok::<(), dotsym::Error>(())
//! ```

pub mod debugdirectory;
pub mod io;
pub mod memory;
pub mod parser;
pub mod physical;

use std::path::Path;

use crate::{
    Error::{Empty, GoblinErr},
    Result,
};
use debugdirectory::{CodeViewRecord, DebugDirectoryEntry, IMAGE_DEBUG_TYPE_CODEVIEW};
use goblin::pe::PE;
use memory::Memory;
use ouroboros::self_referencing;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of PE or symbol file data, allowing for both in-memory
/// and on-disk representations. All implementations must be thread-safe, since parsed symbol
/// readers are shared between threads by the symbol cache.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data().get(offset..end))
            .ok_or(out_of_bounds_error!())
    }

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }
}

#[self_referencing]
/// Represents a loaded PE file with .NET metadata.
///
/// The image is parsed with `goblin` on load and rejected unless it carries a CLR runtime
/// header, so every `File` is known to be a managed module.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed PE structure, referencing the data.
    #[borrows(data)]
    #[not_covariant]
    pe: PE<'this>,
}

impl File {
    /// Loads a PE file from the given path. The file is memory-mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a valid PE image or does not
    /// carry a CLR runtime header.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Loads a PE file from a memory buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty, not a valid PE image or does not carry a CLR
    /// runtime header.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data = Box::new(data);

        File::try_new(data, |data| {
            let data = data.as_ref();
            match PE::parse(data.data()) {
                Ok(pe) => match pe.header.optional_header {
                    Some(optional_header) => {
                        if optional_header
                            .data_directories
                            .get_clr_runtime_header()
                            .is_none()
                        {
                            Err(malformed_error!(
                                "File does not have a CLR runtime header directory"
                            ))
                        } else {
                            Ok(pe)
                        }
                    }
                    None => Err(malformed_error!("File does not have an OptionalHeader")),
                },
                Err(error) => Err(GoblinErr(error)),
            }
        })
    }

    /// Returns the total size of the loaded file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the file has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        self.with_pe(|pe| {
            pe.header
                .optional_header
                .and_then(|header| header.data_directories.get_clr_runtime_header().copied())
                .map_or((0, 0), |directory| {
                    (
                        directory.virtual_address as usize,
                        directory.size as usize,
                    )
                })
        })
    }

    /// Returns the raw file data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.with_data(|data| data.data())
    }

    /// Returns a slice of the file data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.with_data(|data| data.data_slice(offset, len))
    }

    /// Converts a relative virtual address (RVA) to a file offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the RVA does not fall into any section.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        self.with_pe(|pe| {
            let rva_u32 = u32::try_from(rva)
                .map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

            for section in &pe.sections {
                let Some(section_max) = section.virtual_address.checked_add(
                    section.virtual_size.max(section.size_of_raw_data),
                ) else {
                    return Err(malformed_error!(
                        "Section malformed, causing integer overflow - {} + {}",
                        section.virtual_address,
                        section.virtual_size
                    ));
                };

                if section.virtual_address <= rva_u32 && section_max > rva_u32 {
                    return Ok((rva - section.virtual_address as usize)
                        + section.pointer_to_raw_data as usize);
                }
            }

            Err(malformed_error!(
                "RVA could not be converted to offset - {}",
                rva
            ))
        })
    }

    /// Returns the `IMAGE_DEBUG_DIRECTORY` records of this image.
    ///
    /// An image without a debug directory yields an empty list; this is how stripped images
    /// look and is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be decoded.
    pub fn debug_directory(&self) -> Result<Vec<DebugDirectoryEntry>> {
        self.with_pe(|pe| match &pe.debug_data {
            Some(debug_data) => debug_data
                .entries()
                .map(|entry| entry.map_err(GoblinErr))
                .collect(),
            None => Ok(Vec::new()),
        })
    }

    /// Returns the first CodeView record of this image together with its directory entry.
    ///
    /// Returns `Ok(None)` if the image has no CodeView entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the CodeView entry is not an `RSDS` record or its path is not UTF-8.
    pub fn codeview(&self) -> Result<Option<(DebugDirectoryEntry, CodeViewRecord)>> {
        self.with_pe(|pe| {
            let Some(debug_data) = &pe.debug_data else {
                return Ok(None);
            };
            let Some(entry) = debug_data.find_type(IMAGE_DEBUG_TYPE_CODEVIEW) else {
                return Ok(None);
            };

            match &debug_data.codeview_pdb70_debug_info {
                Some(info) => Ok(Some((entry, CodeViewRecord::from_pdb70(info)?))),
                None => Err(malformed_error!(
                    "CodeView entry is not an RSDS record (major {}, minor {:#x})",
                    entry.major_version,
                    entry.minor_version
                )),
            }
        })
    }

    /// Returns the data a debug directory record points to.
    ///
    /// The file pointer is used when set; otherwise the RVA is translated through the section
    /// table.
    ///
    /// # Errors
    ///
    /// Returns an error if the record's data lies outside the image.
    pub fn debug_entry_data(&self, entry: &DebugDirectoryEntry) -> Result<&[u8]> {
        let offset = if entry.pointer_to_raw_data != 0 {
            entry.pointer_to_raw_data as usize
        } else if entry.address_of_raw_data != 0 {
            self.rva_to_offset(entry.address_of_raw_data as usize)?
        } else {
            return Err(malformed_error!(
                "Debug directory entry of type {} has no data",
                entry.data_type
            ));
        };

        self.data_slice(offset, entry.size_of_data as usize)
    }
}
