//! The identity of a module's symbol file, read from the module's debug directory.
//!
//! A compiled module records which symbol file belongs to it in a CodeView debug directory
//! entry: the path the file had on the build machine, a signature GUID and an age. Portable
//! PDBs are marked by a dedicated minor version. Newer toolchains add a `PdbChecksum` entry with
//! a hash of the symbol file. [`extract_debug_meta`] collects all of that, together with the
//! module's own MVID, into a [`DebugMeta`].

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uguid::Guid;

use crate::{
    file::{debugdirectory::IMAGE_DEBUG_TYPE_PDBCHECKSUM, parser::Parser},
    File, Result,
};

/// `minor_version` of a CodeView entry that references a portable PDB (`"PM"`)
pub const PORTABLE_CODEVIEW_MINOR_VERSION: u16 = 0x504D;

/// Format of the symbol file a module references.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum DebugType {
    /// Portable PDB
    #[strum(serialize = "ppdb")]
    #[serde(rename = "ppdb")]
    Portable,
    /// Windows PDB
    #[strum(serialize = "pdb")]
    #[serde(rename = "pdb")]
    Full,
}

/// Everything needed to find and verify the symbol file of one module.
///
/// `module_id` and `signature` are independent identifiers: the first comes from the module's
/// metadata, the second from the CodeView record and is what the symbol file itself carries as
/// its PDB id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugMeta {
    /// Path of the symbol file as recorded on the build machine
    pub file: String,
    /// The module's MVID
    pub module_id: Guid,
    /// Format of the symbol file
    #[serde(rename = "type")]
    pub debug_type: DebugType,
    /// The CodeView signature, matching the PDB id of the symbol file
    pub signature: Guid,
    /// The CodeView age; always 1 for portable PDBs
    pub age: u32,
    /// Symbol file hashes as `ALGORITHM:lowercasehex`
    #[serde(default)]
    pub checksums: Vec<String>,
}

impl DebugMeta {
    /// Whether the module references a portable PDB.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.debug_type == DebugType::Portable
    }

    /// `"ppdb"` or `"pdb"`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.debug_type.as_ref()
    }

    /// The file name of the recorded symbol path, with its directory stripped.
    ///
    /// Both `/` and `\` separate directories, since the path was recorded on an arbitrary
    /// build machine.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

impl fmt::Display for DebugMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, module id: {}, portable: {}, type: {}, signature: {}, age: {}, checksums: [{}]",
            self.file,
            self.module_id,
            self.is_portable(),
            self.debug_type,
            self.signature,
            self.age,
            self.checksums.join(", ")
        )
    }
}

/// Decodes a `PdbChecksum` record into `ALGORITHM:lowercasehex`.
///
/// # Errors
///
/// Returns an error if the algorithm name is empty or not UTF-8, or no digest follows it.
pub fn read_pdb_checksum(data: &[u8]) -> Result<String> {
    let mut parser = Parser::new(data);
    let algorithm = parser.read_string_utf8()?;
    if algorithm.is_empty() {
        return Err(malformed_error!("PdbChecksum record without algorithm name"));
    }

    let digest = parser.read_bytes(parser.remaining())?;
    if digest.is_empty() {
        return Err(malformed_error!("PdbChecksum record without digest"));
    }

    let mut checksum = String::with_capacity(algorithm.len() + 1 + digest.len() * 2);
    checksum.push_str(&algorithm);
    checksum.push(':');
    for byte in digest {
        checksum.push_str(&format!("{byte:02x}"));
    }

    Ok(checksum)
}

/// Reads the [`DebugMeta`] of a module from its debug directory.
///
/// Returns `Ok(None)` when the image has no CodeView entry, which is how stripped and native
/// images look. A missing checksum entry is not an error either; system libraries ship
/// without one.
///
/// # Errors
///
/// Returns an error if the debug directory, the CodeView record or the checksum record is
/// malformed.
pub fn extract_debug_meta(file: &File, module_id: Guid) -> Result<Option<DebugMeta>> {
    let Some((codeview, record)) = file.codeview()? else {
        log::debug!("Module {} has no CodeView debug entry", module_id);
        return Ok(None);
    };

    let debug_type = if codeview.minor_version == PORTABLE_CODEVIEW_MINOR_VERSION {
        DebugType::Portable
    } else {
        DebugType::Full
    };

    let mut checksums = Vec::new();
    let entries = file.debug_directory()?;
    if let Some(entry) = entries
        .iter()
        .find(|entry| entry.data_type == IMAGE_DEBUG_TYPE_PDBCHECKSUM)
    {
        checksums.push(read_pdb_checksum(file.debug_entry_data(entry)?)?);
    }

    Ok(Some(DebugMeta {
        file: record.path,
        module_id,
        debug_type,
        signature: record.signature,
        age: record.age,
        checksums,
    }))
}
