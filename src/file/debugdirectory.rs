//! Debug directory records of a PE image.
//!
//! The debug data directory is an array of `IMAGE_DEBUG_DIRECTORY` records, each describing one
//! blob of debug information: a CodeView reference to the symbol file, a checksum of that file,
//! a reproducibility marker and so on. `goblin` decodes the records and the CodeView payload
//! while parsing the image; [`crate::symbols::extract_debug_meta`] turns them into a
//! [`crate::symbols::DebugMeta`].

use goblin::pe::debug::CodeviewPDB70DebugInfo;
use uguid::Guid;

use crate::Result;

pub use goblin::pe::debug::{
    ImageDebugDirectory as DebugDirectoryEntry, IMAGE_DEBUG_TYPE_CODEVIEW,
    IMAGE_DEBUG_TYPE_PDBCHECKSUM,
};

/// A CodeView 7.0 (`RSDS`) record: the symbol file a module was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeViewRecord {
    /// Signature GUID, the PDB id of the matching symbol file
    pub signature: Guid,
    /// Age
    pub age: u32,
    /// Path of the symbol file at build time
    pub path: String,
}

impl CodeViewRecord {
    /// Converts the record `goblin` decoded. The path ends at its first NUL.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not UTF-8.
    pub fn from_pdb70(info: &CodeviewPDB70DebugInfo<'_>) -> Result<CodeViewRecord> {
        let path = info
            .filename
            .split(|byte| *byte == 0)
            .next()
            .unwrap_or_default();
        let path = std::str::from_utf8(path)
            .map_err(|_| malformed_error!("CodeView path is not valid UTF-8"))?;

        Ok(CodeViewRecord {
            signature: Guid::from_bytes(info.signature),
            age: info.age,
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn info(filename: &[u8]) -> CodeviewPDB70DebugInfo<'_> {
        CodeviewPDB70DebugInfo {
            codeview_signature: 0x5344_5352,
            signature: [0x7A; 16],
            age: 3,
            filename,
        }
    }

    #[test]
    fn path_ends_at_nul() {
        let record = CodeViewRecord::from_pdb70(&info(b"/obj/App.pdb\0\0\0")).unwrap();
        assert_eq!(record.path, "/obj/App.pdb");
        assert_eq!(record.age, 3);
        assert_eq!(record.signature, Guid::from_bytes([0x7A; 16]));

        let record = CodeViewRecord::from_pdb70(&info(b"App.pdb")).unwrap();
        assert_eq!(record.path, "App.pdb");
    }

    #[test]
    fn invalid_path() {
        assert!(matches!(
            CodeViewRecord::from_pdb70(&info(b"\xFF\xFE.pdb\0")),
            Err(Error::Malformed { .. })
        ));
    }
}
