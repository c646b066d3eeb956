//! Reader for standalone portable PDB files.
//!
//! A portable PDB is an ECMA-335 metadata image with a `#Pdb` stream and the debug tables
//! (`Document`, `MethodDebugInformation`, ...). [`PortablePdb`] owns the file data and answers
//! the one question symbolication asks of it: which source line and column a method's IL
//! offset maps to.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::metadata::{portablepdb::PortablePdb, token::Token};
//! use std::path::Path;
//!
//! let pdb = PortablePdb::from_file(Path::new("MyApp.pdb"))?;
//! if let Some(location) = pdb.resolve(Token::new(0x0600_0001), 12)? {
//!     println!("{}:{}:{}", location.file, location.line, location.column);
//! }
//! # Ok::<(), dotsym::Error>(())
//! ```

use std::path::Path;

use ouroboros::self_referencing;

use crate::{
    file::{memory::Memory, parser::Parser, physical::Physical, Backend},
    metadata::{
        image::MetadataImage,
        sequencepoints::{parse_sequence_points, SequencePoints},
        tables::{DocumentRaw, MethodDebugInformationRaw, TableId},
        token::Token,
    },
    symbols::resolve_sequence_point,
    Error::Empty,
    Result,
};

/// A source location produced by a sequence point lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Path of the source document as recorded in the PDB
    pub file: String,
    /// 1-based start line
    pub line: u32,
    /// 1-based start column
    pub column: u32,
}

#[self_referencing]
/// A parsed portable PDB.
///
/// The file is kept open (memory-mapped or owned) for as long as the reader lives; all tables
/// and heaps are borrowed views into it.
pub struct PortablePdb {
    data: Box<dyn Backend>,
    #[borrows(data)]
    #[not_covariant]
    image: MetadataImage<'this>,
}

impl PortablePdb {
    /// Opens and parses a portable PDB from disk. The file is memory-mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a portable PDB.
    pub fn from_file(path: &Path) -> Result<PortablePdb> {
        Self::load(Physical::new(path)?)
    }

    /// Parses a portable PDB from a buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or not a portable PDB.
    pub fn from_mem(data: Vec<u8>) -> Result<PortablePdb> {
        Self::load(Memory::new(data))
    }

    fn load<T: Backend + 'static>(data: T) -> Result<PortablePdb> {
        if data.len() == 0 {
            return Err(Empty);
        }

        PortablePdb::try_new(Box::new(data), |data| {
            let image = MetadataImage::read(data.data())?;
            if image.pdb.is_none() {
                return Err(malformed_error!("Metadata image has no #Pdb stream"));
            }

            Ok(image)
        })
    }

    /// The PDB id: the GUID that matches the CodeView signature of the assembly, and the stamp.
    #[must_use]
    pub fn pdb_id(&self) -> (uguid::Guid, u32) {
        self.with_image(|image| {
            image
                .pdb
                .as_ref()
                .map_or((uguid::Guid::ZERO, 0), |pdb| (pdb.guid, pdb.stamp))
        })
    }

    /// Number of rows in the `Document` table.
    #[must_use]
    pub fn document_count(&self) -> u32 {
        self.with_image(|image| image.row_count::<DocumentRaw>())
    }

    /// Names of all documents, in row order.
    ///
    /// # Errors
    ///
    /// Returns an error if a document name blob is malformed.
    pub fn documents(&self) -> Result<Vec<String>> {
        (1..=self.document_count())
            .map(|rid| self.document_name(rid))
            .collect()
    }

    /// Decodes the name of the document in row `rid`.
    ///
    /// Names are stored as a separator character followed by blob references to the path
    /// parts. `file://` URIs are turned into plain paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the row does not exist or its name blob is malformed.
    pub fn document_name(&self, rid: u32) -> Result<String> {
        self.with_image(|image| {
            let Some(document) = image.row::<DocumentRaw>(rid) else {
                return Err(malformed_error!("Document row {} does not exist", rid));
            };

            let blob = image.blob(document.name)?;
            if blob.is_empty() {
                return Ok(String::new());
            }

            let mut parser = Parser::new(blob);
            let separator = parser.read_le::<u8>()?;

            let mut name = String::new();
            let mut first = true;
            while parser.has_more_data() {
                if !first && separator != 0 {
                    name.push(char::from(separator));
                }
                first = false;

                let part = image.blob(parser.read_compressed_uint()?)?;
                name.push_str(
                    std::str::from_utf8(part)
                        .map_err(|_| malformed_error!("Document name part is not UTF-8"))?,
                );
            }

            Ok(normalize_document_name(name))
        })
    }

    /// Decodes the sequence points of a method.
    ///
    /// Returns `None` when `method` is not a `MethodDef` token or the method has no sequence
    /// points in this PDB.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence points blob is malformed.
    pub fn sequence_points(&self, method: Token) -> Result<Option<SequencePoints>> {
        if !method.is_table(TableId::MethodDef.id()) || method.is_null() {
            return Ok(None);
        }

        self.with_image(|image| {
            let Some(info) = image.row::<MethodDebugInformationRaw>(method.row()) else {
                return Ok(None);
            };

            if info.sequence_points == 0 {
                return Ok(None);
            }

            let blob = image.blob(info.sequence_points)?;
            parse_sequence_points(blob, info.document).map(Some)
        })
    }

    /// Maps an IL offset of a method to its source location.
    ///
    /// # Errors
    ///
    /// Returns an error if the method's sequence points or the matched document are malformed.
    pub fn resolve(&self, method: Token, il_offset: u32) -> Result<Option<SourceLocation>> {
        let Some(points) = self.sequence_points(method)? else {
            return Ok(None);
        };

        let Some(point) = resolve_sequence_point(&points.0, il_offset) else {
            return Ok(None);
        };

        Ok(Some(SourceLocation {
            file: self.document_name(point.document)?,
            line: point.start_line,
            column: u32::from(point.start_col),
        }))
    }
}

/// Turns `file://` URIs into plain paths; everything else is returned unchanged.
fn normalize_document_name(name: String) -> String {
    let Some(rest) = name.strip_prefix("file://") else {
        return name;
    };

    // Skip the authority; local files have an empty one
    let path = match rest.find('/') {
        Some(start) => &rest[start..],
        None => return name,
    };

    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' && index + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[index + 1..index + 3]).ok();
            if let Some(value) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                decoded.push(value);
                index += 3;
                continue;
            }
        }

        decoded.push(bytes[index]);
        index += 1;
    }

    let mut path = String::from_utf8_lossy(&decoded).into_owned();

    // file:///C:/src/a.cs
    let drive = path.as_bytes();
    if drive.len() >= 3 && drive[0] == b'/' && drive[1].is_ascii_alphabetic() && drive[2] == b':' {
        path.remove(0);
    }

    path
}
