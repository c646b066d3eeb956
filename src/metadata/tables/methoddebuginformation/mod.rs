//! The portable PDB `MethodDebugInformation` table (0x31).
//!
//! Rows parallel the `MethodDef` table of the described assembly: row N belongs to MethodDef N.

mod reader;

use crate::metadata::token::Token;

/// A row of the `MethodDebugInformation` table.
#[derive(Clone, Debug)]
pub struct MethodDebugInformationRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The initial document, 0 if the sequence points span several documents
    pub document: u32,
    /// Index into `#Blob`: the encoded sequence points, 0 if there are none
    pub sequence_points: u32,
}
